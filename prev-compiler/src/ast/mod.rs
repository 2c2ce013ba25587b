//! Typed abstract syntax tree consumed by the back end.
//!
//! The tree arrives fully resolved from the front end:
//! - every name reference carries the [`DeclId`] of its declaration,
//! - every expression carries its semantic type and addressability flag,
//! - record components are looked up through [`RecType`].
//!
//! The whole tree is `serde`-(de)serializable so the CLI can read it as JSON.

pub mod build;
mod types;

pub use types::{CompDecl, RecType, SemType, WORD};

use serde::{Deserialize, Serialize};

/// Identifier of a declaration (variable, parameter or function).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub usize);

/// Identifier of an expression node (used to key string-literal accesses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExprId(pub usize);

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "lowercase")]
pub enum Decl {
    Var(VarDecl),
    Fun(FunDecl),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub id: DeclId,
    pub name: String,
    pub ty: SemType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParDecl {
    pub id: DeclId,
    pub name: String,
    pub ty: SemType,
}

/// A function definition, or an external declaration when `body` is `None`
/// (runtime functions such as `putInt`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunDecl {
    pub id: DeclId,
    pub name: String,
    pub params: Vec<ParDecl>,
    pub ret: SemType,
    #[serde(default)]
    pub body: Option<Expr>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub id: ExprId,
    pub ty: SemType,
    /// Whether the expression denotes a memory location.
    #[serde(default)]
    pub addressable: bool,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum ExprKind {
    Atom { value: Atom },
    Var { decl: DeclId },
    Index { array: Box<Expr>, index: Box<Expr> },
    Field { record: Box<Expr>, comp: String },
    Unary { op: UnOp, operand: Box<Expr> },
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    New { ty: SemType },
    Del { operand: Box<Expr> },
    Call { fun: DeclId, args: Vec<Expr> },
    /// `{ stmts : value where decls }`
    Block { decls: Vec<Decl>, stmts: Vec<Stmt>, value: Box<Expr> },
    /// Cast to the expression's own `ty`.
    Cast { operand: Box<Expr> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Atom {
    Void,
    Null,
    Bool(bool),
    Int(i64),
    Char(u8),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnOp {
    Plus,
    Neg,
    Not,
    /// `@e`: value stored at a pointer.
    Deref,
    /// `$e`: address of an addressable expression.
    AddrOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Xor,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "lowercase")]
pub enum Stmt {
    Expr { expr: Expr },
    Assign { dst: Expr, src: Expr },
    If {
        cond: Expr,
        then_stmts: Vec<Stmt>,
        #[serde(default)]
        else_stmts: Vec<Stmt>,
    },
    While { cond: Expr, body: Vec<Stmt> },
}
