// Tree-shaped intermediate code: expressions, statements, temps and labels.

use std::fmt;

/// Virtual register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Temp(pub u32);

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Symbolic program-counter marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// Externally visible name (functions, globals, runtime routines).
    Named(String),
    /// Compiler-generated, unique within a compilation.
    Anon(u32),
}

impl Label {
    pub fn named(name: impl Into<String>) -> Self {
        Label::Named(name.into())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Named(name) => write!(f, "_{name}"),
            Label::Anon(n) => write!(f, "L{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "ADD",
            BinOp::Sub => "SUB",
            BinOp::Mul => "MUL",
            BinOp::Div => "DIV",
            BinOp::Mod => "MOD",
            BinOp::Eq => "EQU",
            BinOp::Ne => "NEQ",
            BinOp::Lt => "LTH",
            BinOp::Gt => "GTH",
            BinOp::Le => "LEQ",
            BinOp::Ge => "GEQ",
            BinOp::And => "AND",
            BinOp::Or => "IOR",
            BinOp::Xor => "XOR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Not,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnOp::Neg => f.write_str("NEG"),
            UnOp::Not => f.write_str("NOT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Const(i64),
    Name(Label),
    Temp(Temp),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Unary(UnOp, Box<Expr>),
    /// Value stored at an address.
    Mem(Box<Expr>),
    Call(Label, Vec<Expr>),
    /// Execute a statement, then yield a value. Gone after canonicalization.
    SeqExpr(Box<Stmt>, Box<Expr>),
}

impl Expr {
    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary(op, Box::new(left), Box::new(right))
    }

    pub fn unary(op: UnOp, operand: Expr) -> Self {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn mem(addr: Expr) -> Self {
        Expr::Mem(Box::new(addr))
    }

    pub fn seq(stmt: Stmt, value: Expr) -> Self {
        Expr::SeqExpr(Box::new(stmt), Box::new(value))
    }

    /// Leaf that needs no evaluation: a temp, a constant or a name.
    pub fn is_atomic(&self) -> bool {
        matches!(self, Expr::Temp(_) | Expr::Const(_) | Expr::Name(_))
    }

    pub fn as_temp(&self) -> Option<Temp> {
        match self {
            Expr::Temp(t) => Some(*t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Move(Expr, Expr),
    ExprStmt(Expr),
    /// Branch to the first label when the condition is non-zero, else the second.
    CondJump(Expr, Label, Label),
    Jump(Label),
    Label(Label),
    Seq(Vec<Stmt>),
}

// ── Printing ────────────────────────────────────────────────────────────

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "CONST({c})"),
            Expr::Name(l) => write!(f, "NAME({l})"),
            Expr::Temp(t) => write!(f, "TEMP({t})"),
            Expr::Binary(op, l, r) => write!(f, "BINOP({op},{l},{r})"),
            Expr::Unary(op, e) => write!(f, "UNOP({op},{e})"),
            Expr::Mem(a) => write!(f, "MEM({a})"),
            Expr::Call(l, args) => {
                write!(f, "CALL({l}")?;
                for a in args {
                    write!(f, ",{a}")?;
                }
                write!(f, ")")
            }
            Expr::SeqExpr(s, e) => write!(f, "SEXPR({s},{e})"),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Move(d, s) => write!(f, "MOVE({d},{s})"),
            Stmt::ExprStmt(e) => write!(f, "ESTMT({e})"),
            Stmt::CondJump(c, t, e) => write!(f, "CJUMP({c},{t},{e})"),
            Stmt::Jump(l) => write!(f, "JUMP({l})"),
            Stmt::Label(l) => write!(f, "LABEL({l})"),
            Stmt::Seq(stmts) => {
                write!(f, "SEQ(")?;
                for (i, s) in stmts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{s}")?;
                }
                write!(f, ")")
            }
        }
    }
}
