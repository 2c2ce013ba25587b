//! Programmatic construction of typed trees.
//!
//! [`Builder`] hands out fresh declaration/expression ids and fills in the
//! semantic type and addressability of every node the way the front end's
//! type resolver would, so tools and tests can assemble resolved programs
//! without going through source text.

use super::*;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Builder {
    next_decl: usize,
    next_expr: usize,
    decl_types: HashMap<DeclId, SemType>,
    fun_types: HashMap<DeclId, SemType>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    fn decl_id(&mut self) -> DeclId {
        let id = DeclId(self.next_decl);
        self.next_decl += 1;
        id
    }

    fn node(&mut self, ty: SemType, addressable: bool, kind: ExprKind) -> Expr {
        let id = ExprId(self.next_expr);
        self.next_expr += 1;
        Expr {
            id,
            ty,
            addressable,
            kind,
        }
    }

    // ── Declarations ────────────────────────────────────────────────────

    pub fn var_decl(&mut self, name: &str, ty: SemType) -> VarDecl {
        let id = self.decl_id();
        self.decl_types.insert(id, ty.clone());
        VarDecl {
            id,
            name: name.to_string(),
            ty,
        }
    }

    pub fn param(&mut self, name: &str, ty: SemType) -> ParDecl {
        let id = self.decl_id();
        self.decl_types.insert(id, ty.clone());
        ParDecl {
            id,
            name: name.to_string(),
            ty,
        }
    }

    /// Declare a function without a body. Fill in `body` afterwards to
    /// define it; declaring first lets the body call the function itself.
    pub fn declare_fun(&mut self, name: &str, params: Vec<ParDecl>, ret: SemType) -> FunDecl {
        let id = self.decl_id();
        self.fun_types.insert(id, ret.clone());
        FunDecl {
            id,
            name: name.to_string(),
            params,
            ret,
            body: None,
        }
    }

    pub fn fun(&mut self, name: &str, params: Vec<ParDecl>, ret: SemType, body: Expr) -> FunDecl {
        let mut decl = self.declare_fun(name, params, ret);
        decl.body = Some(body);
        decl
    }

    // ── Atoms ───────────────────────────────────────────────────────────

    pub fn int(&mut self, n: i64) -> Expr {
        self.node(SemType::Int, false, ExprKind::Atom { value: Atom::Int(n) })
    }

    pub fn boolean(&mut self, b: bool) -> Expr {
        self.node(SemType::Bool, false, ExprKind::Atom { value: Atom::Bool(b) })
    }

    pub fn char(&mut self, c: u8) -> Expr {
        self.node(SemType::Char, false, ExprKind::Atom { value: Atom::Char(c) })
    }

    pub fn string(&mut self, s: &str) -> Expr {
        self.node(
            SemType::ptr(SemType::Char),
            false,
            ExprKind::Atom {
                value: Atom::Str(s.to_string()),
            },
        )
    }

    pub fn null(&mut self, pointee: SemType) -> Expr {
        self.node(SemType::ptr(pointee), false, ExprKind::Atom { value: Atom::Null })
    }

    pub fn void(&mut self) -> Expr {
        self.node(SemType::Void, false, ExprKind::Atom { value: Atom::Void })
    }

    // ── Compound expressions ────────────────────────────────────────────

    pub fn var(&mut self, decl: DeclId) -> Expr {
        let ty = self.decl_types.get(&decl).cloned().unwrap_or(SemType::Int);
        self.node(ty, true, ExprKind::Var { decl })
    }

    pub fn index(&mut self, array: Expr, index: Expr) -> Expr {
        let ty = array.ty.element().cloned().unwrap_or(SemType::Int);
        let addressable = array.addressable;
        self.node(
            ty,
            addressable,
            ExprKind::Index {
                array: Box::new(array),
                index: Box::new(index),
            },
        )
    }

    pub fn field(&mut self, record: Expr, comp: &str) -> Expr {
        let ty = record
            .ty
            .as_record()
            .and_then(|r| r.component(comp))
            .map(|c| c.ty.clone())
            .unwrap_or(SemType::Int);
        let addressable = record.addressable;
        self.node(
            ty,
            addressable,
            ExprKind::Field {
                record: Box::new(record),
                comp: comp.to_string(),
            },
        )
    }

    pub fn unary(&mut self, op: UnOp, operand: Expr) -> Expr {
        let (ty, addressable) = match op {
            UnOp::Plus | UnOp::Neg => (operand.ty.clone(), false),
            UnOp::Not => (SemType::Bool, false),
            UnOp::Deref => (operand.ty.element().cloned().unwrap_or(SemType::Int), true),
            UnOp::AddrOf => (SemType::ptr(operand.ty.clone()), false),
        };
        self.node(
            ty,
            addressable,
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        )
    }

    pub fn binary(&mut self, op: BinOp, left: Expr, right: Expr) -> Expr {
        let ty = match op {
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => SemType::Bool,
            _ => left.ty.clone(),
        };
        self.node(
            ty,
            false,
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    pub fn new_expr(&mut self, ty: SemType) -> Expr {
        self.node(SemType::ptr(ty.clone()), false, ExprKind::New { ty })
    }

    pub fn del(&mut self, operand: Expr) -> Expr {
        self.node(
            SemType::Void,
            false,
            ExprKind::Del {
                operand: Box::new(operand),
            },
        )
    }

    pub fn call(&mut self, fun: DeclId, args: Vec<Expr>) -> Expr {
        let ty = self.fun_types.get(&fun).cloned().unwrap_or(SemType::Void);
        self.node(ty, false, ExprKind::Call { fun, args })
    }

    pub fn block(&mut self, decls: Vec<Decl>, stmts: Vec<Stmt>, value: Expr) -> Expr {
        let ty = value.ty.clone();
        self.node(
            ty,
            false,
            ExprKind::Block {
                decls,
                stmts,
                value: Box::new(value),
            },
        )
    }

    pub fn cast(&mut self, operand: Expr, ty: SemType) -> Expr {
        self.node(
            ty,
            false,
            ExprKind::Cast {
                operand: Box::new(operand),
            },
        )
    }

    // ── Statements ──────────────────────────────────────────────────────

    pub fn assign(&self, dst: Expr, src: Expr) -> Stmt {
        Stmt::Assign { dst, src }
    }

    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        Stmt::Expr { expr }
    }

    pub fn if_stmt(&self, cond: Expr, then_stmts: Vec<Stmt>, else_stmts: Vec<Stmt>) -> Stmt {
        Stmt::If {
            cond,
            then_stmts,
            else_stmts,
        }
    }

    pub fn while_stmt(&self, cond: Expr, body: Vec<Stmt>) -> Stmt {
        Stmt::While { cond, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_follow_declarations() {
        let mut b = Builder::new();
        let arr = b.var_decl("a", SemType::arr(4, SemType::Char));
        let base = b.var(arr.id);
        let idx = b.int(2);
        let elem = b.index(base, idx);
        assert_eq!(elem.ty, SemType::Char);
        assert!(elem.addressable);

        let addr = b.unary(UnOp::AddrOf, elem);
        assert_eq!(addr.ty, SemType::ptr(SemType::Char));
        assert!(!addr.addressable);
    }

    #[test]
    fn ids_are_unique() {
        let mut b = Builder::new();
        let x = b.int(1);
        let y = b.int(2);
        let p = b.param("p", SemType::Int);
        let q = b.param("q", SemType::Int);
        assert_ne!(x.id, y.id);
        assert_ne!(p.id, q.id);
    }
}
