use super::Canon;
use crate::ir::{Expr, Stmt};
use crate::CompileError;

impl Canon<'_> {
    /// Canonicalize `e`, appending the statements that must run before its
    /// value is available.
    pub fn expr(&mut self, e: &Expr, out: &mut Vec<Stmt>) -> Result<Expr, CompileError> {
        match e {
            Expr::Const(_) | Expr::Name(_) | Expr::Temp(_) => Ok(e.clone()),

            Expr::Binary(op, l, r) => {
                let l = self.operand(l, out)?;
                let r = self.operand(r, out)?;
                Ok(Expr::binary(*op, l, r))
            }

            Expr::Unary(op, operand) => {
                let operand = self.operand(operand, out)?;
                Ok(Expr::unary(*op, operand))
            }

            Expr::Mem(addr) => {
                let addr = self.expr(addr, out)?;
                let addr = self.into_temp(addr, out);
                Ok(Expr::mem(addr))
            }

            Expr::Call(label, args) => {
                let mut canon = Vec::with_capacity(args.len());
                for arg in args {
                    canon.push(self.operand(arg, out)?);
                }
                Ok(Expr::Call(label.clone(), canon))
            }

            Expr::SeqExpr(stmt, value) => {
                self.stmts(std::slice::from_ref(stmt.as_ref()), out)?;
                self.expr(value, out)
            }
        }
    }

    /// Canonicalize an operand and pin its value before the next operand runs.
    fn operand(&mut self, e: &Expr, out: &mut Vec<Stmt>) -> Result<Expr, CompileError> {
        let e = self.expr(e, out)?;
        Ok(self.bind(e, out))
    }

    /// Keep atoms as they are; move anything else into a fresh temp.
    pub(super) fn bind(&mut self, e: Expr, out: &mut Vec<Stmt>) -> Expr {
        if e.is_atomic() {
            e
        } else {
            self.into_temp(e, out)
        }
    }

    pub(super) fn into_temp(&mut self, e: Expr, out: &mut Vec<Stmt>) -> Expr {
        if let Expr::Temp(_) = e {
            return e;
        }
        let t = Expr::Temp(self.ctx.new_temp());
        out.push(Stmt::Move(t.clone(), e));
        t
    }
}
