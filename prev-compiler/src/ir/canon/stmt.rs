use super::Canon;
use crate::ir::{Expr, Stmt};
use crate::CompileError;

impl Canon<'_> {
    /// Canonicalize a statement list into `out`, flattening nested sequences.
    pub fn stmts(&mut self, stmts: &[Stmt], out: &mut Vec<Stmt>) -> Result<(), CompileError> {
        for (i, stmt) in stmts.iter().enumerate() {
            self.stmt(stmt, stmts.get(i + 1), out)?;
        }
        Ok(())
    }

    /// `next` is the statement that follows `s` in its list, if any.
    fn stmt(&mut self, s: &Stmt, next: Option<&Stmt>, out: &mut Vec<Stmt>) -> Result<(), CompileError> {
        match s {
            Stmt::Seq(inner) => self.stmts(inner, out),

            Stmt::Label(_) | Stmt::Jump(_) => {
                out.push(s.clone());
                Ok(())
            }

            Stmt::ExprStmt(e) => {
                let e = self.expr(e, out)?;
                out.push(Stmt::ExprStmt(e));
                Ok(())
            }

            Stmt::Move(dst, src) => {
                let dst = match dst {
                    Expr::Temp(_) => dst.clone(),
                    _ => self.expr(dst, out)?,
                };
                let src = self.expr(src, out)?;
                out.push(Stmt::Move(dst, src));
                Ok(())
            }

            Stmt::CondJump(cond, t, f) => {
                let already_canonical = matches!(cond, Expr::Temp(_))
                    && matches!(next, Some(Stmt::Label(l)) if l == f);

                let cond = self.expr(cond, out)?;
                let cond = self.into_temp(cond, out);
                if already_canonical {
                    out.push(Stmt::CondJump(cond, t.clone(), f.clone()));
                } else {
                    let fallthrough = self.ctx.new_label();
                    out.push(Stmt::CondJump(cond, t.clone(), fallthrough.clone()));
                    out.push(Stmt::Label(fallthrough));
                    out.push(Stmt::Jump(f.clone()));
                }
                Ok(())
            }
        }
    }
}
