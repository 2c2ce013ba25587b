use super::context::Gen;
use crate::ast;
use crate::ir::Stmt;
use crate::CompileError;

impl Gen<'_> {
    pub fn lower_stmt(&mut self, s: &ast::Stmt) -> Result<Stmt, CompileError> {
        match s {
            ast::Stmt::Expr { expr } => Ok(Stmt::ExprStmt(self.lower_expr(expr)?)),

            ast::Stmt::Assign { dst, src } => {
                let dst = self.lower_expr(dst)?;
                let src = self.lower_expr(src)?;
                Ok(Stmt::Move(dst, src))
            }

            ast::Stmt::If {
                cond,
                then_stmts,
                else_stmts,
            } => {
                let cond = self.lower_expr(cond)?;
                let then_label = self.new_label();
                let else_label = self.new_label();

                let mut out = vec![
                    Stmt::CondJump(cond, then_label.clone(), else_label.clone()),
                    Stmt::Label(then_label),
                ];
                out.extend(self.lower_block(then_stmts)?);
                if else_stmts.is_empty() {
                    out.push(Stmt::Label(else_label));
                } else {
                    let end_label = self.new_label();
                    out.push(Stmt::Jump(end_label.clone()));
                    out.push(Stmt::Label(else_label));
                    out.extend(self.lower_block(else_stmts)?);
                    out.push(Stmt::Label(end_label));
                }
                Ok(Stmt::Seq(out))
            }

            ast::Stmt::While { cond, body } => {
                let start = self.new_label();
                let body_label = self.new_label();
                let end = self.new_label();

                let cond = self.lower_expr(cond)?;
                let mut out = vec![
                    Stmt::Label(start.clone()),
                    Stmt::CondJump(cond, body_label.clone(), end.clone()),
                    Stmt::Label(body_label),
                ];
                out.extend(self.lower_block(body)?);
                out.push(Stmt::Jump(start));
                out.push(Stmt::Label(end));
                Ok(Stmt::Seq(out))
            }
        }
    }

    fn lower_block(&mut self, stmts: &[ast::Stmt]) -> Result<Vec<Stmt>, CompileError> {
        stmts.iter().map(|s| self.lower_stmt(s)).collect()
    }
}
