use super::context::Gen;
use crate::ast::{self, Atom, ExprKind, SemType};
use crate::frames::Access;
use crate::ir::chunk::DataChunk;
use crate::ir::{BinOp, Expr, Label, Stmt, UnOp};
use crate::{CompileError, Phase};

impl Gen<'_> {
    pub fn lower_expr(&mut self, e: &ast::Expr) -> Result<Expr, CompileError> {
        match &e.kind {
            ExprKind::Atom { value } => self.lower_atom(e, value),

            ExprKind::Var { decl } => {
                let access = self.frames.access(*decl)?.clone();
                self.access_expr(&access)
            }

            ExprKind::Index { array, index } => {
                let elem = match &array.ty {
                    SemType::Arr { elem, .. } => elem.size(),
                    other => {
                        return Err(CompileError::internal(
                            Phase::ImcGen,
                            format!("indexing a value of type {other}"),
                        ))
                    }
                };
                let base = self.lower_expr(array)?;
                let addr = address_of(base)?;
                let idx = self.lower_expr(index)?;
                Ok(Expr::mem(Expr::binary(
                    BinOp::Add,
                    addr,
                    Expr::binary(BinOp::Mul, idx, Expr::Const(elem)),
                )))
            }

            ExprKind::Field { record, comp } => {
                let offset = record
                    .ty
                    .as_record()
                    .and_then(|rec| rec.offset_of(comp))
                    .ok_or_else(|| {
                        CompileError::internal(
                            Phase::ImcGen,
                            format!("no component {comp} in {}", record.ty),
                        )
                    })?;
                let base = self.lower_expr(record)?;
                let addr = address_of(base)?;
                Ok(Expr::mem(Expr::binary(BinOp::Add, addr, Expr::Const(offset))))
            }

            ExprKind::Unary { op, operand } => {
                let value = self.lower_expr(operand)?;
                match op {
                    ast::UnOp::Plus => Ok(value),
                    ast::UnOp::Neg => Ok(Expr::unary(UnOp::Neg, value)),
                    ast::UnOp::Not => Ok(Expr::unary(UnOp::Not, value)),
                    ast::UnOp::Deref => Ok(Expr::mem(value)),
                    ast::UnOp::AddrOf => {
                        if !operand.addressable {
                            return Err(CompileError::internal(
                                Phase::ImcGen,
                                format!("address of a non-addressable {}", operand.ty),
                            ));
                        }
                        address_of(value)
                    }
                }
            }

            ExprKind::Binary { op, left, right } => {
                let l = self.lower_expr(left)?;
                let r = self.lower_expr(right)?;
                Ok(Expr::binary(binop(*op), l, r))
            }

            ExprKind::New { ty } => {
                let sl = self.static_link(1)?;
                Ok(Expr::Call(
                    Label::named("new"),
                    vec![sl, Expr::Const(ty.size())],
                ))
            }

            ExprKind::Del { operand } => {
                let sl = self.static_link(1)?;
                let ptr = self.lower_expr(operand)?;
                Ok(Expr::Call(Label::named("del"), vec![sl, ptr]))
            }

            ExprKind::Call { fun, args } => {
                let callee = self.frames.frame(*fun)?;
                let label = callee.label.clone();
                let mut imc_args = Vec::with_capacity(args.len() + 1);
                imc_args.push(self.static_link(callee.depth)?);
                for arg in args {
                    imc_args.push(self.lower_expr(arg)?);
                }
                Ok(Expr::Call(label, imc_args))
            }

            ExprKind::Block {
                decls,
                stmts,
                value,
            } => {
                for decl in decls {
                    self.lower_decl(decl)?;
                }
                let mut body = Vec::with_capacity(stmts.len());
                for stmt in stmts {
                    body.push(self.lower_stmt(stmt)?);
                }
                let value = self.lower_expr(value)?;
                Ok(Expr::seq(Stmt::Seq(body), value))
            }

            ExprKind::Cast { operand } => {
                let value = self.lower_expr(operand)?;
                if e.ty == SemType::Char {
                    Ok(Expr::binary(BinOp::Mod, value, Expr::Const(256)))
                } else {
                    Ok(value)
                }
            }
        }
    }

    fn lower_atom(&mut self, e: &ast::Expr, value: &Atom) -> Result<Expr, CompileError> {
        Ok(match value {
            Atom::Void | Atom::Null => Expr::Const(0),
            Atom::Bool(b) => Expr::Const(i64::from(*b)),
            Atom::Int(n) => Expr::Const(*n),
            Atom::Char(c) => Expr::Const(i64::from(*c)),
            Atom::Str(_) => match self.frames.string(e.id)? {
                Access::Abs { size, label, init } => {
                    self.ctx.add_data(DataChunk {
                        label: label.clone(),
                        size: *size,
                        init: init.clone(),
                    });
                    Expr::Name(label.clone())
                }
                Access::Rel { .. } => {
                    return Err(CompileError::internal(
                        Phase::ImcGen,
                        "string literal with a frame-relative access",
                    ))
                }
            },
        })
    }

    /// Memory cell denoted by an access, seen from the current function.
    fn access_expr(&self, access: &Access) -> Result<Expr, CompileError> {
        match access {
            Access::Abs { label, .. } => Ok(Expr::mem(Expr::Name(label.clone()))),
            Access::Rel { offset, depth, .. } => {
                let cur = self.current()?.depth;
                let levels = cur.checked_sub(*depth).ok_or_else(|| {
                    CompileError::internal(
                        Phase::ImcGen,
                        format!("access to depth {depth} from depth {cur}"),
                    )
                })?;
                let fp = self.climb(levels)?;
                Ok(Expr::mem(Expr::binary(BinOp::Add, fp, Expr::Const(*offset))))
            }
        }
    }
}

/// Strip the outer `Mem` of an addressable expression.
fn address_of(e: Expr) -> Result<Expr, CompileError> {
    match e {
        Expr::Mem(addr) => Ok(*addr),
        other => Err(CompileError::internal(
            Phase::ImcGen,
            format!("{other} does not denote a memory location"),
        )),
    }
}

fn binop(op: ast::BinOp) -> BinOp {
    match op {
        ast::BinOp::Add => BinOp::Add,
        ast::BinOp::Sub => BinOp::Sub,
        ast::BinOp::Mul => BinOp::Mul,
        ast::BinOp::Div => BinOp::Div,
        ast::BinOp::Mod => BinOp::Mod,
        ast::BinOp::Eq => BinOp::Eq,
        ast::BinOp::Ne => BinOp::Ne,
        ast::BinOp::Lt => BinOp::Lt,
        ast::BinOp::Gt => BinOp::Gt,
        ast::BinOp::Le => BinOp::Le,
        ast::BinOp::Ge => BinOp::Ge,
        ast::BinOp::And => BinOp::And,
        ast::BinOp::Or => BinOp::Or,
        ast::BinOp::Xor => BinOp::Xor,
    }
}
