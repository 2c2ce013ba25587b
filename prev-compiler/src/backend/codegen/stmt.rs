use super::expr::non_canonical;
use super::Selector;
use crate::backend::instruction::AsmInstr;
use crate::ir::{Expr, Stmt};
use crate::{CompileError, Phase};

impl Selector<'_> {
    pub fn stmt(&mut self, s: &Stmt) -> Result<(), CompileError> {
        match s {
            Stmt::Label(l) => self.emit(AsmInstr::label(l.clone())),

            Stmt::Jump(l) => self.emit(AsmInstr::oper(
                format!("JMP {l}"),
                vec![],
                vec![],
                vec![l.clone()],
            )),

            Stmt::CondJump(cond, t, f) => {
                let Expr::Temp(c) = cond else {
                    return Err(non_canonical(cond));
                };
                self.emit(AsmInstr::oper(
                    format!("BNZ `s0,{t}"),
                    vec![*c],
                    vec![],
                    vec![t.clone(), f.clone()],
                ));
            }

            Stmt::Move(Expr::Temp(dst), src) => self.expr_into(src, *dst)?,

            Stmt::Move(Expr::Mem(addr), src) => {
                let Expr::Temp(addr) = addr.as_ref() else {
                    return Err(non_canonical(addr));
                };
                let value = self.expr(src)?;
                self.emit(AsmInstr::oper(
                    "STO `s0,`s1,0",
                    vec![value, *addr],
                    vec![],
                    vec![],
                ));
            }

            Stmt::Move(dst, _) => {
                return Err(CompileError::internal(
                    Phase::AsmGen,
                    format!("cannot store into {dst}"),
                ))
            }

            Stmt::ExprStmt(e) => {
                if !e.is_atomic() {
                    self.expr(e)?;
                }
            }

            Stmt::Seq(_) => {
                return Err(CompileError::internal(
                    Phase::AsmGen,
                    "nested statement sequence after canonicalization",
                ))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::codegen::Selector;
    use crate::config::MachineConfig;
    use crate::ir::context::Context;
    use crate::ir::{BinOp, Expr, Label, Stmt, Temp};
    use crate::CompileError;

    fn select(stmts: &[Stmt]) -> Result<Vec<String>, CompileError> {
        let mut ctx = Context::new();
        for _ in 0..10 {
            ctx.new_temp();
        }
        let config = MachineConfig::default();
        let mut sel = Selector::new(&mut ctx, &config);
        for s in stmts {
            sel.stmt(s)?;
        }
        Ok(sel.finish().iter().map(|i| i.to_string()).collect())
    }

    #[test]
    fn add_defines_destination_directly() {
        let out = select(&[Stmt::Move(
            Expr::Temp(Temp(0)),
            Expr::binary(BinOp::Add, Expr::Temp(Temp(1)), Expr::Temp(Temp(2))),
        )])
        .unwrap();
        assert_eq!(out, ["ADD T0,T1,T2"]);
    }

    #[test]
    fn comparison_normalises_to_boolean() {
        let out = select(&[Stmt::Move(
            Expr::Temp(Temp(0)),
            Expr::binary(BinOp::Le, Expr::Temp(Temp(1)), Expr::Const(5)),
        )])
        .unwrap();
        assert_eq!(out, ["SETL T10,5", "CMP T11,T1,T10", "ZSNP T0,T11,1"]);
    }

    #[test]
    fn modulo_reads_remainder_register() {
        let out = select(&[Stmt::Move(
            Expr::Temp(Temp(0)),
            Expr::binary(BinOp::Mod, Expr::Temp(Temp(1)), Expr::Temp(Temp(2))),
        )])
        .unwrap();
        assert_eq!(out, ["DIV T10,T1,T2", "GET T0,rR"]);
    }

    #[test]
    fn call_passes_arguments_on_stack() {
        let out = select(&[Stmt::Move(
            Expr::Temp(Temp(0)),
            Expr::Call(Label::named("f"), vec![Expr::Temp(Temp(1)), Expr::Temp(Temp(2))]),
        )])
        .unwrap();
        assert_eq!(
            out,
            [
                "STO T1,sP,0",
                "STO T2,sP,8",
                "PUSHJ $8,_f",
                "LDO T0,sP,0"
            ]
        );
    }

    #[test]
    fn store_through_address_temp() {
        let out = select(&[Stmt::Move(
            Expr::mem(Expr::Temp(Temp(3))),
            Expr::Temp(Temp(4)),
        )])
        .unwrap();
        assert_eq!(out, ["STO T4,T3,0"]);
    }

    #[test]
    fn conditional_jump_lists_both_targets() {
        let mut ctx = Context::new();
        let config = MachineConfig::default();
        let mut sel = Selector::new(&mut ctx, &config);
        sel.stmt(&Stmt::CondJump(
            Expr::Temp(Temp(0)),
            Label::Anon(1),
            Label::Anon(2),
        ))
        .unwrap();
        let instrs = sel.finish();
        assert_eq!(instrs[0].to_string(), "BNZ T0,L1");
        assert_eq!(instrs[0].jumps(), &[Label::Anon(1), Label::Anon(2)]);
    }

    #[test]
    fn non_canonical_input_is_rejected() {
        let err = select(&[Stmt::Move(
            Expr::Temp(Temp(0)),
            Expr::binary(
                BinOp::Add,
                Expr::mem(Expr::Temp(Temp(1))),
                Expr::Const(1),
            ),
        )])
        .unwrap_err();
        assert!(matches!(err, CompileError::Internal { .. }));

        let err = select(&[Stmt::Seq(vec![])]).unwrap_err();
        assert!(err.to_string().contains("asmgen"));
    }
}
