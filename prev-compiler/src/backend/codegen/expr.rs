use super::Selector;
use crate::backend::instruction::{load_address, load_const, AsmInstr};
use crate::ir::{BinOp, Expr, Temp, UnOp};
use crate::{CompileError, Phase};

impl Selector<'_> {
    /// Evaluate `e` into a fresh temp, or return the temp it already is.
    pub fn expr(&mut self, e: &Expr) -> Result<Temp, CompileError> {
        if let Expr::Temp(t) = e {
            return Ok(*t);
        }
        let dst = self.new_temp();
        self.expr_into(e, dst)?;
        Ok(dst)
    }

    /// Evaluate `e` into `dst`.
    pub fn expr_into(&mut self, e: &Expr, dst: Temp) -> Result<(), CompileError> {
        match e {
            Expr::Const(value) => {
                for instr in load_const(*value, dst, self.config.chunk_bits) {
                    self.emit(instr);
                }
            }

            Expr::Name(label) => {
                for instr in load_address(label, dst) {
                    self.emit(instr);
                }
            }

            Expr::Temp(src) => {
                self.emit(AsmInstr::mov("SET `d0,`s0", vec![*src], vec![dst]));
            }

            Expr::Mem(addr) => {
                let Expr::Temp(addr) = addr.as_ref() else {
                    return Err(non_canonical(e));
                };
                self.emit(AsmInstr::oper(
                    "LDO `d0,`s0,0",
                    vec![*addr],
                    vec![dst],
                    vec![],
                ));
            }

            Expr::Binary(op, l, r) => {
                let l = self.operand(l, e)?;
                let r = self.operand(r, e)?;
                self.binary(*op, l, r, dst);
            }

            Expr::Unary(op, operand) => {
                let s = self.operand(operand, e)?;
                let template = match op {
                    UnOp::Neg => "NEG `d0,0,`s0",
                    UnOp::Not => "XOR `d0,`s0,1",
                };
                self.emit(AsmInstr::oper(template, vec![s], vec![dst], vec![]));
            }

            Expr::Call(label, args) => {
                for (i, arg) in args.iter().enumerate() {
                    let a = self.operand(arg, e)?;
                    let offset = i as i64 * self.config.word_size;
                    self.emit(AsmInstr::oper(
                        format!("STO `s0,sP,{offset}"),
                        vec![a],
                        vec![],
                        vec![],
                    ));
                }
                self.emit(AsmInstr::oper(
                    format!("PUSHJ ${},{label}", self.config.registers),
                    vec![],
                    vec![],
                    vec![],
                ));
                self.emit(AsmInstr::oper(
                    "LDO `d0,sP,0",
                    vec![],
                    vec![dst],
                    vec![],
                ));
            }

            Expr::SeqExpr(..) => return Err(non_canonical(e)),
        }
        Ok(())
    }

    /// Operands of canonical nodes are atoms; anything else is a bug upstream.
    fn operand(&mut self, e: &Expr, parent: &Expr) -> Result<Temp, CompileError> {
        if !e.is_atomic() {
            return Err(non_canonical(parent));
        }
        self.expr(e)
    }

    fn binary(&mut self, op: BinOp, l: Temp, r: Temp, dst: Temp) {
        let arith = match op {
            BinOp::Add => Some("ADD"),
            BinOp::Sub => Some("SUB"),
            BinOp::Mul => Some("MUL"),
            BinOp::Div => Some("DIV"),
            BinOp::And => Some("AND"),
            BinOp::Or => Some("OR"),
            BinOp::Xor => Some("XOR"),
            _ => None,
        };
        if let Some(mnemonic) = arith {
            self.emit(AsmInstr::oper(
                format!("{mnemonic} `d0,`s0,`s1"),
                vec![l, r],
                vec![dst],
                vec![],
            ));
            return;
        }

        if op == BinOp::Mod {
            // Remainder of the signed division lands in rR.
            let quotient = self.new_temp();
            self.emit(AsmInstr::oper(
                "DIV `d0,`s0,`s1",
                vec![l, r],
                vec![quotient],
                vec![],
            ));
            self.emit(AsmInstr::oper("GET `d0,rR", vec![], vec![dst], vec![]));
            return;
        }

        let zs = match op {
            BinOp::Eq => "ZSZ",
            BinOp::Ne => "ZSNZ",
            BinOp::Lt => "ZSN",
            BinOp::Gt => "ZSP",
            BinOp::Le => "ZSNP",
            _ => "ZSNN",
        };
        let cmp = self.new_temp();
        self.emit(AsmInstr::oper(
            "CMP `d0,`s0,`s1",
            vec![l, r],
            vec![cmp],
            vec![],
        ));
        self.emit(AsmInstr::oper(
            format!("{zs} `d0,`s0,1"),
            vec![cmp],
            vec![dst],
            vec![],
        ));
    }
}

pub(super) fn non_canonical(e: &Expr) -> CompileError {
    CompileError::internal(Phase::AsmGen, format!("non-canonical expression {e}"))
}
