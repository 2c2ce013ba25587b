//! Instruction selection: canonical IR to MMIX over virtual temps.
//!
//! A single linear pass; every canonical IR node kind maps to one fixed
//! instruction template or a short fixed sequence.

mod expr;
mod stmt;

use super::instruction::{AsmInstr, Code};
use crate::config::MachineConfig;
use crate::ir::chunk::CodeChunk;
use crate::ir::context::Context;
use crate::ir::Temp;
use crate::CompileError;
use log::debug;
use std::collections::BTreeMap;

pub struct Selector<'a> {
    ctx: &'a mut Context,
    config: &'a MachineConfig,
    out: Vec<AsmInstr>,
}

impl<'a> Selector<'a> {
    pub fn new(ctx: &'a mut Context, config: &'a MachineConfig) -> Self {
        Self {
            ctx,
            config,
            out: Vec::new(),
        }
    }

    fn emit(&mut self, instr: AsmInstr) {
        self.out.push(instr);
    }

    fn new_temp(&mut self) -> Temp {
        self.ctx.new_temp()
    }

    pub fn finish(self) -> Vec<AsmInstr> {
        self.out
    }
}

/// Select instructions for one code chunk.
pub fn select(
    chunk: &CodeChunk,
    config: &MachineConfig,
    ctx: &mut Context,
) -> Result<Code, CompileError> {
    let mut sel = Selector::new(ctx, config);
    for stmt in &chunk.stmts {
        sel.stmt(stmt)?;
    }
    let instrs = sel.finish();
    debug!(
        "asmgen: {} -> {} instructions",
        chunk.name,
        instrs.len()
    );
    Ok(Code {
        name: chunk.name.clone(),
        frame: chunk.frame.clone(),
        entry: chunk.entry.clone(),
        exit: chunk.exit.clone(),
        instrs,
        regs: BTreeMap::new(),
        temp_size: 0,
    })
}
