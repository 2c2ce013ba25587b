//! Canonicalization: IR trees to linear statement lists.
//!
//! After this pass:
//! - there are no `SeqExpr` nodes and no nested `Seq` statements,
//! - every operand of a binary, unary or call node is a temp, constant or
//!   name, evaluated in source order by the moves that precede it,
//! - every memory access goes through a temp address,
//! - every `CondJump` tests a temp and is followed by its own false label.
//!
//! Canonicalizing an already canonical list returns it unchanged.

mod expr;
mod stmt;

use super::chunk::CodeChunk;
use super::context::Context;
use super::ir_generator::FunctionIr;
use super::{Expr, Stmt};
use crate::CompileError;
use log::debug;

pub struct Canon<'a> {
    ctx: &'a mut Context,
}

impl<'a> Canon<'a> {
    pub fn new(ctx: &'a mut Context) -> Self {
        Self { ctx }
    }
}

/// Canonicalize a list of statements.
pub fn canonicalize(stmts: &[Stmt], ctx: &mut Context) -> Result<Vec<Stmt>, CompileError> {
    let mut out = Vec::with_capacity(stmts.len());
    Canon::new(ctx).stmts(stmts, &mut out)?;
    Ok(out)
}

/// Wrap every function body into a code chunk:
/// `Label(entry); body; Move(RV, value); Jump(exit)`.
pub fn chunks(funs: &[FunctionIr], ctx: &mut Context) -> Result<Vec<CodeChunk>, CompileError> {
    let mut out = Vec::with_capacity(funs.len());
    for fun in funs {
        let entry = ctx.new_label();
        let exit = ctx.new_label();
        let body = [
            Stmt::Label(entry.clone()),
            Stmt::Move(Expr::Temp(fun.frame.rv), fun.body.clone()),
            Stmt::Jump(exit.clone()),
        ];
        let stmts = canonicalize(&body, ctx)?;
        debug!("canon: {} -> {} statements", fun.name, stmts.len());
        out.push(CodeChunk {
            name: fun.name.clone(),
            frame: fun.frame.clone(),
            entry,
            exit,
            stmts,
        });
    }
    Ok(out)
}
