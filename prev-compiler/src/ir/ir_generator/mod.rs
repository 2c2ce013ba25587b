//! Typed AST to IR lowering module.
//!
//! Every function body becomes one IR expression whose value is the
//! function's result. Control flow is already explicit (labels and jumps);
//! nesting and evaluation order are left to the canonicalizer.

pub mod context;
pub mod expr;
pub mod stmt;

pub use context::Gen;

use crate::ast::{Decl, FunDecl, Program};
use crate::frames::{Access, Frame, Frames};
use crate::ir::chunk::DataChunk;
use crate::ir::context::Context;
use crate::ir::Expr;
use crate::CompileError;
use log::debug;
use std::fmt;

/// IR of one function body.
#[derive(Debug, Clone)]
pub struct FunctionIr {
    pub name: String,
    pub frame: Frame,
    pub body: Expr,
}

impl fmt::Display for FunctionIr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.name, self.frame)?;
        writeln!(f, "  {}", self.body)
    }
}

/// Entry point: lower every function definition of the program. Global
/// variables and string literals are recorded as data chunks in `ctx`.
pub fn generate(
    program: &Program,
    frames: &Frames,
    ctx: &mut Context,
) -> Result<Vec<FunctionIr>, CompileError> {
    let mut g = Gen::new(frames, ctx);
    for decl in &program.decls {
        g.lower_decl(decl)?;
    }
    let out = g.finish();
    debug!("imcgen: {} functions", out.len());
    Ok(out)
}

impl Gen<'_> {
    pub fn lower_decl(&mut self, decl: &Decl) -> Result<(), CompileError> {
        match decl {
            Decl::Fun(fun) => self.lower_fun(fun),
            Decl::Var(var) => {
                if let Access::Abs { size, label, init } = self.frames.access(var.id)? {
                    self.ctx.add_data(DataChunk {
                        label: label.clone(),
                        size: *size,
                        init: init.clone(),
                    });
                }
                Ok(())
            }
        }
    }

    fn lower_fun(&mut self, fun: &FunDecl) -> Result<(), CompileError> {
        let Some(body) = &fun.body else {
            return Ok(());
        };
        let frame = self.frames.frame(fun.id)?.clone();
        let body = self.with_frame(frame.clone(), |g| g.lower_expr(body))?;
        self.out.push(FunctionIr {
            name: fun.name.clone(),
            frame,
            body,
        });
        Ok(())
    }
}
