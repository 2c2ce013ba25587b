//! Frame evaluation: stack layout for every function and access paths for
//! every variable, parameter and string literal.
//!
//! Layout conventions:
//! - depth 0 is the global scope, top-level functions live at depth 1,
//! - the static link sits at offset 0 above the frame pointer and
//!   parameters follow it at positive offsets,
//! - locals grow downwards at negative offsets,
//! - below the locals the prologue saves the caller's FP and return address,
//!   and the outgoing-argument area sits at the bottom of the frame.

use crate::ast::{Decl, DeclId, Expr, ExprId, ExprKind, FunDecl, Program, Stmt, WORD};
use crate::ir::context::Context;
use crate::ir::{Label, Temp};
use crate::{CompileError, Phase};
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt;

/// Activation record layout of one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub label: Label,
    pub depth: u32,
    pub locs_size: i64,
    pub args_size: i64,
    /// Locals, saved FP and return address, and outgoing arguments.
    pub size: i64,
    /// Frame pointer temp.
    pub fp: Temp,
    /// Return value temp.
    pub rv: Temp,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FRAME({}, depth={}, locs={}, args={}, size={}, FP={}, RV={})",
            self.label, self.depth, self.locs_size, self.args_size, self.size, self.fp, self.rv
        )
    }
}

/// Where a variable lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Statically allocated, addressed by label.
    Abs {
        size: i64,
        label: Label,
        init: Option<Vec<u8>>,
    },
    /// Offset from the frame pointer of the frame at `depth`.
    Rel { size: i64, offset: i64, depth: u32 },
}

#[derive(Debug, Default)]
pub struct Frames {
    pub frames: HashMap<DeclId, Frame>,
    pub accesses: HashMap<DeclId, Access>,
    pub strings: HashMap<ExprId, Access>,
}

impl Frames {
    pub fn frame(&self, id: DeclId) -> Result<&Frame, CompileError> {
        self.frames
            .get(&id)
            .ok_or_else(|| CompileError::internal(Phase::Frames, format!("no frame for {id:?}")))
    }

    pub fn access(&self, id: DeclId) -> Result<&Access, CompileError> {
        self.accesses
            .get(&id)
            .ok_or_else(|| CompileError::internal(Phase::Frames, format!("no access for {id:?}")))
    }

    pub fn string(&self, id: ExprId) -> Result<&Access, CompileError> {
        self.strings.get(&id).ok_or_else(|| {
            CompileError::internal(Phase::Frames, format!("no access for string {id:?}"))
        })
    }
}

/// Compute frames and accesses for a whole program.
pub fn evaluate(program: &Program, ctx: &mut Context) -> Result<Frames, CompileError> {
    let mut ev = Evaluator {
        ctx,
        out: Frames::default(),
        scopes: Vec::new(),
    };
    for decl in &program.decls {
        ev.decl(decl)?;
    }
    debug!(
        "frames: {} functions, {} accesses, {} strings",
        ev.out.frames.len(),
        ev.out.accesses.len(),
        ev.out.strings.len()
    );
    Ok(ev.out)
}

// ── Evaluator ───────────────────────────────────────────────────────────

/// Sizes accumulated while walking one function body.
struct FunScope {
    depth: u32,
    locs_size: i64,
    args_size: i64,
}

struct Evaluator<'a> {
    ctx: &'a mut Context,
    out: Frames,
    scopes: Vec<FunScope>,
}

impl Evaluator<'_> {
    fn depth(&self) -> u32 {
        self.scopes.last().map_or(0, |s| s.depth)
    }

    fn decl(&mut self, decl: &Decl) -> Result<(), CompileError> {
        match decl {
            Decl::Var(var) => {
                let size = var.ty.size();
                if size < 0 {
                    return Err(CompileError::internal(
                        Phase::Frames,
                        format!("variable {} has negative size", var.name),
                    ));
                }
                let access = match self.scopes.last_mut() {
                    None => Access::Abs {
                        size,
                        label: Label::named(&var.name),
                        init: None,
                    },
                    Some(scope) => {
                        scope.locs_size += size;
                        Access::Rel {
                            size,
                            offset: -scope.locs_size,
                            depth: scope.depth,
                        }
                    }
                };
                trace!("{} -> {:?}", var.name, access);
                self.out.accesses.insert(var.id, access);
                Ok(())
            }
            Decl::Fun(fun) => self.fun(fun),
        }
    }

    fn fun(&mut self, fun: &FunDecl) -> Result<(), CompileError> {
        let depth = self.depth() + 1;

        // Arguments and results travel in single words.
        if fun.ret.is_aggregate() {
            return Err(CompileError::internal(
                Phase::Frames,
                format!("{} returns aggregate type {}", fun.name, fun.ret),
            ));
        }
        for (i, par) in fun.params.iter().enumerate() {
            if par.ty.is_aggregate() {
                return Err(CompileError::internal(
                    Phase::Frames,
                    format!(
                        "parameter {} of {} has aggregate type {}",
                        par.name, fun.name, par.ty
                    ),
                ));
            }
            self.out.accesses.insert(
                par.id,
                Access::Rel {
                    size: WORD,
                    offset: WORD * (i as i64 + 1),
                    depth,
                },
            );
        }

        self.scopes.push(FunScope {
            depth,
            locs_size: 0,
            args_size: 0,
        });
        if let Some(body) = &fun.body {
            self.expr(body)?;
        }
        let scope = self.scopes.pop().ok_or_else(|| {
            CompileError::internal(Phase::Frames, format!("scope underflow in {}", fun.name))
        })?;

        let label = if depth == 1 || fun.body.is_none() {
            Label::named(&fun.name)
        } else {
            self.ctx.new_label()
        };
        let args_size = scope.args_size.max(WORD);
        let frame = Frame {
            label,
            depth,
            locs_size: scope.locs_size,
            args_size,
            size: scope.locs_size + 2 * WORD + args_size,
            fp: self.ctx.new_temp(),
            rv: self.ctx.new_temp(),
        };
        debug!("{}: {}", fun.name, frame);
        self.out.frames.insert(fun.id, frame);
        Ok(())
    }

    fn note_call(&mut self, size: i64) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.args_size = scope.args_size.max(size);
        }
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match &expr.kind {
            ExprKind::Atom { value } => {
                if let crate::ast::Atom::Str(s) = value {
                    let mut bytes = s.as_bytes().to_vec();
                    bytes.push(0);
                    let access = Access::Abs {
                        size: bytes.len() as i64,
                        label: self.ctx.new_label(),
                        init: Some(bytes),
                    };
                    self.out.strings.insert(expr.id, access);
                }
            }
            ExprKind::Var { .. } => {}
            ExprKind::New { .. } => self.note_call(2 * WORD),
            ExprKind::Index { array, index } => {
                self.expr(array)?;
                self.expr(index)?;
            }
            ExprKind::Field { record, .. } => self.expr(record)?,
            ExprKind::Unary { operand, .. } | ExprKind::Cast { operand } => self.expr(operand)?,
            ExprKind::Binary { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)?;
            }
            ExprKind::Del { operand } => {
                self.note_call(2 * WORD);
                self.expr(operand)?;
            }
            ExprKind::Call { args, .. } => {
                if let Some(arg) = args.iter().find(|a| a.ty.is_aggregate()) {
                    return Err(CompileError::internal(
                        Phase::Frames,
                        format!("call argument of aggregate type {}", arg.ty),
                    ));
                }
                self.note_call(WORD * (args.len() as i64 + 1));
                for arg in args {
                    self.expr(arg)?;
                }
            }
            ExprKind::Block {
                decls,
                stmts,
                value,
            } => {
                for decl in decls {
                    self.decl(decl)?;
                }
                for stmt in stmts {
                    self.stmt(stmt)?;
                }
                self.expr(value)?;
            }
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Expr { expr } => self.expr(expr),
            Stmt::Assign { dst, src } => {
                self.expr(dst)?;
                self.expr(src)
            }
            Stmt::If {
                cond,
                then_stmts,
                else_stmts,
            } => {
                self.expr(cond)?;
                for s in then_stmts.iter().chain(else_stmts) {
                    self.stmt(s)?;
                }
                Ok(())
            }
            Stmt::While { cond, body } => {
                self.expr(cond)?;
                for s in body {
                    self.stmt(s)?;
                }
                Ok(())
            }
        }
    }
}
