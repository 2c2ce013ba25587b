use super::FunctionIr;
use crate::frames::{Frame, Frames};
use crate::ir::context::Context;
use crate::ir::*;
use crate::{CompileError, Phase};

pub struct Gen<'a> {
    pub frames: &'a Frames,
    pub ctx: &'a mut Context,
    pub out: Vec<FunctionIr>,
    /// Frames of the functions currently being lowered, innermost last.
    pub fn_stack: Vec<Frame>,
}

impl<'a> Gen<'a> {
    pub fn new(frames: &'a Frames, ctx: &'a mut Context) -> Self {
        Self {
            frames,
            ctx,
            out: Vec::new(),
            fn_stack: Vec::new(),
        }
    }

    pub fn finish(self) -> Vec<FunctionIr> {
        self.out
    }

    pub fn new_label(&mut self) -> Label {
        self.ctx.new_label()
    }

    pub fn current(&self) -> Result<&Frame, CompileError> {
        self.fn_stack
            .last()
            .ok_or_else(|| CompileError::internal(Phase::ImcGen, "expression outside of a function"))
    }

    /// Frame pointer of the frame `levels` static links above the current one.
    pub fn climb(&self, levels: u32) -> Result<Expr, CompileError> {
        let mut fp = Expr::Temp(self.current()?.fp);
        for _ in 0..levels {
            fp = Expr::mem(fp);
        }
        Ok(fp)
    }

    /// Static link to pass to a function declared at `callee_depth`: the
    /// frame pointer of the callee's enclosing frame.
    pub fn static_link(&self, callee_depth: u32) -> Result<Expr, CompileError> {
        let depth = self.current()?.depth;
        let levels = (depth + 1).checked_sub(callee_depth).ok_or_else(|| {
            CompileError::internal(
                Phase::ImcGen,
                format!("call from depth {depth} into depth {callee_depth}"),
            )
        })?;
        self.climb(levels)
    }

    pub fn with_frame<F, R>(&mut self, frame: Frame, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.fn_stack.push(frame);
        let result = f(self);
        self.fn_stack.pop();
        result
    }
}
