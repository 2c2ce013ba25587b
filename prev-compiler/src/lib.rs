//! Back end of the PREV compiler: typed AST to register-allocated MMIX.
//!
//! Pipeline, one function at a time:
//! - [`frames`]: frame and access tables for every declaration,
//! - [`ir::ir_generator`]: typed tree to intermediate code,
//! - [`ir::canon`]: linear, side-effect-ordered chunks,
//! - [`backend::codegen`]: MMIX instruction selection over virtual temps,
//! - [`backend::liveness`] and [`backend::regalloc`]: liveness and coloring,
//! - [`backend::emitter`]: final assembly text with runtime stubs.

pub mod ast;
pub mod backend;
pub mod config;
pub mod frames;
pub mod ir;

pub use config::MachineConfig;

use backend::instruction::Code;
use ir::chunk::DataChunk;
use ir::context::Context;
use log::debug;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("internal compiler error during {phase}: {message}")]
    Internal { phase: Phase, message: String },

    #[error("unresolved jump target {label} in function {function}")]
    UnresolvedLabel { label: String, function: String },

    #[error("cannot allocate {function} with {registers} registers after {rounds} spill rounds")]
    RegisterPressure {
        function: String,
        registers: usize,
        rounds: usize,
    },

    #[error("invalid machine configuration: {0}")]
    Config(String),
}

impl CompileError {
    pub fn internal(phase: Phase, message: impl Into<String>) -> Self {
        CompileError::Internal {
            phase,
            message: message.into(),
        }
    }
}

/// Compiler phase an internal error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Frames,
    ImcGen,
    Canon,
    AsmGen,
    Liveness,
    RegAlloc,
    Emit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Frames => write!(f, "frames"),
            Phase::ImcGen => write!(f, "imcgen"),
            Phase::Canon => write!(f, "canon"),
            Phase::AsmGen => write!(f, "asmgen"),
            Phase::Liveness => write!(f, "liveness"),
            Phase::RegAlloc => write!(f, "ralloc"),
            Phase::Emit => write!(f, "emit"),
        }
    }
}

/// Result of running every phase up to and including register allocation.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub data: Vec<DataChunk>,
    pub codes: Vec<Code>,
}

/// Compile a typed program to allocated MMIX instruction lists.
pub fn compile_to_code(
    program: &ast::Program,
    config: &MachineConfig,
) -> Result<Compilation, CompileError> {
    config.validate()?;
    let mut ctx = Context::new();

    let frames = frames::evaluate(program, &mut ctx)?;
    let imc = ir::ir_generator::generate(program, &frames, &mut ctx)?;
    let chunks = ir::canon::chunks(&imc, &mut ctx)?;
    debug!("{} code chunks, {} data chunks", chunks.len(), ctx.data().len());

    let mut codes = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let mut code = backend::codegen::select(chunk, config, &mut ctx)?;
        backend::regalloc::allocate(&mut code, config, &mut ctx)?;
        codes.push(code);
    }

    Ok(Compilation {
        data: ctx.into_data(),
        codes,
    })
}

/// Compile a typed program all the way to MMIX assembly text.
pub fn compile_to_mmix(
    program: &ast::Program,
    config: &MachineConfig,
) -> Result<String, CompileError> {
    let compilation = compile_to_code(program, config)?;
    backend::emitter::emit(&compilation, config)
}
