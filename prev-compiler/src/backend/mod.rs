//! MMIX back end: lowers canonical chunks to allocated assembly.
//!
//! Module layout:
//! - `instruction`: templated instructions over temps, per-function [`Code`]
//! - `codegen`: instruction selection from canonical IR
//! - `liveness`: backward dataflow over instruction lists
//! - `regalloc`: interference graph coloring with spilling
//! - `runtime`: bootstrap and support routines
//! - `emitter`: prologues, epilogues and the final program text

pub mod codegen;
pub mod emitter;
pub mod instruction;
pub mod liveness;
pub mod regalloc;
pub mod runtime;

pub use instruction::{AsmInstr, Code, InstrKind};
