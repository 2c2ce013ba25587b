//! Intermediate code module.
//!
//! This module contains the IR tree definitions, the compilation context,
//! the typed-AST-to-IR generator and the canonicalizer that flattens IR
//! trees into linear chunks.

pub mod ir;
pub use ir::*;
pub mod canon;
pub mod chunk;
pub mod context;
pub mod ir_generator;
