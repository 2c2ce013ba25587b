//! Fixed machine parameters the back end is parameterised over.

use crate::CompileError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Number of general-purpose registers available to the allocator (K).
    pub registers: usize,
    /// Word size in bytes.
    pub word_size: i64,
    /// Width of one immediate chunk used to materialise constants.
    pub chunk_bits: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            registers: 8,
            word_size: 8,
            chunk_bits: 16,
        }
    }
}

impl MachineConfig {
    pub fn with_registers(registers: usize) -> Self {
        Self {
            registers,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.registers < 2 {
            return Err(CompileError::Config(format!(
                "at least 2 registers are required, got {}",
                self.registers
            )));
        }
        // $251 and up are global: data segment base, sP, fP, trap register.
        if self.registers > 250 {
            return Err(CompileError::Config(format!(
                "at most 250 registers can be allocated, got {}",
                self.registers
            )));
        }
        if self.word_size != 8 {
            return Err(CompileError::Config(format!(
                "MMIX words are 8 bytes, got {}",
                self.word_size
            )));
        }
        if self.chunk_bits != 16 {
            return Err(CompileError::Config(format!(
                "MMIX immediates are 16-bit wydes, got {} bits",
                self.chunk_bits
            )));
        }
        Ok(())
    }
}
