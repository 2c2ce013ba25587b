use super::ir::{Label, Stmt};
use crate::frames::Frame;
use std::fmt;

/// Statically allocated datum: a global variable or a string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    pub label: Label,
    pub size: i64,
    /// Initial bytes (strings); `None` means zero-initialised.
    pub init: Option<Vec<u8>>,
}

/// One function's canonical body, bracketed by its entry and exit labels.
#[derive(Debug, Clone)]
pub struct CodeChunk {
    pub name: String,
    pub frame: Frame,
    pub entry: Label,
    pub exit: Label,
    pub stmts: Vec<Stmt>,
}

impl fmt::Display for DataChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.init {
            Some(bytes) => write!(
                f,
                "{} [{}] {:?}",
                self.label,
                self.size,
                String::from_utf8_lossy(bytes)
            ),
            None => write!(f, "{} [{}]", self.label, self.size),
        }
    }
}

impl fmt::Display for CodeChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}): entry={} exit={} fp={} rv={}",
            self.name, self.frame.label, self.entry, self.exit, self.frame.fp, self.frame.rv
        )?;
        for stmt in &self.stmts {
            writeln!(f, "  {stmt}")?;
        }
        Ok(())
    }
}
