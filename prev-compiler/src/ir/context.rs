//! Per-compilation state shared by every phase.
//!
//! Temp and label counters live here instead of in globals, so two
//! compilations in one process never share ids. The context also collects
//! the data chunks (globals and string literals) the emitter lays out.

use super::chunk::DataChunk;
use super::ir::{Label, Temp};

#[derive(Debug, Default)]
pub struct Context {
    temp_count: u32,
    label_count: u32,
    data: Vec<DataChunk>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_temp(&mut self) -> Temp {
        let t = Temp(self.temp_count);
        self.temp_count += 1;
        t
    }

    pub fn new_label(&mut self) -> Label {
        let l = Label::Anon(self.label_count);
        self.label_count += 1;
        l
    }

    pub fn temp_count(&self) -> u32 {
        self.temp_count
    }

    pub fn add_data(&mut self, chunk: DataChunk) {
        self.data.push(chunk);
    }

    pub fn data(&self) -> &[DataChunk] {
        &self.data
    }

    pub fn into_data(self) -> Vec<DataChunk> {
        self.data
    }
}
