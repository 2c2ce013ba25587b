//! Final MMIX program text: data segment, runtime, and every function
//! wrapped in its prologue and epilogue.
//!
//! Layout of a frame, from the frame pointer down:
//! - locals (`locs_size` bytes),
//! - saved caller FP, then saved return address,
//! - spill slots (`temp_size` bytes),
//! - outgoing arguments, ending at the stack pointer.

use super::instruction::{register_name, wydes, Code};
use super::runtime;
use crate::config::MachineConfig;
use crate::ir::chunk::DataChunk;
use crate::{Compilation, CompileError, Phase};
use log::debug;

/// Render a whole compilation as an MMIXAL program.
pub fn emit(compilation: &Compilation, config: &MachineConfig) -> Result<String, CompileError> {
    if !compilation
        .codes
        .iter()
        .any(|c| c.name == "main" && c.frame.depth == 1)
    {
        return Err(CompileError::internal(Phase::Emit, "program has no main function"));
    }

    let mut lines = vec![
        "fP\tGREG\t0".to_string(),
        "sP\tGREG\t0".to_string(),
        "\t\tLOC\tData_Segment".to_string(),
        "\t\tGREG\t@".to_string(),
    ];
    lines.extend(runtime::data());
    for chunk in &compilation.data {
        lines.extend(data_chunk(chunk, config.word_size));
    }

    lines.push(String::new());
    lines.push("\t\tLOC\t#100".to_string());
    lines.extend(runtime::bootstrap(config.registers));
    for (name, routine) in runtime::routines() {
        let user_defined = compilation
            .codes
            .iter()
            .any(|c| c.name == name && c.frame.depth == 1);
        if !user_defined {
            lines.extend(routine);
        }
    }
    for code in &compilation.codes {
        lines.extend(function(code, config)?);
    }
    lines.push(String::new());

    debug!("emit: {} lines", lines.len());
    Ok(lines.join("\n"))
}

fn data_chunk(chunk: &DataChunk, word: i64) -> Vec<String> {
    match &chunk.init {
        Some(bytes) => vec![format!("{}\tBYTE\t{}", chunk.label, byte_list(bytes))],
        None => {
            let mut out = vec![format!("{}\tOCTA\t0", chunk.label)];
            if chunk.size > word {
                out.push(format!("\t\tLOC\t@+{}", chunk.size - word));
            }
            out
        }
    }
}

/// MMIXAL operand list for a byte string: printable runs quoted, the rest
/// as numbers.
fn byte_list(bytes: &[u8]) -> String {
    let mut items = Vec::new();
    let mut run = String::new();
    for &b in bytes {
        if (0x20..0x7f).contains(&b) && b != b'"' {
            run.push(b as char);
        } else {
            if !run.is_empty() {
                items.push(format!("\"{}\"", std::mem::take(&mut run)));
            }
            items.push(b.to_string());
        }
    }
    if !run.is_empty() {
        items.push(format!("\"{run}\""));
    }
    if items.is_empty() {
        items.push("0".to_string());
    }
    items.join(",")
}

/// `SETL`/`INC*` lines loading `value` into `reg`.
fn set_const(reg: &str, value: i64, chunk_bits: u32) -> Vec<String> {
    wydes(value, chunk_bits)
        .into_iter()
        .map(|(op, chunk)| format!("\t\t{op}\t{reg},{chunk}"))
        .collect()
}

fn function(code: &Code, config: &MachineConfig) -> Result<Vec<String>, CompileError> {
    let word = config.word_size;
    let frame = &code.frame;
    let rv = code.regs.get(&frame.rv).ok_or_else(|| {
        CompileError::internal(
            Phase::Emit,
            format!("return value {} of {} has no register", frame.rv, code.name),
        )
    })?;

    let mut out = Vec::with_capacity(code.instrs.len() + 24);

    // Prologue: FP := SP, SP -= frame, save old FP and return address.
    out.push(format!("{}\tSET\t$1,fP", frame.label));
    out.push("\t\tSET\tfP,sP".to_string());
    out.extend(set_const("$0", frame.size + code.temp_size, config.chunk_bits));
    out.push("\t\tSUB\tsP,sP,$0".to_string());
    out.extend(set_const("$0", frame.locs_size + word, config.chunk_bits));
    out.push("\t\tSUB\t$0,fP,$0".to_string());
    out.push("\t\tSTO\t$1,$0,0".to_string());
    out.push(format!("\t\tSUB\t$0,$0,{word}"));
    out.push("\t\tGET\t$1,rJ".to_string());
    out.push("\t\tSTO\t$1,$0,0".to_string());
    out.push(format!("\t\tJMP\t{}", code.entry));

    for instr in &code.instrs {
        if let Some(t) = instr.temps().find(|t| !code.regs.contains_key(t)) {
            return Err(CompileError::internal(
                Phase::Emit,
                format!("{t} in {} has no register", code.name),
            ));
        }
        match instr.as_label() {
            Some(label) => out.push(format!("{label}\tSWYM")),
            None => out.push(format!("\t\t{}", instr.render(Some(&code.regs)))),
        }
    }

    // Epilogue: store RV for the caller, restore SP, FP and rJ.
    out.push(format!("{}\tSTO\t{},fP,0", code.exit, register_name(*rv)));
    out.push("\t\tSET\tsP,fP".to_string());
    out.extend(set_const("$0", frame.locs_size + word, config.chunk_bits));
    out.push("\t\tSUB\t$1,fP,$0".to_string());
    out.push("\t\tLDO\tfP,$1,0".to_string());
    out.push(format!("\t\tSUB\t$1,$1,{word}"));
    out.push("\t\tLDO\t$0,$1,0".to_string());
    out.push("\t\tPUT\trJ,$0".to_string());
    out.push("\t\tPOP\t0,0".to_string());
    Ok(out)
}
