use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use log::info;
use prev_compiler::ast::Program;
use prev_compiler::backend::{codegen, liveness};
use prev_compiler::ir::context::Context;
use prev_compiler::ir::{canon, ir_generator};
use prev_compiler::{compile_to_code, frames, MachineConfig};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prevc")]
#[command(about = "Back end of the PREV compiler: typed AST (JSON) to MMIX")]
struct Args {
    /// Typed program as JSON
    file: PathBuf,

    /// Stop after this phase and print its result
    #[arg(long, value_enum, default_value_t = Stage::Mmix)]
    emit: Stage,

    /// Number of registers available to the allocator (overrides --config)
    #[arg(long, short = 'k')]
    registers: Option<usize>,

    /// Machine configuration as JSON
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Stage {
    /// Intermediate code per function
    Ir,
    /// Canonical code chunks
    Canon,
    /// Selected instructions over temps
    Asm,
    /// Selected instructions with live sets
    Liveness,
    /// Allocated instructions
    Alloc,
    /// Complete MMIX program
    Mmix,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config '{}'", path.display()))?;
            serde_json::from_str::<MachineConfig>(&text)
                .with_context(|| format!("parsing config '{}'", path.display()))?
        }
        None => MachineConfig::default(),
    };
    if let Some(k) = args.registers {
        config.registers = k;
    }
    config.validate()?;

    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("reading '{}'", args.file.display()))?;
    let program: Program = serde_json::from_str(&text)
        .with_context(|| format!("parsing typed program '{}'", args.file.display()))?;
    info!(
        "{}: {} declarations, {} registers",
        args.file.display(),
        program.decls.len(),
        config.registers
    );

    match args.emit {
        Stage::Ir | Stage::Canon | Stage::Asm | Stage::Liveness => {
            print_stage(&program, &config, args.emit)
        }
        Stage::Alloc => {
            let compilation = compile_to_code(&program, &config)?;
            for code in &compilation.codes {
                println!("{code}");
            }
            Ok(())
        }
        Stage::Mmix => {
            let asm = prev_compiler::compile_to_mmix(&program, &config)?;
            println!("{asm}");
            Ok(())
        }
    }
}

/// Run the phases before allocation and print the requested one.
fn print_stage(program: &Program, config: &MachineConfig, stage: Stage) -> Result<()> {
    let mut ctx = Context::new();
    let frames = frames::evaluate(program, &mut ctx)?;
    let imc = ir_generator::generate(program, &frames, &mut ctx)?;
    if stage == Stage::Ir {
        for chunk in ctx.data() {
            println!("{chunk}");
        }
        for fun in &imc {
            println!("{fun}");
        }
        return Ok(());
    }

    let chunks = canon::chunks(&imc, &mut ctx)?;
    if stage == Stage::Canon {
        for chunk in &chunks {
            println!("{chunk}");
        }
        return Ok(());
    }

    for chunk in &chunks {
        let mut code = codegen::select(chunk, config, &mut ctx)?;
        if stage == Stage::Liveness {
            let sweeps = liveness::analyse(&mut code)?;
            println!("{} ({} sweeps)", code.name, sweeps);
            print!("{}", code.liveness_listing());
        } else {
            println!("{code}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn stage_and_registers_parse() {
        let args = Args::parse_from(["prevc", "prog.json", "--emit", "liveness", "-k", "4"]);
        assert_eq!(args.emit, Stage::Liveness);
        assert_eq!(args.registers, Some(4));
    }
}
