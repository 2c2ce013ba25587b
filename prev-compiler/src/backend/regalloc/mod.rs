//! Graph-coloring register allocation with spilling.
//!
//! Each round:
//! - rebuild the interference graph from fresh liveness,
//! - simplify, pushing high-degree spill candidates when stuck,
//! - color by popping the stack, lowest free color first,
//! - rewrite uncolored temps into stack loads/stores and start over.
//!
//! The frame pointer is precolored to `$253` (`fP`) and never takes part.

pub mod graph;
pub mod spill;

use super::instruction::Code;
use super::liveness;
use crate::config::MachineConfig;
use crate::ir::context::Context;
use crate::ir::Temp;
use crate::CompileError;
use graph::Graph;
use log::debug;
use spill::SpillSlots;
use std::collections::BTreeSet;

/// Register MMIX code uses as the frame pointer.
pub const FP_REGISTER: u8 = 253;
/// Register MMIX code uses as the stack pointer.
pub const SP_REGISTER: u8 = 254;

/// Allocate registers for `code` in place, filling `regs` and `temp_size`.
/// Gives up after one round more than the function has instructions.
pub fn allocate(
    code: &mut Code,
    config: &MachineConfig,
    ctx: &mut Context,
) -> Result<(), CompileError> {
    let max_rounds = code.instrs.len() + 1;
    allocate_within(code, config, ctx, max_rounds)
}

/// [`allocate`] with an explicit cap on spill rounds.
pub fn allocate_within(
    code: &mut Code,
    config: &MachineConfig,
    ctx: &mut Context,
    max_rounds: usize,
) -> Result<(), CompileError> {
    config.validate()?;
    let k = config.registers;
    let fp = code.frame.fp;

    let mut slots = SpillSlots::default();
    let mut spill_temps: BTreeSet<Temp> = BTreeSet::new();
    let mut round = 0;

    loop {
        round += 1;
        if round > max_rounds {
            return Err(CompileError::RegisterPressure {
                function: code.name.clone(),
                registers: k,
                rounds: max_rounds,
            });
        }

        liveness::analyse(code)?;
        let mut graph = Graph::build(&code.instrs, fp);
        let stack = graph.simplify(k, &spill_temps);
        let spills = graph.color(stack, k);

        if spills.is_empty() {
            let mut regs = graph.colors();
            regs.insert(fp, FP_REGISTER);
            debug!(
                "ralloc: {} colored {} temps with {} registers in {} rounds, {} spill bytes",
                code.name,
                regs.len(),
                k,
                round,
                slots.size()
            );
            code.regs = regs;
            code.temp_size = slots.size();
            return Ok(());
        }

        debug!(
            "ralloc: {} round {} spills {}",
            code.name,
            round,
            spills
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );
        let spilled: BTreeSet<Temp> = spills.into_iter().collect();
        let fresh = spill::rewrite(code, &spilled, &mut slots, ctx, config);
        spill_temps.extend(fresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::instruction::AsmInstr;
    use crate::frames::Frame;
    use crate::ir::Label;
    use std::collections::BTreeMap;

    fn code(instrs: Vec<AsmInstr>, exit: Label) -> Code {
        Code {
            name: "f".into(),
            frame: Frame {
                label: Label::named("f"),
                depth: 1,
                locs_size: 0,
                args_size: 8,
                size: 24,
                fp: Temp(0),
                rv: Temp(1),
            },
            entry: Label::Anon(0),
            exit,
            instrs,
            regs: BTreeMap::new(),
            temp_size: 0,
        }
    }

    fn ctx_after(n: u32) -> Context {
        let mut ctx = Context::new();
        for _ in 0..n {
            ctx.new_temp();
        }
        ctx
    }

    /// Define temps 2..2+n, then sum them all into RV.
    fn pressure(n: u32) -> Code {
        let exit = Label::Anon(9);
        let mut instrs = Vec::new();
        for t in 2..2 + n {
            instrs.push(AsmInstr::oper(format!("SETL `d0,{t}"), vec![], vec![Temp(t)], vec![]));
        }
        let mut acc = Temp(2);
        for t in 3..2 + n {
            let next = Temp(100 + t);
            instrs.push(AsmInstr::oper(
                "ADD `d0,`s0,`s1",
                vec![acc, Temp(t)],
                vec![next],
                vec![],
            ));
            acc = next;
        }
        instrs.push(AsmInstr::mov("SET `d0,`s0", vec![acc], vec![Temp(1)]));
        instrs.push(AsmInstr::oper("JMP L9", vec![], vec![], vec![exit.clone()]));
        code(instrs, exit)
    }

    #[test]
    fn enough_registers_means_no_spill() {
        let mut c = pressure(4);
        let mut ctx = ctx_after(200);
        allocate(&mut c, &MachineConfig::with_registers(8), &mut ctx).unwrap();
        assert_eq!(c.temp_size, 0);
        assert_eq!(c.regs[&Temp(0)], FP_REGISTER);
        assert!(c.regs.values().filter(|&&r| r != FP_REGISTER).all(|&r| r < 8));
    }

    #[test]
    fn high_pressure_spills_and_still_converges() {
        let mut c = pressure(6);
        let before = c.instrs.len();
        let mut ctx = ctx_after(200);
        allocate(&mut c, &MachineConfig::with_registers(3), &mut ctx).unwrap();
        assert!(c.temp_size > 0);
        assert!(c.instrs.len() > before);
        assert!(c.instrs.iter().any(|i| i.to_string().starts_with("STO")));
        assert!(c.instrs.iter().any(|i| i.to_string().starts_with("LDO")));
        assert!(liveness::is_fixpoint(&c).unwrap());

        // Every temp still mentioned has a register.
        for instr in &c.instrs {
            for t in instr.temps() {
                assert!(c.regs.contains_key(&t), "{t} has no register");
            }
        }
    }

    #[test]
    fn exhausted_round_cap_is_register_pressure() {
        let mut c = pressure(6);
        let mut ctx = ctx_after(200);
        let err = allocate_within(&mut c, &MachineConfig::with_registers(3), &mut ctx, 1)
            .unwrap_err();
        match err {
            CompileError::RegisterPressure {
                function,
                registers,
                rounds,
            } => {
                assert_eq!(function, "f");
                assert_eq!(registers, 3);
                assert_eq!(rounds, 1);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn single_register_is_a_configuration_error() {
        let mut c = pressure(2);
        let mut ctx = ctx_after(200);
        let err = allocate(&mut c, &MachineConfig::with_registers(1), &mut ctx).unwrap_err();
        assert!(matches!(err, CompileError::Config(_)));
    }
}
