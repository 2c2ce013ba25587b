//! Rewriting spilled temps into stack loads and stores.
//!
//! Spill slots sit below the saved frame pointer and return address:
//! slot `s` of a frame with `locs` bytes of locals lives at
//! `FP - (locs + 2*word + s + word)`.

use crate::backend::instruction::{load_const, AsmInstr, Code};
use crate::config::MachineConfig;
use crate::ir::context::Context;
use crate::ir::Temp;
use log::trace;
use std::collections::{BTreeMap, BTreeSet};

/// Stack offsets of spilled temps, assigned on first use.
#[derive(Debug, Default)]
pub struct SpillSlots {
    slots: BTreeMap<Temp, i64>,
    size: i64,
}

impl SpillSlots {
    pub fn slot(&mut self, t: Temp, word: i64) -> i64 {
        if let Some(&offset) = self.slots.get(&t) {
            return offset;
        }
        let offset = self.size;
        self.slots.insert(t, offset);
        self.size += word;
        offset
    }

    /// Bytes taken by all slots so far.
    pub fn size(&self) -> i64 {
        self.size
    }
}

/// Replace every mention of a `spilled` temp by a fresh temp loaded before
/// the instruction and/or stored after it. Returns the fresh temps.
pub fn rewrite(
    code: &mut Code,
    spilled: &BTreeSet<Temp>,
    slots: &mut SpillSlots,
    ctx: &mut Context,
    config: &MachineConfig,
) -> BTreeSet<Temp> {
    let word = config.word_size;
    let fp = code.frame.fp;
    let base = code.frame.locs_size + 2 * word;
    let mut fresh = BTreeSet::new();
    let mut out = Vec::with_capacity(code.instrs.len() * 2);

    for mut instr in std::mem::take(&mut code.instrs) {
        let mentioned: BTreeSet<Temp> = instr.temps().filter(|t| spilled.contains(t)).collect();
        if mentioned.is_empty() {
            out.push(instr);
            continue;
        }

        let renames: BTreeMap<Temp, Temp> = mentioned
            .iter()
            .map(|&t| (t, ctx.new_temp()))
            .collect();
        fresh.extend(renames.values().copied());

        let mut after = Vec::new();
        for (&old, &new) in &renames {
            let address = base + slots.slot(old, word) + word;
            if instr.uses().contains(&old) {
                let off = ctx.new_temp();
                out.extend(load_const(address, off, config.chunk_bits));
                out.push(AsmInstr::oper("SUB `d0,`s0,`s1", vec![fp, off], vec![off], vec![]));
                out.push(AsmInstr::oper("LDO `d0,`s0,0", vec![off], vec![new], vec![]));
            }
            if instr.defs().contains(&old) {
                let off = ctx.new_temp();
                after.extend(load_const(address, off, config.chunk_bits));
                after.push(AsmInstr::oper("SUB `d0,`s0,`s1", vec![fp, off], vec![off], vec![]));
                after.push(AsmInstr::oper("STO `s0,`s1,0", vec![new, off], vec![], vec![]));
            }
            trace!("spill {} as {} at FP-{}", old, new, address);
        }

        instr.map_temps(|t| renames.get(&t).copied().unwrap_or(t));
        out.push(instr);
        out.extend(after);
    }

    code.instrs = out;
    code.temp_size = slots.size();
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::Frame;
    use crate::ir::Label;

    fn code(instrs: Vec<AsmInstr>) -> Code {
        Code {
            name: "f".into(),
            frame: Frame {
                label: Label::named("f"),
                depth: 1,
                locs_size: 16,
                args_size: 8,
                size: 40,
                fp: Temp(0),
                rv: Temp(1),
            },
            entry: Label::Anon(0),
            exit: Label::Anon(1),
            instrs,
            regs: BTreeMap::new(),
            temp_size: 0,
        }
    }

    #[test]
    fn use_and_def_share_one_fresh_temp() {
        let mut ctx = Context::new();
        for _ in 0..10 {
            ctx.new_temp();
        }
        let mut c = code(vec![AsmInstr::oper(
            "ADD `d0,`s0,`s1",
            vec![Temp(5), Temp(6)],
            vec![Temp(5)],
            vec![],
        )]);
        let mut slots = SpillSlots::default();
        let spilled = BTreeSet::from([Temp(5)]);
        let fresh = rewrite(&mut c, &spilled, &mut slots, &mut ctx, &MachineConfig::default());

        let text: Vec<_> = c.instrs.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            text,
            [
                "SETL T11,40",
                "SUB T11,T0,T11",
                "LDO T10,T11,0",
                "ADD T10,T10,T6",
                "SETL T12,40",
                "SUB T12,T0,T12",
                "STO T10,T12,0",
            ]
        );
        assert_eq!(fresh, BTreeSet::from([Temp(10)]));
        assert_eq!(c.temp_size, 8);
        assert!(c.instrs.iter().all(|i| !i.temps().any(|t| t == Temp(5))));
    }

    #[test]
    fn slots_are_assigned_once() {
        let mut slots = SpillSlots::default();
        assert_eq!(slots.slot(Temp(3), 8), 0);
        assert_eq!(slots.slot(Temp(4), 8), 8);
        assert_eq!(slots.slot(Temp(3), 8), 0);
        assert_eq!(slots.size(), 16);
    }
}
