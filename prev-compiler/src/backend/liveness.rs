//! Liveness analysis over one function's instruction list.
//!
//! Classic backward dataflow iterated to a fixpoint:
//! `in = (out - defs) ∪ uses`, `out = ∪ in(succ)`.
//! Successors are the next instruction when `jumps` is empty, otherwise the
//! label instructions named in `jumps`. A jump to the function's exit label
//! contributes nothing.

use super::instruction::{AsmInstr, Code};
use crate::ir::{Label, Temp};
use crate::CompileError;
use log::{debug, trace};
use std::collections::{BTreeSet, HashMap};

/// Successor indices of every instruction.
fn successors(code: &Code) -> Result<Vec<Vec<usize>>, CompileError> {
    let labels: HashMap<&Label, usize> = code
        .instrs
        .iter()
        .enumerate()
        .filter_map(|(i, instr)| instr.as_label().map(|l| (l, i)))
        .collect();

    let n = code.instrs.len();
    let mut succs = Vec::with_capacity(n);
    for (i, instr) in code.instrs.iter().enumerate() {
        let jumps = instr.jumps();
        if jumps.is_empty() {
            succs.push(if i + 1 < n { vec![i + 1] } else { vec![] });
            continue;
        }
        let mut targets = Vec::with_capacity(jumps.len());
        for label in jumps {
            if *label == code.exit {
                continue;
            }
            match labels.get(label) {
                Some(&idx) => targets.push(idx),
                None => {
                    return Err(CompileError::UnresolvedLabel {
                        label: label.to_string(),
                        function: code.name.clone(),
                    })
                }
            }
        }
        succs.push(targets);
    }
    Ok(succs)
}

/// One backward sweep; returns whether any set changed.
fn sweep(instrs: &mut [AsmInstr], succs: &[Vec<usize>]) -> bool {
    let mut changed = false;
    for i in (0..instrs.len()).rev() {
        let mut out = BTreeSet::new();
        for &s in &succs[i] {
            out.extend(instrs[s].live_in.iter().copied());
        }

        let instr = &instrs[i];
        let mut live_in: BTreeSet<Temp> = out
            .iter()
            .copied()
            .filter(|t| !instr.defs().contains(t))
            .collect();
        live_in.extend(instr.uses().iter().copied());

        let instr = &mut instrs[i];
        if instr.live_in != live_in || instr.live_out != out {
            instr.live_in = live_in;
            instr.live_out = out;
            changed = true;
        }
    }
    changed
}

/// Recompute every instruction's live sets from scratch.
/// Returns the number of sweeps until nothing changed.
pub fn analyse(code: &mut Code) -> Result<usize, CompileError> {
    let succs = successors(code)?;
    for instr in &mut code.instrs {
        instr.live_in.clear();
        instr.live_out.clear();
    }

    let mut sweeps = 1;
    while sweep(&mut code.instrs, &succs) {
        sweeps += 1;
        trace!("liveness: {} sweep {}", code.name, sweeps);
    }
    debug!(
        "liveness: {} converged after {} sweeps over {} instructions",
        code.name,
        sweeps,
        code.instrs.len()
    );
    Ok(sweeps)
}

/// Whether the current live sets are stable under one more sweep.
pub fn is_fixpoint(code: &Code) -> Result<bool, CompileError> {
    let succs = successors(code)?;
    let mut instrs = code.instrs.clone();
    Ok(!sweep(&mut instrs, &succs))
}
