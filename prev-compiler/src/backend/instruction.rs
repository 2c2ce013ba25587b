//! MMIX assembly instructions over virtual temps.
//!
//! Instructions are kept as textual templates plus explicit data-flow
//! metadata. Inside a template, `` `s0 ``, `` `s1 ``, ... stand for the
//! instruction's uses and `` `d0 `` for its def; they are substituted with
//! temp names before allocation and with register names after it.

use super::regalloc::{FP_REGISTER, SP_REGISTER};
use crate::frames::Frame;
use crate::ir::{Label, Temp};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// Instructions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstrKind {
    /// Any operation; `jumps` empty means control falls through.
    Oper {
        template: String,
        uses: Vec<Temp>,
        defs: Vec<Temp>,
        jumps: Vec<Label>,
    },
    /// Temp-to-temp copy.
    Move {
        template: String,
        uses: Vec<Temp>,
        defs: Vec<Temp>,
    },
    Label(Label),
}

/// One instruction plus the live sets computed by liveness analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmInstr {
    pub kind: InstrKind,
    pub live_in: BTreeSet<Temp>,
    pub live_out: BTreeSet<Temp>,
}

impl AsmInstr {
    fn new(kind: InstrKind) -> Self {
        Self {
            kind,
            live_in: BTreeSet::new(),
            live_out: BTreeSet::new(),
        }
    }

    pub fn oper(
        template: impl Into<String>,
        uses: Vec<Temp>,
        defs: Vec<Temp>,
        jumps: Vec<Label>,
    ) -> Self {
        Self::new(InstrKind::Oper {
            template: template.into(),
            uses,
            defs,
            jumps,
        })
    }

    pub fn mov(template: impl Into<String>, uses: Vec<Temp>, defs: Vec<Temp>) -> Self {
        Self::new(InstrKind::Move {
            template: template.into(),
            uses,
            defs,
        })
    }

    pub fn label(label: Label) -> Self {
        Self::new(InstrKind::Label(label))
    }

    pub fn uses(&self) -> &[Temp] {
        match &self.kind {
            InstrKind::Oper { uses, .. } | InstrKind::Move { uses, .. } => uses,
            InstrKind::Label(_) => &[],
        }
    }

    pub fn defs(&self) -> &[Temp] {
        match &self.kind {
            InstrKind::Oper { defs, .. } | InstrKind::Move { defs, .. } => defs,
            InstrKind::Label(_) => &[],
        }
    }

    pub fn jumps(&self) -> &[Label] {
        match &self.kind {
            InstrKind::Oper { jumps, .. } => jumps,
            InstrKind::Move { .. } | InstrKind::Label(_) => &[],
        }
    }

    pub fn as_label(&self) -> Option<&Label> {
        match &self.kind {
            InstrKind::Label(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_label(&self) -> bool {
        self.as_label().is_some()
    }

    /// Every temp this instruction mentions.
    pub fn temps(&self) -> impl Iterator<Item = Temp> + '_ {
        self.uses().iter().chain(self.defs()).copied()
    }

    /// Rename temps in uses and defs.
    pub fn map_temps(&mut self, mut f: impl FnMut(Temp) -> Temp) {
        if let InstrKind::Oper { uses, defs, .. } | InstrKind::Move { uses, defs, .. } =
            &mut self.kind
        {
            for t in uses.iter_mut().chain(defs.iter_mut()) {
                *t = f(*t);
            }
        }
    }

    /// Instantiate the template, naming temps through `regs` when given.
    pub fn render(&self, regs: Option<&BTreeMap<Temp, u8>>) -> String {
        let (template, uses, defs) = match &self.kind {
            InstrKind::Oper {
                template,
                uses,
                defs,
                ..
            }
            | InstrKind::Move {
                template,
                uses,
                defs,
            } => (template, uses, defs),
            InstrKind::Label(l) => return format!("{l}"),
        };

        let name = |t: Temp| match regs.and_then(|r| r.get(&t)) {
            Some(&reg) => register_name(reg),
            None => t.to_string(),
        };

        let mut out = String::with_capacity(template.len() + 8);
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '`' {
                out.push(c);
                continue;
            }
            let kind = chars.next();
            let mut idx = 0usize;
            while let Some(d) = chars.peek().and_then(|d| d.to_digit(10)) {
                idx = idx * 10 + d as usize;
                chars.next();
            }
            let temp = match kind {
                Some('s') => uses.get(idx),
                Some('d') => defs.get(idx),
                _ => None,
            };
            match temp {
                Some(t) => out.push_str(&name(*t)),
                None => {
                    out.push('`');
                    if let Some(k) = kind {
                        out.push(k);
                    }
                    out.push_str(&idx.to_string());
                }
            }
        }
        out
    }
}

impl fmt::Display for AsmInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

/// Assembly spelling of a register: the frame and stack pointers go by
/// their global names, everything else is `$n`.
pub fn register_name(reg: u8) -> String {
    match reg {
        FP_REGISTER => "fP".to_string(),
        SP_REGISTER => "sP".to_string(),
        n => format!("${n}"),
    }
}

// ============================================================================
// Constants
// ============================================================================

/// Split `value` into immediate-load steps: `SETL` with the low wyde, then
/// `INCML`/`INCMH`/`INCH` for every non-zero higher wyde.
pub fn wydes(value: i64, chunk_bits: u32) -> Vec<(&'static str, u64)> {
    const INC: [&str; 3] = ["INCML", "INCMH", "INCH"];
    let bits = value as u64;
    let mask = (1u64 << chunk_bits) - 1;

    let mut steps = vec![("SETL", bits & mask)];
    for (i, op) in INC.iter().enumerate() {
        let shift = chunk_bits * (i as u32 + 1);
        if shift >= 64 {
            break;
        }
        let chunk = (bits >> shift) & mask;
        if chunk != 0 {
            steps.push((*op, chunk));
        }
    }
    steps
}

/// Materialise `value` into `dst`.
pub fn load_const(value: i64, dst: Temp, chunk_bits: u32) -> Vec<AsmInstr> {
    wydes(value, chunk_bits)
        .into_iter()
        .map(|(op, chunk)| {
            let uses = if op == "SETL" { vec![] } else { vec![dst] };
            AsmInstr::oper(format!("{op} `d0,{chunk}"), uses, vec![dst], vec![])
        })
        .collect()
}

/// Materialise the address of a data label into `dst`, one wyde at a time,
/// so labels anywhere in the data segment are reachable.
pub fn load_address(label: &Label, dst: Temp) -> Vec<AsmInstr> {
    [("SETH", 48), ("INCMH", 32), ("INCML", 16), ("INCL", 0)]
        .into_iter()
        .map(|(op, shift)| {
            let uses = if op == "SETH" { vec![] } else { vec![dst] };
            AsmInstr::oper(
                format!("{op} `d0,({label}>>{shift})&#FFFF"),
                uses,
                vec![dst],
                vec![],
            )
        })
        .collect()
}

// ============================================================================
// Code
// ============================================================================

/// One function's assembly: the instruction list and, once allocated, the
/// register of every temp plus the bytes of spill slots it needs.
#[derive(Debug, Clone)]
pub struct Code {
    pub name: String,
    pub frame: Frame,
    pub entry: Label,
    pub exit: Label,
    pub instrs: Vec<AsmInstr>,
    pub regs: BTreeMap<Temp, u8>,
    pub temp_size: i64,
}

impl Code {
    pub fn is_allocated(&self) -> bool {
        !self.regs.is_empty()
    }

    /// Listing with temps, or registers once allocated.
    pub fn listing(&self) -> String {
        let regs = self.is_allocated().then_some(&self.regs);
        let mut out = String::new();
        for instr in &self.instrs {
            if instr.is_label() {
                out.push_str(&instr.render(regs));
                out.push('\n');
            } else {
                out.push_str("    ");
                out.push_str(&instr.render(regs));
                out.push('\n');
            }
        }
        out
    }

    /// Listing annotated with live-in and live-out sets.
    pub fn liveness_listing(&self) -> String {
        let set = |s: &BTreeSet<Temp>| {
            s.iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        let mut out = String::new();
        for instr in &self.instrs {
            out.push_str(&format!(
                "{:<28} in: {{{}}} out: {{{}}}\n",
                instr.to_string(),
                set(&instr.live_in),
                set(&instr.live_out)
            ));
        }
        out
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}): entry={} exit={} spill={}",
            self.name, self.frame.label, self.entry, self.exit, self.temp_size
        )?;
        f.write_str(&self.listing())
    }
}
