//! Interference graph with simplify/select/color.

use crate::backend::instruction::AsmInstr;
use crate::ir::Temp;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub adj: BTreeSet<Temp>,
    pub color: Option<u8>,
    /// Still in the graph, i.e. not yet pushed on the color stack.
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: BTreeMap<Temp, Node>,
}

impl Graph {
    /// Build the graph from live sets. `precolored` gets no node.
    ///
    /// Temps live together in an instruction's in-set or out-set interfere;
    /// so does every def with everything live after its instruction, which
    /// keeps a dead def from landing in a live temp's register.
    pub fn build(instrs: &[AsmInstr], precolored: Temp) -> Self {
        let mut g = Graph::default();
        for instr in instrs {
            for t in instr
                .temps()
                .chain(instr.live_in.iter().copied())
                .chain(instr.live_out.iter().copied())
            {
                if t != precolored {
                    g.nodes.entry(t).or_insert_with(|| Node {
                        active: true,
                        ..Node::default()
                    });
                }
            }
        }
        for instr in instrs {
            g.clique(&instr.live_in, precolored);
            g.clique(&instr.live_out, precolored);
            for &d in instr.defs() {
                for &o in &instr.live_out {
                    g.add_edge(d, o, precolored);
                }
            }
        }
        g
    }

    fn clique(&mut self, temps: &BTreeSet<Temp>, precolored: Temp) {
        for &a in temps {
            for &b in temps.range(a..).skip(1) {
                self.add_edge(a, b, precolored);
            }
        }
    }

    fn add_edge(&mut self, a: Temp, b: Temp, precolored: Temp) {
        if a == b || a == precolored || b == precolored {
            return;
        }
        if let Some(n) = self.nodes.get_mut(&a) {
            n.adj.insert(b);
        }
        if let Some(n) = self.nodes.get_mut(&b) {
            n.adj.insert(a);
        }
    }

    pub fn interferes(&self, a: Temp, b: Temp) -> bool {
        self.nodes.get(&a).is_some_and(|n| n.adj.contains(&b))
    }

    /// Number of neighbours still in the graph.
    pub fn degree(&self, t: Temp) -> usize {
        self.nodes.get(&t).map_or(0, |n| {
            n.adj
                .iter()
                .filter(|a| self.nodes.get(a).is_some_and(|m| m.active))
                .count()
        })
    }

    fn active(&self) -> impl Iterator<Item = Temp> + '_ {
        self.nodes
            .iter()
            .filter(|(_, n)| n.active)
            .map(|(t, _)| *t)
    }

    fn push(&mut self, t: Temp, stack: &mut Vec<Temp>) {
        if let Some(n) = self.nodes.get_mut(&t) {
            n.active = false;
        }
        stack.push(t);
    }

    /// Simplify until the graph is empty, pushing a spill candidate whenever
    /// no node of degree below `k` is left. `avoid` temps are picked as spill
    /// candidates only when nothing else remains.
    pub fn simplify(&mut self, k: usize, avoid: &BTreeSet<Temp>) -> Vec<Temp> {
        let mut stack = Vec::with_capacity(self.nodes.len());
        loop {
            let low = self.active().find(|&t| self.degree(t) < k);
            if let Some(t) = low {
                self.push(t, &mut stack);
                continue;
            }

            // Highest degree first, lowest temp id on ties.
            let candidate = self
                .active()
                .map(|t| (!avoid.contains(&t), self.degree(t), std::cmp::Reverse(t)))
                .max()
                .map(|(_, _, std::cmp::Reverse(t))| t);
            match candidate {
                Some(t) => self.push(t, &mut stack),
                None => break,
            }
        }
        stack
    }

    /// Pop the stack and give every node the lowest color its colored
    /// neighbours leave free. Returns the nodes no color was left for.
    pub fn color(&mut self, mut stack: Vec<Temp>, k: usize) -> Vec<Temp> {
        let mut spills = Vec::new();
        while let Some(t) = stack.pop() {
            let used: BTreeSet<u8> = self.nodes[&t]
                .adj
                .iter()
                .filter_map(|a| self.nodes.get(a).and_then(|n| n.color))
                .collect();
            let free = (0..k).map(|c| c as u8).find(|c| !used.contains(c));
            match free {
                Some(c) => {
                    if let Some(n) = self.nodes.get_mut(&t) {
                        n.color = Some(c);
                    }
                }
                None => spills.push(t),
            }
        }
        spills
    }

    pub fn colors(&self) -> BTreeMap<Temp, u8> {
        self.nodes
            .iter()
            .filter_map(|(t, n)| n.color.map(|c| (*t, c)))
            .collect()
    }
}
