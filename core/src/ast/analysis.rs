//! Analysis passes built on [`Visitor`].

use std::collections::BTreeMap;

use crate::ast::{Node, Visitor};
use crate::binding::{VarId, Variable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UseCount {
    pub reads: usize,
    pub writes: usize,
}

/// Counts reads and writes per variable.
#[derive(Debug, Default)]
pub struct VariableUses {
    counts: BTreeMap<VarId, (Variable, UseCount)>,
}

impl VariableUses {
    pub fn collect(node: &Node) -> Self {
        let mut uses = Self::default();
        node.accept(&mut uses);
        uses
    }

    pub fn get(&self, variable: &Variable) -> UseCount {
        self.counts
            .get(&variable.id())
            .map(|(_, c)| *c)
            .unwrap_or_default()
    }

    /// Variables in id order with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, UseCount)> {
        self.counts.values().map(|(v, c)| (v, *c))
    }

    fn entry(&mut self, variable: &Variable) -> &mut UseCount {
        &mut self
            .counts
            .entry(variable.id())
            .or_insert_with(|| (variable.clone(), UseCount::default()))
            .1
    }
}

impl Visitor for VariableUses {
    fn walk(&mut self, node: &Node) -> bool {
        match node {
            Node::Read(read) => self.entry(&read.variable).reads += 1,
            Node::Assign(assign) => self.entry(assign.variable()).writes += 1,
            _ => {}
        }
        true
    }
}

/// Collects variables whose use-sites were never resolved.
#[derive(Debug, Default)]
pub struct UnresolvedReferences {
    pub variables: Vec<Variable>,
}

impl UnresolvedReferences {
    pub fn collect(node: &Node) -> Self {
        let mut pass = Self::default();
        node.accept(&mut pass);
        pass
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl Visitor for UnresolvedReferences {
    fn walk(&mut self, node: &Node) -> bool {
        let (variable, resolution) = match node {
            Node::Read(read) => (&read.variable, &read.reference),
            Node::Assign(assign) => (assign.variable(), assign.reference()),
            _ => return true,
        };
        if !resolution.is_resolved() {
            self.variables.push(variable.clone());
        }
        true
    }
}
