use serde::{Deserialize, Serialize};

use crate::ast::Node;
use crate::error::CoreError;

/// One `(test body)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub test: Node,
    pub body: Node,
}

impl Clause {
    pub fn new(test: Node, body: Node) -> Self {
        Self { test, body }
    }
}

/// `if`/`cond`: ordered clauses, first true test wins, optional else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IfRepr")]
pub struct If {
    clauses: Vec<Clause>,
    else_body: Option<Box<Node>>,
}

#[derive(Deserialize)]
struct IfRepr {
    clauses: Vec<Clause>,
    #[serde(default)]
    else_body: Option<Box<Node>>,
}

impl TryFrom<IfRepr> for If {
    type Error = CoreError;

    fn try_from(repr: IfRepr) -> Result<Self, Self::Error> {
        If::new(repr.clauses, repr.else_body.map(|b| *b))
    }
}

impl If {
    /// At least one clause is required.
    pub fn new(clauses: Vec<Clause>, else_body: Option<Node>) -> Result<Self, CoreError> {
        if clauses.is_empty() {
            return Err(CoreError::structural("cond", "conditional requires at least one clause"));
        }
        Ok(Self {
            clauses,
            else_body: else_body.map(Box::new),
        })
    }

    pub fn single(test: Node, then: Node, else_body: Option<Node>) -> Self {
        Self {
            clauses: vec![Clause::new(test, then)],
            else_body: else_body.map(Box::new),
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub(crate) fn clauses_mut(&mut self) -> &mut [Clause] {
        &mut self.clauses
    }

    pub fn else_body(&self) -> Option<&Node> {
        self.else_body.as_deref()
    }

    pub(crate) fn else_body_mut(&mut self) -> Option<&mut Node> {
        self.else_body.as_deref_mut()
    }

    /// Attach (or replace) the else branch while building incrementally.
    pub fn set_else(&mut self, body: Node) -> Option<Node> {
        self.else_body.replace(Box::new(body)).map(|b| *b)
    }

    /// Whether any path through this conditional reaches the end.
    pub fn falls_through(&self) -> bool {
        match &self.else_body {
            None => true,
            Some(otherwise) => self.clauses.iter().any(|c| falls_through(&c.body)) || falls_through(otherwise),
        }
    }
}

/// Structural tail check: false only when `node` provably never reaches its end.
///
/// Looks at syntactic tail position only. An empty block falls through.
pub fn falls_through(node: &Node) -> bool {
    match node {
        Node::Return(_) | Node::Continue => false,
        Node::Block(block) => block.body.last().is_none_or(falls_through),
        Node::If(cond) => cond.falls_through(),
        _ => true,
    }
}
