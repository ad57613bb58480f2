use serde::{Deserialize, Serialize};

use crate::ast::{Assign, Clause, If};
use crate::binding::{Variable, VariableReference};
use crate::error::CoreError;
use crate::typ::Type;
use crate::val::Val;

/// Late-bound reference slot: starts `Unresolved`, replaced exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Resolution {
    #[default]
    Unresolved,
    Resolved(VariableReference),
}

impl Resolution {
    /// Bind the reference. A second bind is rejected, even with an equal reference.
    pub fn bind(&mut self, reference: VariableReference) -> Result<(), CoreError> {
        match self {
            Resolution::Unresolved => {
                *self = Resolution::Resolved(reference);
                Ok(())
            }
            Resolution::Resolved(existing) => Err(CoreError::structural(
                existing.variable.name().clone(),
                format!("reference to {} is already resolved to {}", existing.variable, existing.location),
            )),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn get(&self) -> Option<&VariableReference> {
        match self {
            Resolution::Resolved(r) => Some(r),
            Resolution::Unresolved => None,
        }
    }

    /// Resolved reference, or the emission error for lowering an unresolved one.
    pub fn expect_resolved(&self, variable: &Variable) -> Result<&VariableReference, CoreError> {
        self.get().ok_or_else(|| {
            CoreError::emission(
                variable.name().clone(),
                format!("reference to {} was never resolved", variable),
            )
        })
    }
}

/// Variable read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarRead {
    pub variable: Variable,
    #[serde(skip)]
    pub reference: Resolution,
}

/// Scope-introducing sequence. `locals` are bound (unassigned) on entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub locals: Vec<Variable>,
    pub body: Vec<Node>,
    /// Set once the resolver has allocated this block's locals.
    #[serde(skip)]
    pub(crate) resolved: bool,
}

impl Block {
    pub fn new(locals: Vec<Variable>, body: Vec<Node>) -> Self {
        Self {
            locals,
            body,
            resolved: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// AST node. The set is closed; every capability dispatches by `match`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Literal(Val),
    Read(VarRead),
    Assign(Assign),
    If(If),
    Block(Block),
    Call { callee: Box<Node>, args: Vec<Node> },
    Return(Option<Box<Node>>),
    Continue,
}

impl Node {
    pub fn literal(value: impl Into<Val>) -> Self {
        Node::Literal(value.into())
    }

    pub fn unspecified() -> Self {
        Node::Literal(Val::Unspecified)
    }

    pub fn read(variable: &Variable) -> Self {
        Node::Read(VarRead {
            variable: variable.clone(),
            reference: Resolution::Unresolved,
        })
    }

    /// `(set! variable value)`; fails when the value's static type cannot be assigned.
    pub fn assign(variable: &Variable, value: Node) -> Result<Self, CoreError> {
        Assign::new(variable.clone(), value).map(Node::Assign)
    }

    /// First assignment of a binding (initialization rather than mutation).
    pub fn define(variable: &Variable, value: Node) -> Result<Self, CoreError> {
        Assign::definition(variable.clone(), value).map(Node::Assign)
    }

    /// `(if test then else)`.
    pub fn if_else(test: Node, then: Node, otherwise: Option<Node>) -> Self {
        Node::If(If::single(test, then, otherwise))
    }

    /// `(cond (test body) ... (else body))`; fails with no clauses.
    pub fn cond(clauses: Vec<Clause>, otherwise: Option<Node>) -> Result<Self, CoreError> {
        If::new(clauses, otherwise).map(Node::If)
    }

    pub fn block(locals: Vec<Variable>, body: Vec<Node>) -> Self {
        Node::Block(Block::new(locals, body))
    }

    pub fn seq(body: Vec<Node>) -> Self {
        Node::Block(Block::new(Vec::new(), body))
    }

    pub fn call(callee: Node, args: Vec<Node>) -> Self {
        Node::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn ret(value: Option<Node>) -> Self {
        Node::Return(value.map(Box::new))
    }

    /// Short name for diagnostics and tracing.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Literal(_) => "literal",
            Node::Read(_) => "read",
            Node::Assign(_) => "set!",
            Node::If(_) => "if",
            Node::Block(_) => "begin",
            Node::Call { .. } => "call",
            Node::Return(_) => "return",
            Node::Continue => "continue",
        }
    }

    /// Statically known type of the node's value.
    pub fn static_type(&self) -> Type {
        match self {
            Node::Literal(v) => v.static_type(),
            Node::Read(read) => read.variable.ty().clone(),
            Node::Assign(assign) => assign.variable().ty().clone(),
            Node::If(node) => {
                let mut ty: Option<Type> = None;
                for clause in node.clauses() {
                    let body = clause.body.static_type();
                    ty = Some(ty.map_or(body.clone(), |t| t.join(&body)));
                }
                let otherwise = node
                    .else_body()
                    .map_or(Type::Unspecified, |e| e.static_type());
                ty.map_or(otherwise.clone(), |t| t.join(&otherwise))
            }
            Node::Block(block) => block
                .body
                .last()
                .map_or(Type::Unspecified, |last| last.static_type()),
            Node::Call { .. } | Node::Return(_) | Node::Continue => Type::Any,
        }
    }
}
