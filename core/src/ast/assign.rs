use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ast::{Node, Resolution};
use crate::binding::{Variable, VariableReference};
use crate::error::CoreError;
use crate::typ::can_assign;

/// `(set! variable value)`.
///
/// The value is computed, coerced to the variable's declared type, stored
/// according to the variable's storage kind, and returned, so assignments
/// chain: `(set! x (set! y 5))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssignRepr")]
pub struct Assign {
    variable: Variable,
    value: Box<Node>,
    #[serde(skip)]
    reference: Resolution,
    /// Initialization of a fresh binding rather than a mutation.
    defined: bool,
}

#[derive(Deserialize)]
struct AssignRepr {
    variable: Variable,
    value: Box<Node>,
    #[serde(default)]
    defined: bool,
}

impl TryFrom<AssignRepr> for Assign {
    type Error = CoreError;

    fn try_from(repr: AssignRepr) -> Result<Self, Self::Error> {
        let mut assign = Assign::new(repr.variable, *repr.value)?;
        assign.defined = repr.defined;
        Ok(assign)
    }
}

impl Assign {
    /// Build an assignment. Fails with `TypeError` when the value's static type
    /// cannot be stored into the variable's declared type.
    pub fn new(variable: Variable, value: Node) -> Result<Self, CoreError> {
        let value_ty = value.static_type();
        if !can_assign(variable.ty(), &value_ty) {
            return Err(CoreError::type_error(
                "set!",
                format!(
                    "cannot assign {} value to {} declared {}",
                    value_ty,
                    variable,
                    variable.ty()
                ),
            ));
        }
        trace!(var = %variable, value = value.kind_name(), "assignment constructed");
        Ok(Self {
            variable,
            value: Box::new(value),
            reference: Resolution::Unresolved,
            defined: false,
        })
    }

    pub fn definition(variable: Variable, value: Node) -> Result<Self, CoreError> {
        let mut assign = Self::new(variable, value)?;
        assign.defined = true;
        Ok(assign)
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn value(&self) -> &Node {
        &self.value
    }

    pub(crate) fn value_mut(&mut self) -> &mut Node {
        &mut self.value
    }

    pub fn is_definition(&self) -> bool {
        self.defined
    }

    pub fn reference(&self) -> &Resolution {
        &self.reference
    }

    /// Set the late-bound reference. Only the resolver calls this, once.
    pub(crate) fn bind(&mut self, reference: VariableReference) -> Result<(), CoreError> {
        self.reference.bind(reference)
    }
}
