use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::typ::{NumericClass, NumericHierarchy};
use crate::val::Val;

/// Static type attached to variables and inferred for nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Type {
    /// Top type: statically anything, checked at runtime.
    #[default]
    Any,
    Int,
    Float,
    Bool,
    String,
    Symbol,
    Nil,
    Unspecified,
    Procedure,
}

impl Type {
    pub fn numeric_class(&self) -> Option<NumericClass> {
        NumericHierarchy::classify(self)
    }

    /// Whether a value statically typed `self` may be stored into a slot declared `target`.
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        match (self, target) {
            (_, Type::Any) => true,
            // Dynamic value: the runtime coercion decides.
            (Type::Any, _) => true,
            (a, b) if a == b => true,
            (lhs, rhs) => match (lhs.numeric_class(), rhs.numeric_class()) {
                (Some(from), Some(to)) => NumericHierarchy::widens_to(from, to),
                _ => false,
            },
        }
    }

    /// Coerce a runtime value into this declared type.
    ///
    /// Numeric widening is the only implicit conversion.
    pub fn coerce(&self, val: Val, who: &str) -> Result<Val, CoreError> {
        if matches!(self, Type::Any) {
            return Ok(val);
        }
        if let Some(target) = self.numeric_class() {
            let actual = val.type_name();
            return NumericHierarchy::widen(val, target)
                .ok_or_else(|| CoreError::type_error(who, format!("expected {}, got {}", self, actual)));
        }
        if &val.static_type() == self {
            Ok(val)
        } else {
            Err(CoreError::type_error(
                who,
                format!("expected {}, got {}", self, val.type_name()),
            ))
        }
    }

    /// Least common type of two branches; anything but an exact match widens to `Any`.
    pub fn join(&self, other: &Type) -> Type {
        if self == other {
            return self.clone();
        }
        match (self.numeric_class(), other.numeric_class()) {
            (Some(a), Some(b)) => match NumericHierarchy::result(a, b) {
                NumericClass::Int => Type::Int,
                NumericClass::Float => Type::Float,
            },
            _ => Type::Any,
        }
    }
}

/// The `CanAssign(declared, value)` oracle used by assignment construction.
pub fn can_assign(declared: &Type, value: &Type) -> bool {
    value.is_assignable_to(declared)
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Any => "Any",
            Type::Int => "Int",
            Type::Float => "Float",
            Type::Bool => "Bool",
            Type::String => "String",
            Type::Symbol => "Symbol",
            Type::Nil => "Nil",
            Type::Unspecified => "Unspecified",
            Type::Procedure => "Procedure",
        };
        f.write_str(name)
    }
}
