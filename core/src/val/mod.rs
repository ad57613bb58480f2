mod builtin;


use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::typ::Type;

pub use builtin::{Arity, Builtin, NativeFn};

/// Runtime value shared by the evaluator and the stack machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Val {
    /// The canonical "no meaningful result" value.
    #[default]
    Unspecified,
    /// Empty list.
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Symbol(Arc<str>),
    /// Native procedure. Never serialized; trees refer to builtins by global name.
    #[serde(skip)]
    Builtin(Builtin),
}

impl Val {
    pub fn str(s: &str) -> Self {
        Val::Str(Arc::from(s))
    }

    pub fn symbol(s: &str) -> Self {
        Val::Symbol(Arc::from(s))
    }

    /// Only `#f` is false.
    #[inline]
    pub fn is_true(&self) -> bool {
        !matches!(self, Val::Bool(false))
    }

    pub fn static_type(&self) -> Type {
        match self {
            Val::Unspecified => Type::Unspecified,
            Val::Nil => Type::Nil,
            Val::Bool(_) => Type::Bool,
            Val::Int(_) => Type::Int,
            Val::Float(_) => Type::Float,
            Val::Str(_) => Type::String,
            Val::Symbol(_) => Type::Symbol,
            Val::Builtin(_) => Type::Procedure,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Unspecified => "Unspecified",
            Val::Nil => "Nil",
            Val::Bool(_) => "Bool",
            Val::Int(_) => "Int",
            Val::Float(_) => "Float",
            Val::Str(_) => "String",
            Val::Symbol(_) => "Symbol",
            Val::Builtin(_) => "Procedure",
        }
    }
}

impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Unspecified, Val::Unspecified) | (Val::Nil, Val::Nil) => true,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            // Bitwise so NaN results from both paths still compare equal.
            (Val::Float(a), Val::Float(b)) => a.to_bits() == b.to_bits(),
            (Val::Str(a), Val::Str(b)) => a == b,
            (Val::Symbol(a), Val::Symbol(b)) => a == b,
            (Val::Builtin(a), Val::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl From<i64> for Val {
    fn from(value: i64) -> Self {
        Val::Int(value)
    }
}

impl From<i32> for Val {
    fn from(value: i32) -> Self {
        Val::Int(value as i64)
    }
}

impl From<f64> for Val {
    fn from(value: f64) -> Self {
        Val::Float(value)
    }
}

impl From<bool> for Val {
    fn from(value: bool) -> Self {
        Val::Bool(value)
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::Unspecified => f.write_str("#<unspecified>"),
            Val::Nil => f.write_str("()"),
            Val::Bool(true) => f.write_str("#t"),
            Val::Bool(false) => f.write_str("#f"),
            Val::Int(i) => f.write_str(itoa::Buffer::new().format(*i)),
            Val::Float(fl) => f.write_str(ryu::Buffer::new().format(*fl)),
            Val::Str(s) => write!(f, "{:?}", s.as_ref()),
            Val::Symbol(s) => f.write_str(s),
            Val::Builtin(b) => write!(f, "#<procedure {}>", b.name),
        }
    }
}
