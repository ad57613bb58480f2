use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::binding::ModuleScope;
use crate::error::CoreError;
use crate::val::Val;

/// Signature of a native procedure. The module scope is passed for
/// `symbol-value`-style global access.
pub type NativeFn = fn(args: &[Val], module: &mut ModuleScope) -> Result<Val>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, argc: usize) -> bool {
        match self {
            Arity::Exact(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

#[derive(Clone)]
pub struct Builtin {
    pub name: Arc<str>,
    pub arity: Arity,
    pub func: NativeFn,
}

impl Builtin {
    pub fn new(name: &str, arity: Arity, func: NativeFn) -> Self {
        Self {
            name: Arc::from(name),
            arity,
            func,
        }
    }

    /// Check the argument count, then dispatch.
    pub fn invoke(&self, args: &[Val], module: &mut ModuleScope) -> Result<Val> {
        if !self.arity.accepts(args.len()) {
            return Err(CoreError::type_error(
                self.name.clone(),
                format!("expected {} arguments, got {}", self.arity, args.len()),
            )
            .into());
        }
        (self.func)(args, module)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}
