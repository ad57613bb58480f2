use std::fmt;
use std::sync::Arc;

use crate::binding::{ModuleScope, StorageKind, VarId, Variable};
use crate::error::CoreError;
use crate::util::fast_map::{FastHashMap, fast_hash_map_new};

/// Storage handle a reference resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageLocation {
    /// Frame slot index, shared by every local in the unit.
    Slot(u16),
    /// Scratch table entry keyed by variable identity.
    Temp(VarId),
    /// Module table entry keyed by name.
    Global(Arc<str>),
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Slot(i) => write!(f, "slot[{}]", i),
            StorageLocation::Temp(id) => write!(f, "temp[{}]", id),
            StorageLocation::Global(name) => write!(f, "global[{}]", name),
        }
    }
}

/// A use-site resolved to the variable it denotes and where that variable lives.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableReference {
    pub variable: Variable,
    pub location: StorageLocation,
}

impl VariableReference {
    pub fn new(variable: Variable, location: StorageLocation) -> Self {
        Self { variable, location }
    }

    pub fn global(variable: Variable) -> Self {
        let location = StorageLocation::Global(variable.name().clone());
        Self { variable, location }
    }
}

/// One lexical frame. Owns its bindings, borrows its parent.
///
/// The chain always bottoms out in the module scope, so lookup never falls
/// off the end silently.
#[derive(Debug)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    module: &'a ModuleScope,
    bindings: FastHashMap<Arc<str>, VariableReference>,
}

impl<'a> Scope<'a> {
    /// Outermost lexical frame, backed by the module scope.
    pub fn root(module: &'a ModuleScope) -> Self {
        Self {
            parent: None,
            module,
            bindings: fast_hash_map_new(),
        }
    }

    /// Nested frame whose parent is `self`.
    pub fn child(&self) -> Scope<'_> {
        Scope {
            parent: Some(self),
            module: self.module,
            bindings: fast_hash_map_new(),
        }
    }

    pub fn module(&self) -> &ModuleScope {
        self.module
    }

    /// Number of lexical frames above this one.
    pub fn depth(&self) -> usize {
        self.parent.map_or(0, |p| p.depth() + 1)
    }

    /// Whether this frame itself binds `name`.
    pub fn binds_locally(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bind in this frame, shadowing (not touching) any outer binding of the same name.
    pub fn define(&mut self, variable: Variable, location: StorageLocation) -> VariableReference {
        let reference = VariableReference::new(variable, location);
        self.bindings
            .insert(reference.variable.name().clone(), reference.clone());
        reference
    }

    /// Nearest binding of `name`, falling back to the module scope.
    pub fn lookup(&self, name: &str) -> Result<VariableReference, CoreError> {
        let mut frame = Some(self);
        while let Some(scope) = frame {
            if let Some(found) = scope.bindings.get(name) {
                return Ok(found.clone());
            }
            frame = scope.parent;
        }
        match self.module.lookup_variable(name) {
            Some(var) => Ok(VariableReference::global(var.clone())),
            None => Err(CoreError::unbound(name)),
        }
    }

    /// Resolve a specific variable by identity. Unlike [`Scope::lookup`], an inner
    /// binding with the same name but a different identity is skipped.
    pub fn resolve(&self, variable: &Variable) -> Result<VariableReference, CoreError> {
        if variable.kind() == StorageKind::Global {
            return Ok(VariableReference::global(variable.clone()));
        }
        let mut frame = Some(self);
        while let Some(scope) = frame {
            if let Some(found) = scope.bindings.get(variable.name().as_ref())
                && found.variable == *variable
            {
                return Ok(found.clone());
            }
            frame = scope.parent;
        }
        Err(CoreError::structural(
            variable.name().clone(),
            format!("{} variable {} has no storage in any enclosing block", variable.kind(), variable),
        ))
    }
}
