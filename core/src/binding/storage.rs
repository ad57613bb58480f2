use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a variable's value lives at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    /// Function-local binding in a frame slot.
    Local,
    /// Compiler scratch value, keyed by variable identity.
    Temporary,
    /// Scratch value that must survive a suspension of a resumable body.
    GeneratorTemporary,
    /// Module-level binding, keyed by name.
    Global,
}

impl StorageKind {
    pub fn is_temporary(self) -> bool {
        matches!(self, StorageKind::Temporary | StorageKind::GeneratorTemporary)
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageKind::Local => "local",
            StorageKind::Temporary => "temporary",
            StorageKind::GeneratorTemporary => "generator-temporary",
            StorageKind::Global => "global",
        };
        f.write_str(s)
    }
}

/// Facts about the site where a binding is elaborated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclContext {
    /// Number of enclosing function bodies (0 = module level).
    pub function_depth: u16,
    /// Introduced by the compiler rather than written by the user.
    pub compiler_generated: bool,
    /// Inside a suspendable/resumable procedure body.
    pub in_generator: bool,
}

impl DeclContext {
    pub fn module_level() -> Self {
        Self::default()
    }

    pub fn function_body() -> Self {
        Self {
            function_depth: 1,
            ..Self::default()
        }
    }

    pub fn scratch(self) -> Self {
        Self {
            compiler_generated: true,
            ..self
        }
    }

    pub fn resumable(self) -> Self {
        Self {
            in_generator: true,
            ..self
        }
    }
}

/// Decide the storage kind of a new binding.
pub fn classify(ctx: &DeclContext) -> StorageKind {
    if ctx.compiler_generated {
        if ctx.in_generator {
            StorageKind::GeneratorTemporary
        } else {
            StorageKind::Temporary
        }
    } else if ctx.function_depth == 0 {
        StorageKind::Global
    } else {
        StorageKind::Local
    }
}
