use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Deserializer, Serialize};

use crate::binding::{DeclContext, StorageKind, classify};
use crate::typ::Type;

static NEXT_VAR_ID: AtomicU32 = AtomicU32::new(0);

/// Unique variable handle. Two bindings with the same name still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(u32);

impl VarId {
    fn fresh() -> Self {
        VarId(NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl<'de> Deserialize<'de> for VarId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u32::deserialize(deserializer)?;
        // Loaded trees carry their own ids; keep fresh ones clear of them.
        NEXT_VAR_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        Ok(VarId(raw))
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A declared binding. Identity is the id; the storage kind is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    id: VarId,
    name: Arc<str>,
    #[serde(default)]
    ty: Type,
    kind: StorageKind,
}

impl Variable {
    pub fn new(name: &str, ty: Type, kind: StorageKind) -> Self {
        Self {
            id: VarId::fresh(),
            name: Arc::from(name),
            ty,
            kind,
        }
    }

    /// Declare a binding, classifying its storage from the declaration site.
    pub fn declare(name: &str, ty: Type, ctx: &DeclContext) -> Self {
        Self::new(name, ty, classify(ctx))
    }

    pub fn local(name: &str, ty: Type) -> Self {
        Self::new(name, ty, StorageKind::Local)
    }

    pub fn temporary(name: &str, ty: Type) -> Self {
        Self::new(name, ty, StorageKind::Temporary)
    }

    pub fn generator_temporary(name: &str, ty: Type) -> Self {
        Self::new(name, ty, StorageKind::GeneratorTemporary)
    }

    pub fn global(name: &str, ty: Type) -> Self {
        Self::new(name, ty, StorageKind::Global)
    }

    #[inline]
    pub fn id(&self) -> VarId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn kind(&self) -> StorageKind {
        self.kind
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id.0)
    }
}
