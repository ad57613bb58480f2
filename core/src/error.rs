use std::fmt;
use std::sync::Arc;

/// Kind of condition signaled by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Name not found in any frame, including the module scope.
    UnboundVariable,
    /// Name resolved to a storage location that was never written.
    UnassignedVariable,
    /// Static assignability gate or runtime coercion failed.
    Type,
    /// Lowering failed: unresolved reference, label fixed twice, or label never fixed.
    Emission,
    /// Malformed tree: zero-clause conditional, storage that cannot be resolved.
    Structural,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::UnboundVariable => "unbound variable",
            ErrorKind::UnassignedVariable => "unassigned variable",
            ErrorKind::Type => "type error",
            ErrorKind::Emission => "emission error",
            ErrorKind::Structural => "structural error",
        };
        f.write_str(label)
    }
}

/// A signaled condition: what went wrong, who raised it, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreError {
    pub kind: ErrorKind,
    /// Caller-identifying symbol (`set!`, `if`, `symbol-value`, a variable name, ...).
    pub who: Arc<str>,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: ErrorKind, who: impl Into<Arc<str>>, message: impl Into<String>) -> Self {
        Self {
            kind,
            who: who.into(),
            message: message.into(),
        }
    }

    pub fn unbound(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        let message = format!("no binding for '{}' in any enclosing scope", name);
        Self::new(ErrorKind::UnboundVariable, name, message)
    }

    pub fn unassigned(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        let message = format!("'{}' is bound but has not been assigned", name);
        Self::new(ErrorKind::UnassignedVariable, name, message)
    }

    pub fn type_error(who: impl Into<Arc<str>>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, who, message)
    }

    pub fn emission(who: impl Into<Arc<str>>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Emission, who, message)
    }

    pub fn structural(who: impl Into<Arc<str>>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, who, message)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}: {}", self.kind, self.who, self.message)
    }
}

impl std::error::Error for CoreError {}

/// Recover the [`ErrorKind`] from an `anyhow` error raised by this crate.
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<CoreError>().map(|e| e.kind)
}
