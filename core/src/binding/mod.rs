//! Variable bindings: storage classification, lexical scopes and the module table.

mod module;
mod scope;
mod storage;
mod variable;


pub use module::ModuleScope;
pub use scope::{Scope, StorageLocation, VariableReference};
pub use storage::{DeclContext, StorageKind, classify};
pub use variable::{VarId, Variable};
