//! The node family shared by the evaluator and the emitter.

mod analysis;
mod assign;
mod cond;
mod node;
mod visit;

#[cfg(test)]
mod cond_test;
#[cfg(test)]
mod visit_test;

pub use analysis::{UnresolvedReferences, VariableUses, UseCount};
pub use assign::Assign;
pub use cond::{Clause, If, falls_through};
pub use node::{Block, Node, Resolution, VarRead};
pub use visit::Visitor;
