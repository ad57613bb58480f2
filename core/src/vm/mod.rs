//! Compiled mode: lowering to stack code and executing it.
//!
//! The emitter appends to an [`InstructionStream`], which resolves labels into
//! relative jumps when finished. [`Vm`] runs the resulting [`CompiledUnit`]
//! against the same [`Environment`](crate::eval::Environment) the evaluator uses.

mod bytecode;
mod emit;
mod exec;
mod stream;

#[cfg(test)]
mod emit_test;

pub use bytecode::{CompiledUnit, Op};
pub use exec::Vm;
pub use stream::{EmitOptions, InstructionStream, Label};
