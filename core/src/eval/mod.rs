//! Tree-walking evaluation.

mod env;
mod evaluate;


pub use env::{Environment, Frame};
