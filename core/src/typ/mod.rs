mod numeric;
mod types;


pub use numeric::{NumericClass, NumericHierarchy};
pub use types::{Type, can_assign};
