pub mod slots;


pub use slots::{Decl, FrameLayout, Resolver};
