pub mod ast;
pub mod binding;
pub mod builtins;
pub mod error;
pub mod eval;
pub mod resolve;
pub mod session;
pub mod typ;
pub mod unit;
pub mod util;
pub mod val;

// Stack-machine lowering and execution
pub mod vm;


pub use error::{CoreError, ErrorKind, error_kind};
pub use session::{ExecMode, Session, SessionOptions};
pub use unit::Unit;
