pub mod ast;
pub mod env;
pub mod error;
pub mod evaluator;
mod limits;
pub mod object;
pub mod parser;
pub mod repl;

pub use env::{Env, Environment};
pub use error::{Error, ParseError, ShellResult};
pub use evaluator::{eval, Evaluator};
pub use object::Object;
pub use parser::Parser;
pub use repl::{interpret, run_source, Outcome, Repl};
