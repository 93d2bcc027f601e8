//! mymake - a minimal make-style build engine
//!
//! This library parses a declarative build specification, walks the
//! dependency graph for a requested target, and executes recipe lines as
//! process pipelines with redirection and coordinated signal teardown.

pub mod interpreter;
pub mod make;
pub mod parser;

pub use interpreter::driver::build_target;
pub use interpreter::types::InterpreterState;
pub use make::{Make, MakeOptions};
pub use parser::{parse_makefile, Makefile, ParseException, PatternRule, Rule};
