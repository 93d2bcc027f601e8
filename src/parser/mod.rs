//! Parser module
//!
//! This module contains the makefile parser and the rule database types.

pub mod parser;
pub mod types;

pub use parser::{parse_makefile, parse_makefile_str};
pub use types::{derive_pattern_rules, split_pattern_tokens, Makefile, ParseException, PatternRule, Rule};
