//! Interpreter Types
//!
//! The engine state threaded through the dependency walk, and the
//! pipeline plan a recipe line is decomposed into before execution.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::interpreter::process_registry::ProcessRegistry;
use crate::make::MakeOptions;
use crate::parser::types::{PatternRule, Rule};

/// All mutable engine state. Owned by the driver process; recipe workers
/// inherit a copy at fork time and never mutate shared data.
#[derive(Debug)]
pub struct InterpreterState {
    /// Explicit rules in declaration order. Read-only after parsing.
    pub rules: Vec<Rule>,
    /// Pattern rules derived from the rule table, declaration order.
    pub pattern_rules: Vec<PatternRule>,
    /// Variable bindings. Expansion is lazy and one-pass.
    pub variables: IndexMap<String, String>,
    /// Targets already expanded during the current walk. Pattern-shaped
    /// targets (leading `.` or `%`) are never recorded here.
    pub visited: HashSet<String>,
    /// Live recipe workers, one per executing recipe line.
    pub workers: ProcessRegistry,
    /// Live pipeline stages. Populated only inside a recipe worker.
    pub stages: ProcessRegistry,
    pub options: MakeOptions,
}

impl InterpreterState {
    pub fn new(
        rules: Vec<Rule>,
        pattern_rules: Vec<PatternRule>,
        variables: IndexMap<String, String>,
        options: MakeOptions,
    ) -> Self {
        Self {
            rules,
            pattern_rules,
            variables,
            visited: HashSet::new(),
            workers: ProcessRegistry::new(),
            stages: ProcessRegistry::new(),
            options,
        }
    }

    /// First rule whose target equals `target`, in declaration order.
    pub fn find_rule(&self, target: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.target == target)
    }
}

/// A fully resolved recipe line: `;`-separated command groups, each a
/// pipeline of stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipePlan {
    pub groups: Vec<CommandGroup>,
}

/// One `;`-separated segment of a recipe line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGroup {
    pub stages: Vec<Stage>,
}

/// One `|`-separated segment of a command group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Forked stage: exec `program` with `argv`, with optional input and
    /// output file redirections.
    Exec {
        /// Expanded argument vector; the first entry is the word the
        /// program was named by in the recipe.
        argv: Vec<String>,
        /// Resolved program path handed to exec.
        program: String,
        /// Input redirection file, already resolved through the search
        /// path.
        input: Option<String>,
        /// Output redirection file, created relative to the worker's
        /// working directory.
        output: Option<String>,
    },
    /// Directory change performed inside the recipe worker itself. The
    /// resolved program name is carried for the command echo.
    ChangeDir { argv: Vec<String>, program: String },
}
