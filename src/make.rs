//! Make Engine
//!
//! Main entry point for the build engine. Ties together the parser, the
//! dependency driver, and the process orchestrator.

use std::path::Path;

use crate::interpreter::driver::build_target;
use crate::interpreter::types::InterpreterState;
use crate::parser::parser::parse_makefile;
use crate::parser::types::{derive_pattern_rules, Makefile, ParseException};

/// Makefile read when `-f` is not given.
pub const DEFAULT_MAKEFILE: &str = "mymake3.mk";

/// Options for creating a Make engine.
#[derive(Debug, Clone, Default)]
pub struct MakeOptions {
    /// Path of the makefile to read.
    pub makefile: String,
    /// Print the parsed database instead of building (`-p`).
    pub print_database: bool,
    /// Continue with remaining targets after a recipe fails (`-k`).
    pub keep_going: bool,
    /// Emit indented per-target trace lines (`-d`).
    pub trace: bool,
    /// Mask the user interrupt on the driver process (`-i`).
    pub block_interrupt: bool,
    /// Abort the whole build after this many wall-clock seconds (`-t`).
    pub timeout: Option<u32>,
}

/// The build engine: parsed rule database plus the runtime state of one
/// invocation.
#[derive(Debug)]
pub struct Make {
    state: InterpreterState,
}

impl Make {
    /// Parse the configured makefile and build an engine around it.
    pub fn new(options: MakeOptions) -> Result<Self, ParseException> {
        let makefile = parse_makefile(Path::new(&options.makefile))?;
        Ok(Self::with_makefile(makefile, options))
    }

    /// Build an engine from an already parsed makefile.
    pub fn with_makefile(makefile: Makefile, options: MakeOptions) -> Self {
        let pattern_rules = derive_pattern_rules(&makefile.rules);
        Self {
            state: InterpreterState::new(makefile.rules, pattern_rules, makefile.variables, options),
        }
    }

    pub fn options(&self) -> &MakeOptions {
        &self.state.options
    }

    /// The first rule's target, or the empty string when there are no
    /// rules.
    pub fn default_target(&self) -> String {
        self.state
            .rules
            .first()
            .map(|rule| rule.target.clone())
            .unwrap_or_default()
    }

    /// Walk the dependency graph from `target` and execute the recipes
    /// of every reachable rule.
    pub fn build(&mut self, target: &str) {
        self.state.visited.clear();
        build_target(&mut self.state, target, 0, "");
    }

    /// Print parsed variables and rules (`-p`).
    pub fn print_database(&self) {
        for (name, value) in &self.state.variables {
            println!("{} = {}", name, value);
        }
        if self.state.rules.is_empty() {
            println!("No rules found.");
            return;
        }
        for rule in &self.state.rules {
            let mut header = format!("{} :", rule.target);
            for prerequisite in &rule.prerequisites {
                header.push(' ');
                header.push_str(prerequisite);
            }
            println!("{}", header);
            for command in &rule.commands {
                println!("\t{}", command);
            }
        }
    }

    /// Print the option block shown at startup under `-d`.
    pub fn print_debug_stats(&self, target: &str) {
        let options = &self.state.options;
        println!("DebugInfo: ");
        println!("Makefile: {}", options.makefile);
        println!("Target: {}", target);
        println!("Build Rules Database: {}", yes_no(options.print_database));
        println!("Continue on Error: {}", yes_no(options.keep_going));
        println!("Print Debug Info: {}", yes_no(options.trace));
        println!("Block SIGINT: {}", yes_no(options.block_interrupt));
        match options.timeout {
            Some(seconds) => println!("Timeout Seconds: {}", seconds),
            None => println!("Timeout Seconds: None"),
        }
        println!();
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}
