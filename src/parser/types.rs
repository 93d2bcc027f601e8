//! Parser Types
//!
//! The rule database produced by parsing a makefile: explicit rules,
//! variable bindings, and the pattern rules derived from rule targets
//! shaped like `.c.o` or `%.o`.

use indexmap::IndexMap;
use thiserror::Error;

/// A single explicit rule: a target, its prerequisites, and its recipe.
///
/// Recipe lines are stored verbatim; variable expansion happens per token
/// at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rule {
    pub target: String,
    pub prerequisites: Vec<String>,
    pub commands: Vec<String>,
}

/// A pattern rule derived from a rule whose target is built from
/// `.ext` or `%.ext` fragments.
///
/// Used only when no explicit rule matches a requested target; the first
/// pattern rule (in declaration order) whose extension set contains the
/// target's extension wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    /// Target name of the defining rule (e.g. `.c.o`).
    pub target: String,
    /// Extensions recognized by this pattern, in declaration order.
    pub extensions: Vec<String>,
    pub prerequisites: Vec<String>,
    pub commands: Vec<String>,
}

/// Parsed contents of a makefile: rules in declaration order plus
/// variable bindings.
///
/// The first rule's target is the default build target.
#[derive(Debug, Clone, Default)]
pub struct Makefile {
    pub rules: Vec<Rule>,
    pub variables: IndexMap<String, String>,
}

/// Raised when the makefile itself cannot be read. The grammar is
/// tolerant; only I/O failures abort parsing.
#[derive(Debug, Error)]
#[error("cannot read makefile '{path}': {source}")]
pub struct ParseException {
    pub path: String,
    pub source: std::io::Error,
}

/// Split a target name into fragments, keeping `.` and `%` as their own
/// tokens: `.c.o` becomes `[".", "c", ".", "o"]`.
pub fn split_pattern_tokens(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in name.chars() {
        if ch == '.' || ch == '%' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(ch.to_string());
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Derive pattern rules from the rule table.
///
/// A rule becomes a pattern rule when its target name parses as one or
/// more leading `.ext` or `%.ext` fragments. The grammar is deliberately
/// narrow: anything else stops the scan, and a rule with no recognized
/// fragments stays a plain rule.
pub fn derive_pattern_rules(rules: &[Rule]) -> Vec<PatternRule> {
    let mut pattern_rules = Vec::new();
    for rule in rules {
        let mut tokens = split_pattern_tokens(&rule.target);
        let mut extensions = Vec::new();
        while tokens.len() > 1 {
            if tokens[0] == "." {
                extensions.push(tokens[1].clone());
                let end = tokens.len().min(3);
                tokens.drain(1..end);
            } else if tokens[0] == "%" && tokens[1] == "." {
                if tokens.len() < 3 {
                    break;
                }
                extensions.push(tokens[2].clone());
                let end = tokens.len().min(4);
                tokens.drain(1..end);
            } else {
                break;
            }
        }
        if !extensions.is_empty() {
            pattern_rules.push(PatternRule {
                target: rule.target.clone(),
                extensions,
                prerequisites: rule.prerequisites.clone(),
                commands: rule.commands.clone(),
            });
        }
    }
    pattern_rules
}
