//! Dependency Driver
//!
//! Depth-first walk of the target graph with visited-memoization.
//! Prerequisites are built before the dependent's recipes run; targets
//! with no explicit rule fall back to pattern-rule matching.

use crate::interpreter::pipeline_execution::exec_recipe;
use crate::interpreter::trace::{status_line, trace_line};
use crate::interpreter::types::InterpreterState;
use crate::parser::types::Rule;

/// Build `target`, recursing through its prerequisites first.
///
/// `parent` carries the prerequisite context established by a pattern
/// match (or by the caller); it is empty at the top of the walk.
pub fn build_target(state: &mut InterpreterState, target: &str, level: usize, parent: &str) {
    let pattern_shaped = target.starts_with('.') || target.starts_with('%');
    // Pattern-shaped targets trace under their caller's context and are
    // never memoized.
    let display = if pattern_shaped { parent } else { target };
    if !pattern_shaped {
        if state.visited.contains(target) {
            return;
        }
        state.visited.insert(target.to_string());
    }

    if let Some(rule) = state.find_rule(target).cloned() {
        if state.options.trace {
            trace_line(level, display, &format!("Making {}", target));
            trace_rule(&rule, level);
        }

        for prerequisite in &rule.prerequisites {
            if !state.visited.contains(prerequisite) {
                build_target(state, prerequisite, level + 1, target);
            }
        }

        let context = recipe_context(&rule, parent, target);
        for command in &rule.commands {
            if state.options.trace {
                trace_line(level, display, &format!("Action: {}", command));
            }
            exec_recipe(state, command, &rule.target, &context);
        }

        if state.options.trace {
            trace_line(level, display, &format!("Done Making {}", target));
        }
        return;
    }

    // Source files have no rules of their own.
    if target.contains(".c") || target.contains(".h") {
        return;
    }

    if let Some((pattern_target, context)) = match_pattern(state, target) {
        build_target(state, &pattern_target, level + 1, &context);
        return;
    }

    status_line("**Target not found");
}

/// The value `$<` expands to inside this rule's recipes: the context
/// inherited from a pattern match when one was established, otherwise
/// the rule's first prerequisite, otherwise the target itself.
pub(crate) fn recipe_context(rule: &Rule, parent: &str, target: &str) -> String {
    if !parent.is_empty() {
        parent.to_string()
    } else if let Some(first) = rule.prerequisites.first() {
        first.clone()
    } else {
        target.to_string()
    }
}

/// Find the first pattern rule whose extension set contains the target's
/// last extension fragment. Returns the pattern's target together with
/// the derived prerequisite context (`stem.first_extension`).
pub(crate) fn match_pattern(state: &InterpreterState, target: &str) -> Option<(String, String)> {
    let separator = |c: char| c == '.' || c == '%';
    let dot = target.find(separator)?;
    let stem = &target[..dot];
    let extension = target.rsplit(separator).next().unwrap_or("");
    if extension.is_empty() {
        return None;
    }

    for pattern in &state.pattern_rules {
        if pattern.extensions.iter().any(|ext| ext == extension) {
            let context = format!("{}.{}", stem, pattern.extensions[0]);
            return Some((pattern.target.clone(), context));
        }
    }
    None
}

fn trace_rule(rule: &Rule, level: usize) {
    trace_line(level, &rule.target, &format!("Target for {}", rule.target));
    if !rule.prerequisites.is_empty() {
        trace_line(
            level,
            &rule.target,
            &format!("Prerequisites: {}", rule.prerequisites.join(" ")),
        );
    }
    println!();
}
