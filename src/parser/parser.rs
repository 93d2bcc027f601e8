//! Makefile Parser
//!
//! Line-oriented parser for the makefile grammar. Each trimmed line is
//! classified, first match wins:
//!
//!   - blank or starting with `#`: ignored
//!   - contains `=`: variable binding, split at the first `=`
//!   - contains `:`: rule header, closing any pending rule
//!   - anything else: a recipe command of the pending rule
//!
//! Names and values around `=` are kept verbatim, including surrounding
//! spaces. Malformed lines may produce odd rules but never abort.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::parser::types::{Makefile, ParseException, Rule};

/// Parse the makefile at `path`. Fails only when the file cannot be
/// opened or read.
pub fn parse_makefile(path: &Path) -> Result<Makefile, ParseException> {
    let file = File::open(path).map_err(|source| ParseException {
        path: path.display().to_string(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut makefile = Makefile::default();
    let mut pending: Option<Rule> = None;
    for line in reader.lines() {
        let line = line.map_err(|source| ParseException {
            path: path.display().to_string(),
            source,
        })?;
        parse_line(&line, &mut makefile, &mut pending);
    }
    close_pending(&mut makefile, &mut pending);
    Ok(makefile)
}

/// Parse makefile text already held in memory.
pub fn parse_makefile_str(input: &str) -> Makefile {
    let mut makefile = Makefile::default();
    let mut pending: Option<Rule> = None;
    for line in input.lines() {
        parse_line(line, &mut makefile, &mut pending);
    }
    close_pending(&mut makefile, &mut pending);
    makefile
}

fn parse_line(raw: &str, makefile: &mut Makefile, pending: &mut Option<Rule>) {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return;
    }

    if let Some(pos) = line.find('=') {
        let name = &line[..pos];
        let value = &line[pos + 1..];
        makefile.variables.insert(name.to_string(), value.to_string());
        return;
    }

    if let Some(pos) = line.find(':') {
        close_pending(makefile, pending);
        let target = line[..pos].to_string();
        let prerequisites = line[pos + 1..]
            .split_whitespace()
            .map(str::to_string)
            .collect();
        *pending = Some(Rule {
            target,
            prerequisites,
            commands: Vec::new(),
        });
        return;
    }

    // A bare command line before any rule header has nothing to attach to
    // and is dropped.
    if let Some(rule) = pending.as_mut() {
        rule.commands.push(line.to_string());
    }
}

fn close_pending(makefile: &mut Makefile, pending: &mut Option<Rule>) {
    if let Some(rule) = pending.take() {
        if !rule.target.is_empty() {
            makefile.rules.push(rule);
        }
    }
}
