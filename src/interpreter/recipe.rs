//! Recipe Interpreter
//!
//! Decomposes one recipe line into a pipeline plan: `;` separates
//! command groups, `|` separates the stages of a group, and `<` / `>`
//! inside a stage name input and output redirection files. The remaining
//! text is tokenized, expanded, and resolved into an argument vector.

use indexmap::IndexMap;

use crate::interpreter::command_resolution::{resolve_command, resolve_input_file};
use crate::interpreter::errors::RecipeError;
use crate::interpreter::expansion::expand_arguments;
use crate::interpreter::types::{CommandGroup, RecipePlan, Stage};

/// Split a recipe line on `;` into trimmed, non-empty command groups.
pub fn split_command_groups(line: &str) -> Vec<String> {
    line.split(';')
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a command group on `|` into its pipeline stages, left to right.
/// Stage text is not trimmed; an interior empty stage is kept so it can
/// be rejected later.
pub fn split_pipeline(group: &str) -> Vec<String> {
    let mut stages: Vec<String> = Vec::new();
    let mut rest = group;
    while let Some(pos) = rest.find('|') {
        stages.push(rest[..pos].to_string());
        rest = &rest[pos + 1..];
    }
    if !rest.is_empty() {
        stages.push(rest.to_string());
    }
    stages
}

/// Strip redirections from a stage, returning the remaining command text
/// plus the input and output file names.
///
/// The output file is recognized first so `cmd < in > out` yields both
/// names. A stage containing the token `$<` never takes input
/// redirection; the `<` belongs to the expansion.
pub fn extract_redirections(stage: &str) -> (String, Option<String>, Option<String>) {
    let mut rest = stage.to_string();

    let mut output = None;
    if let Some(pos) = rest.find('>') {
        output = Some(rest[pos + 1..].trim().to_string());
        rest.truncate(pos);
    }

    let mut input = None;
    if !rest.contains("$<") {
        if let Some(pos) = rest.find('<') {
            input = Some(rest[pos + 1..].trim().to_string());
            rest.truncate(pos);
        }
    }

    (rest, input, output)
}

/// Build the execution plan for one recipe line.
pub fn build_recipe_plan(
    line: &str,
    target: &str,
    context: &str,
    variables: &IndexMap<String, String>,
) -> Result<RecipePlan, RecipeError> {
    let mut groups = Vec::new();
    for group_text in split_command_groups(line) {
        let mut stages = Vec::new();
        for stage_text in split_pipeline(&group_text) {
            let (rest, input, output) = extract_redirections(&stage_text);
            let argv = expand_arguments(&rest, target, context, variables);
            if argv.is_empty() {
                return Err(RecipeError::EmptyStage);
            }
            let program = resolve_command(&argv[0]);
            // A stage opening with `cd` runs in the recipe worker itself.
            if rest.starts_with("cd") {
                stages.push(Stage::ChangeDir { argv, program });
            } else {
                let input = input.map(|file| resolve_input_file(&file));
                stages.push(Stage::Exec {
                    argv,
                    program,
                    input,
                    output,
                });
            }
        }
        if !stages.is_empty() {
            groups.push(CommandGroup { stages });
        }
    }
    Ok(RecipePlan { groups })
}
