//! Token Expansion
//!
//! One-pass expansion of `$NAME`, `$(NAME)`, `$@` and `$<` inside recipe
//! tokens. At most one reference is substituted per token and the result
//! is never re-expanded.

use indexmap::IndexMap;

/// Expand the first `$` reference in `token`.
///
/// `$@` becomes the current target, `$<` the contextual prerequisite,
/// any other name its bound value or the empty string. A token without
/// `$`, or ending in a bare `$`, is returned unchanged.
pub fn expand_token(
    token: &str,
    target: &str,
    context: &str,
    variables: &IndexMap<String, String>,
) -> String {
    let dollar = match token.find('$') {
        Some(pos) => pos,
        None => return token.to_string(),
    };
    let start = dollar + 1;
    if start >= token.len() {
        return token.to_string();
    }

    // `$(NAME)` takes the span up to the closing paren; the bare form
    // runs to the next `)` or the end of the token.
    let (name, end) = if token.as_bytes()[start] == b'(' {
        match token[start..].find(')') {
            Some(rel) => (&token[start + 1..start + rel], start + rel + 1),
            None => (&token[start + 1..], token.len()),
        }
    } else {
        match token[start..].find(')') {
            Some(rel) => (&token[start..start + rel], start + rel + 1),
            None => (&token[start..], token.len()),
        }
    };

    let value = match name {
        "@" => target,
        "<" => context,
        _ => variables.get(name).map(String::as_str).unwrap_or(""),
    };

    format!("{}{}{}", &token[..dollar], value, &token[end..])
}

/// Whitespace-split `text`, expand each token, and drop tokens that
/// expand to nothing.
pub fn expand_arguments(
    text: &str,
    target: &str,
    context: &str,
    variables: &IndexMap<String, String>,
) -> Vec<String> {
    text.split_whitespace()
        .map(|token| expand_token(token, target, context, variables))
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_automatic_target_and_prerequisite() {
        let variables = vars(&[]);
        assert_eq!(expand_token("$@", "main", "main.c", &variables), "main");
        assert_eq!(expand_token("$<", "main", "main.c", &variables), "main.c");
    }

    #[test]
    fn test_parenthesized_variable() {
        let variables = vars(&[("CC", "gcc")]);
        assert_eq!(expand_token("$(CC)", "t", "p", &variables), "gcc");
        assert_eq!(expand_token("-x$(CC)y", "t", "p", &variables), "-xgccy");
    }

    #[test]
    fn test_bare_variable_runs_to_end_of_token() {
        let variables = vars(&[("CC", "gcc")]);
        assert_eq!(expand_token("$CC", "t", "p", &variables), "gcc");
    }

    #[test]
    fn test_unknown_variable_expands_to_empty() {
        let variables = vars(&[]);
        assert_eq!(expand_token("$(NOPE)", "t", "p", &variables), "");
        assert_eq!(expand_token("a$(NOPE)b", "t", "p", &variables), "ab");
    }

    #[test]
    fn test_expansion_is_one_pass() {
        let variables = vars(&[("X", "$Y"), ("Y", "z")]);
        assert_eq!(expand_token("$X", "t", "p", &variables), "$Y");
    }

    #[test]
    fn test_only_first_reference_is_expanded() {
        let variables = vars(&[("A", "1"), ("B", "2")]);
        assert_eq!(expand_token("$(A)$(B)", "t", "p", &variables), "1$(B)");
    }

    #[test]
    fn test_token_without_dollar_unchanged() {
        let variables = vars(&[]);
        assert_eq!(expand_token("-Wall", "t", "p", &variables), "-Wall");
        assert_eq!(expand_token("cc$", "t", "p", &variables), "cc$");
    }

    #[test]
    fn test_unterminated_paren_form() {
        let variables = vars(&[("CC", "gcc")]);
        assert_eq!(expand_token("$(CC", "t", "p", &variables), "gcc");
    }

    #[test]
    fn test_expand_arguments_drops_empty_tokens() {
        let variables = vars(&[("CC", "echo")]);
        let argv = expand_arguments("$(CC) $@ $< $(NOPE)", "main", "main.c", &variables);
        assert_eq!(argv, vec!["echo", "main", "main.c"]);
    }
}
