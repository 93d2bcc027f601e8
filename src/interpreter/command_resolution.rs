//! Command Resolution
//!
//! Locates executables and input-redirection files through the
//! colon-separated `MYPATH` environment variable. Absolute paths pass
//! through untouched; an unresolvable name falls back to itself so the
//! failure surfaces at exec or open time.

use std::env;
use std::sync::Once;

use nix::unistd::{access, AccessFlags};

/// Environment variable holding the search path.
pub const PATH_VAR: &str = "MYPATH";

static UNSET_WARNING: Once = Once::new();

/// Split a search path into its directories, dropping empty entries.
pub fn split_search_path(path_env: &str) -> Vec<&str> {
    path_env.split(':').filter(|dir| !dir.is_empty()).collect()
}

/// Join a directory and a file name.
pub fn build_candidate(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Search `path_env` for `name`, returning the first candidate that
/// exists and is accessible.
pub fn search_in_path(path_env: &str, name: &str) -> Option<String> {
    for dir in split_search_path(path_env) {
        let candidate = build_candidate(dir, name);
        if access(candidate.as_str(), AccessFlags::F_OK).is_ok() {
            return Some(candidate);
        }
    }
    None
}

fn search(name: &str) -> Option<String> {
    match env::var(PATH_VAR) {
        Ok(path_env) => search_in_path(&path_env, name),
        Err(_) => {
            UNSET_WARNING.call_once(|| {
                eprintln!("mymake: {} environment variable is not set", PATH_VAR);
            });
            None
        }
    }
}

/// Resolve a program name for exec. Absolute names are used as-is;
/// otherwise the first `MYPATH` hit wins, and an unresolved name is
/// returned bare so exec fails downstream.
pub fn resolve_command(program: &str) -> String {
    if program.starts_with('/') {
        return program.to_string();
    }
    search(program).unwrap_or_else(|| program.to_string())
}

/// Resolve an input-redirection file with the same algorithm as command
/// lookup.
pub fn resolve_input_file(file: &str) -> String {
    if file.starts_with('/') {
        return file.to_string();
    }
    search(file).unwrap_or_else(|| file.to_string())
}
