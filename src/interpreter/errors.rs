//! Recipe Errors
//!
//! Failures raised while executing one recipe line. These never cross
//! process boundaries as values: a recipe worker reports them on stderr
//! and exits non-zero, and the driver sees only the exit status.

use nix::errno::Errno;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("cannot open redirection file '{path}': {source}")]
    Redirection {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot write redirection output: {0}")]
    Output(std::io::Error),

    #[error("pipeline stage '{program}' exited with status {status}")]
    Stage { program: String, status: i32 },

    #[error("empty pipeline stage")]
    EmptyStage,

    #[error("'cd' requires exactly one argument (directory)")]
    ChdirUsage,

    #[error("cannot change directory to '{path}': {source}")]
    Chdir {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot create pipe: {0}")]
    Pipe(Errno),

    #[error("cannot fork stage worker: {0}")]
    Fork(Errno),

    #[error("cannot wait for stage worker: {0}")]
    Wait(Errno),
}
