//! Trace Output
//!
//! Indented per-target trace lines: one horizontal tab per nesting
//! level, then `[<context>] <message>`.

/// Context used for engine-level diagnostics.
pub const ENGINE_CONTEXT: &str = "mymake";

/// Build a trace line without printing it.
pub fn format_trace(level: usize, context: &str, message: &str) -> String {
    let mut line = String::with_capacity(level + context.len() + message.len() + 3);
    for _ in 0..level {
        line.push('\t');
    }
    line.push('[');
    line.push_str(context);
    line.push_str("] ");
    line.push_str(message);
    line
}

/// Print a trace line at the given nesting level.
pub fn trace_line(level: usize, context: &str, message: &str) {
    println!("{}", format_trace(level, context, message));
}

/// Print an engine-level status line (level 0, `mymake` context).
pub fn status_line(message: &str) {
    trace_line(0, ENGINE_CONTEXT, message);
}
