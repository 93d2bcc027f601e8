//! End-to-end tests driving the compiled binary.
//!
//! Every invocation runs in its own process group so that engine
//! teardown (which signals the whole group) cannot reach the test
//! harness.

use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

const SEARCH_PATH: &str = "/bin:/usr/bin";
const SIGTERM: i32 = 15;

fn write_makefile(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("build.mk");
    std::fs::write(&path, content).unwrap();
    path
}

fn mymake(dir: &Path, makefile: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mymake"));
    cmd.current_dir(dir);
    cmd.env("MYPATH", SEARCH_PATH);
    cmd.arg("-f").arg(makefile);
    cmd.args(args);
    cmd.process_group(0);
    cmd
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_diamond_targets_build_once_in_order() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(
        dir.path(),
        "A: B C\n\techo A\nB: D\n\techo B\nC: D\n\techo C\nD:\n\techo D\n",
    );
    let output = mymake(dir.path(), &mk, &["A"]).output().unwrap();
    assert!(output.status.success());

    let lines = stdout_lines(&output);
    let pos = |needle: &str| {
        lines
            .iter()
            .position(|line| line == needle)
            .unwrap_or_else(|| panic!("missing output line {:?}", needle))
    };
    assert!(pos("D") < pos("B"));
    assert!(pos("B") < pos("C"));
    assert!(pos("C") < pos("A"));
    for needle in ["A", "B", "C", "D"] {
        assert_eq!(lines.iter().filter(|line| *line == needle).count(), 1);
    }
}

#[test]
fn test_default_target_is_first_rule() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "first:\n\techo first\nsecond:\n\techo second\n");
    let output = mymake(dir.path(), &mk, &[]).output().unwrap();
    assert!(output.status.success());

    let lines = stdout_lines(&output);
    assert!(lines.iter().any(|line| line == "first"));
    assert!(!lines.iter().any(|line| line == "second"));
}

#[test]
fn test_pipeline_with_redirection() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("in.txt"), "hello").unwrap();
    let mk = write_makefile(dir.path(), "out.txt:\n\tcat < in.txt | tr a-z A-Z > out.txt\n");
    let output = mymake(dir.path(), &mk, &[]).output().unwrap();
    assert!(output.status.success());

    let produced = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
    assert_eq!(produced, "HELLO");
}

#[test]
fn test_variable_and_automatic_expansion() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "CC=echo\nmain: main.c\n\t$(CC) $@ $<\n");
    let output = mymake(dir.path(), &mk, &["main"]).output().unwrap();
    assert!(output.status.success());

    let lines = stdout_lines(&output);
    assert!(lines.iter().any(|line| line == "main main.c"));
}

#[test]
fn test_pattern_rule_supplies_source_context() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), ".c.o:\n\techo building $<\n");
    let output = mymake(dir.path(), &mk, &["foo.o"]).output().unwrap();
    assert!(output.status.success());

    let lines = stdout_lines(&output);
    assert!(lines.iter().any(|line| line == "building foo.c"));
}

#[test]
fn test_timeout_tears_down_the_build() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "all:\n\tsleep 5\n");

    let start = Instant::now();
    let output = mymake(dir.path(), &mk, &["-t", "1"]).output().unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_secs(4), "took {:?}", elapsed);
    assert_eq!(output.status.signal(), Some(SIGTERM));
    let lines = stdout_lines(&output);
    assert!(lines.iter().any(|line| line.contains("Timeout Reached")));
}

#[test]
fn test_failed_recipe_stops_the_build() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "all: a b\na:\n\tfalse\nb:\n\techo ok\n");
    let output = mymake(dir.path(), &mk, &[]).output().unwrap();

    assert_eq!(output.status.signal(), Some(SIGTERM));
    let lines = stdout_lines(&output);
    assert!(!lines.iter().any(|line| line == "ok"));
    assert!(lines
        .iter()
        .any(|line| line.contains("** Error code: 1, Terminate")));
}

#[test]
fn test_keep_going_continues_past_failure() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "all: a b\na:\n\tfalse\nb:\n\techo ok\n");
    let output = mymake(dir.path(), &mk, &["-k"]).output().unwrap();

    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert!(lines.iter().any(|line| line == "ok"));
    assert!(lines
        .iter()
        .any(|line| line.contains("** Error code: 1, Continue")));
}

#[test]
fn test_interrupt_tears_down_the_build() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "all:\n\tsleep 5\n");
    let mut child = mymake(dir.path(), &mk, &[])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    std::thread::sleep(Duration::from_millis(400));
    let sent = Command::new("/bin/sh")
        .arg("-c")
        .arg(format!("kill -INT {}", child.id()))
        .status()
        .unwrap();
    assert!(sent.success());

    let start = Instant::now();
    let status = child.wait().unwrap();
    assert!(start.elapsed() < Duration::from_secs(4));
    assert_eq!(status.signal(), Some(SIGTERM));
}

#[test]
fn test_sequential_groups_share_working_directory() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("subdir");
    std::fs::create_dir(&target).unwrap();
    let mk = write_makefile(
        dir.path(),
        &format!("all:\n\tcd {}; pwd\n", target.display()),
    );
    let output = mymake(dir.path(), &mk, &[]).output().unwrap();
    assert!(output.status.success());

    let expected = target.canonicalize().unwrap().display().to_string();
    let lines = stdout_lines(&output);
    assert!(
        lines.iter().any(|line| *line == expected),
        "no {:?} in {:?}",
        expected,
        lines
    );
}

#[test]
fn test_print_database_skips_execution() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "CC=echo\nall: a b\n\techo hi\n");
    let output = mymake(dir.path(), &mk, &["-p"]).output().unwrap();
    assert!(output.status.success());

    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("CC = echo"));
    assert!(text.contains("all : a b"));
    assert!(text.contains("\techo hi"));
    // No recipe ran, so no resolved command was echoed.
    assert!(!text.contains("/bin/echo"));
}

#[test]
fn test_trace_output_is_indented_per_level() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "A: B\n\techo A\nB:\n\techo B\n");
    let output = mymake(dir.path(), &mk, &["-d", "A"]).output().unwrap();
    assert!(output.status.success());

    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("DebugInfo:"));
    assert!(text.contains("[A] Making A"));
    assert!(text.contains("\t[B] Making B"));
    assert!(text.contains("[A] Done Making A"));
    assert!(text.contains("[A] Action: echo A"));
}

#[test]
fn test_unknown_target_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "all:\n\techo hi\n");
    let output = mymake(dir.path(), &mk, &["nosuch"]).output().unwrap();

    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert!(lines.iter().any(|line| line == "[mymake] **Target not found"));
}

#[test]
fn test_missing_makefile_fails() {
    let dir = TempDir::new().unwrap();
    let output = mymake(dir.path(), Path::new("/nonexistent/build.mk"), &[])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot read makefile"));
}

#[test]
fn test_unknown_flag_is_an_option_error() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "all:\n");
    let output = mymake(dir.path(), &mk, &["-z"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_multiple_targets_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "all:\n");
    let output = mymake(dir.path(), &mk, &["a", "b"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unset_search_path_is_reported() {
    let dir = TempDir::new().unwrap();
    let mk = write_makefile(dir.path(), "all:\n\techo hi\n");
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mymake"));
    cmd.current_dir(dir.path());
    cmd.env_remove("MYPATH");
    cmd.arg("-f").arg(&mk);
    cmd.process_group(0);
    let output = cmd.output().unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MYPATH environment variable is not set"));
}
