//! Pipeline Execution
//!
//! Process orchestration for recipe lines. The driver forks one recipe
//! worker per line and waits for it; inside the worker each pipeline
//! stage is forked, wired to its neighbours with a pipe, and waited for
//! before the next stage starts. A failure anywhere exits the worker
//! non-zero; the driver then either continues (`-k`) or tears the whole
//! process tree down.

use std::env;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::fd::{FromRawFd, IntoRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::process;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{close, dup2, execv, fork, pipe, ForkResult, Pid};

use crate::interpreter::errors::RecipeError;
use crate::interpreter::recipe::build_recipe_plan;
use crate::interpreter::signals;
use crate::interpreter::trace::status_line;
use crate::interpreter::types::{CommandGroup, InterpreterState, Stage};

/// Mode bits for output-redirection files: owner read/write, group and
/// other read.
const OUTPUT_FILE_MODE: u32 = 0o644;

/// Execute one recipe line in a freshly forked recipe worker and wait
/// for it. On a non-zero exit the build either continues (`-k`) or the
/// whole tree is torn down.
pub fn exec_recipe(state: &mut InterpreterState, line: &str, target: &str, context: &str) {
    check_cancellation(state);

    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let code = run_recipe_worker(state, line, target, context);
            process::exit(code);
        }
        Ok(ForkResult::Parent { child }) => {
            state.workers.add(child);
            wait_for_worker(state, child);
        }
        Err(err) => {
            eprintln!("mymake: cannot fork recipe worker: {}", err);
        }
    }
}

/// Kill everything still registered, then deliver the polite termination
/// signal to the engine's own process group. The group signal also
/// sweeps any stage the driver's registry copy cannot see.
pub fn teardown(state: &mut InterpreterState) -> ! {
    let trace = state.options.trace;
    state.stages.kill_all(Signal::SIGKILL, trace);
    state.workers.kill_all(Signal::SIGKILL, trace);
    let _ = kill(Pid::from_raw(0), Signal::SIGTERM);
    process::exit(1);
}

/// React to a pending interrupt or elapsed alarm. Does not return when
/// one is pending.
fn check_cancellation(state: &mut InterpreterState) {
    if signals::timed_out() {
        status_line("Timeout Reached");
        teardown(state);
    }
    if signals::interrupted() {
        status_line("Interrupt");
        teardown(state);
    }
}

fn wait_for_worker(state: &mut InterpreterState, child: Pid) {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(pid, code)) => {
                state.workers.remove(pid);
                if code != 0 {
                    if state.options.keep_going {
                        status_line(&format!("** Error code: {}, Continue", code));
                    } else {
                        status_line(&format!("** Error code: {}, Terminate", code));
                        teardown(state);
                    }
                }
                return;
            }
            Ok(WaitStatus::Signaled(pid, _, _)) => {
                // A worker killed from outside (interrupt under `-i`)
                // does not fail the build by itself.
                state.workers.remove(pid);
                return;
            }
            Ok(_) => continue,
            Err(Errno::EINTR) => {
                check_cancellation(state);
            }
            Err(_) => {
                state.workers.remove(child);
                return;
            }
        }
    }
}

/// Body of a recipe worker process. Never shares control flow with the
/// driver: the caller exits with the returned code.
fn run_recipe_worker(state: &mut InterpreterState, line: &str, target: &str, context: &str) -> i32 {
    signals::reset_flags();
    state.stages.clear();
    if state.options.block_interrupt {
        let _ = signals::restore_default_interrupt();
    }

    let plan = match build_recipe_plan(line, target, context, &state.variables) {
        Ok(plan) => plan,
        Err(err) => {
            eprintln!("mymake: {}", err);
            return 1;
        }
    };

    let trace = state.options.trace;
    for group in &plan.groups {
        if let Err(err) = run_group(state, group) {
            eprintln!("mymake: {}", err);
            state.stages.kill_all(Signal::SIGKILL, trace);
            return 1;
        }
    }
    state.stages.kill_all(Signal::SIGKILL, trace);
    0
}

/// Run the stages of one command group left to right, threading pipe
/// file descriptors between them. Each stage is waited for before the
/// next one is forked.
fn run_group(state: &mut InterpreterState, group: &CommandGroup) -> Result<(), RecipeError> {
    let trace = state.options.trace;
    let block_interrupt = state.options.block_interrupt;
    let last = group.stages.len().saturating_sub(1);

    // Input source for the next stage, read end of the final pipe, and
    // the output file of the final stage, if any.
    let mut input_fd: Option<RawFd> = None;
    let mut last_read: Option<RawFd> = None;
    let mut tail_out: Option<RawFd> = None;

    for (index, stage) in group.stages.iter().enumerate() {
        match stage {
            Stage::ChangeDir { argv, program } => {
                echo_resolved(program, argv);
                if argv.len() != 2 {
                    close_quietly(input_fd.take());
                    return Err(RecipeError::ChdirUsage);
                }
                if let Err(source) = env::set_current_dir(&argv[1]) {
                    close_quietly(input_fd.take());
                    return Err(RecipeError::Chdir {
                        path: argv[1].clone(),
                        source,
                    });
                }
            }
            Stage::Exec {
                argv,
                program,
                input,
                output,
            } => {
                if let Some(path) = input {
                    match File::open(path) {
                        Ok(file) => {
                            close_quietly(input_fd.take());
                            input_fd = Some(file.into_raw_fd());
                        }
                        Err(source) => {
                            close_quietly(input_fd.take());
                            return Err(RecipeError::Redirection {
                                path: path.clone(),
                                source,
                            });
                        }
                    }
                }

                let out_fd = match output {
                    Some(path) => match OpenOptions::new()
                        .write(true)
                        .create(true)
                        .truncate(true)
                        .mode(OUTPUT_FILE_MODE)
                        .open(path)
                    {
                        Ok(file) => Some(file.into_raw_fd()),
                        Err(source) => {
                            close_quietly(input_fd.take());
                            return Err(RecipeError::Redirection {
                                path: path.clone(),
                                source,
                            });
                        }
                    },
                    None => None,
                };

                echo_resolved(program, argv);

                let (pipe_read, pipe_write) = match pipe() {
                    Ok(ends) => ends,
                    Err(err) => {
                        close_quietly(input_fd.take());
                        close_quietly(out_fd);
                        return Err(RecipeError::Pipe(err));
                    }
                };
                let pipe_read = pipe_read.into_raw_fd();
                let pipe_write = pipe_write.into_raw_fd();

                match unsafe { fork() } {
                    Ok(ForkResult::Child) => stage_child(
                        input_fd,
                        out_fd,
                        pipe_read,
                        pipe_write,
                        index == last,
                        program,
                        argv,
                        block_interrupt,
                    ),
                    Ok(ForkResult::Parent { child }) => {
                        state.stages.add(child);
                        let _ = close(pipe_write);

                        let status = match wait_for_stage(state, child) {
                            Ok(status) => status,
                            Err(err) => {
                                close_quietly(input_fd.take());
                                close_quietly(Some(pipe_read));
                                close_quietly(out_fd);
                                return Err(err);
                            }
                        };
                        if status != 0 {
                            close_quietly(input_fd.take());
                            close_quietly(Some(pipe_read));
                            close_quietly(out_fd);
                            state.stages.kill_all(Signal::SIGKILL, trace);
                            return Err(RecipeError::Stage {
                                program: program.clone(),
                                status,
                            });
                        }

                        close_quietly(input_fd.take());
                        if index < last {
                            input_fd = Some(pipe_read);
                            close_quietly(out_fd);
                        } else {
                            last_read = Some(pipe_read);
                            tail_out = out_fd;
                        }
                    }
                    Err(err) => {
                        close_quietly(input_fd.take());
                        close_quietly(Some(pipe_read));
                        close_quietly(Some(pipe_write));
                        close_quietly(out_fd);
                        return Err(RecipeError::Fork(err));
                    }
                }
            }
        }
    }

    close_quietly(input_fd.take());
    if let Some(read_fd) = last_read {
        drain_tail(read_fd, tail_out)?;
    }
    Ok(())
}

/// Wait synchronously for one pipeline stage. An interrupt or alarm
/// delivered while waiting kills the remaining stages and exits the
/// worker.
fn wait_for_stage(state: &mut InterpreterState, child: Pid) -> Result<i32, RecipeError> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(pid, code)) => {
                state.stages.remove(pid);
                return Ok(code);
            }
            Ok(WaitStatus::Signaled(pid, _, _)) => {
                state.stages.remove(pid);
                return Ok(128);
            }
            Ok(_) => continue,
            Err(Errno::EINTR) => {
                if signals::interrupted() || signals::timed_out() {
                    let trace = state.options.trace;
                    state.stages.kill_all(Signal::SIGKILL, trace);
                    process::exit(1);
                }
            }
            Err(err) => return Err(RecipeError::Wait(err)),
        }
    }
}

/// Body of a stage worker: wire redirections, then replace the process
/// image. Any failure exits non-zero.
fn stage_child(
    input_fd: Option<RawFd>,
    out_fd: Option<RawFd>,
    pipe_read: RawFd,
    pipe_write: RawFd,
    is_last: bool,
    program: &str,
    argv: &[String],
    block_interrupt: bool,
) -> ! {
    if block_interrupt {
        let _ = signals::restore_default_interrupt();
    }

    if let Some(fd) = input_fd {
        if dup2(fd, libc::STDIN_FILENO).is_err() {
            process::exit(1);
        }
        let _ = close(fd);
    }
    if let Some(fd) = out_fd {
        if dup2(fd, libc::STDOUT_FILENO).is_err() {
            process::exit(1);
        }
        let _ = close(fd);
    } else if !is_last && dup2(pipe_write, libc::STDOUT_FILENO).is_err() {
        process::exit(1);
    }
    let _ = close(pipe_write);
    let _ = close(pipe_read);

    let prog = match CString::new(program) {
        Ok(prog) => prog,
        Err(_) => {
            eprintln!("mymake: cannot execute '{}': invalid program name", program);
            process::exit(127);
        }
    };
    let mut args = Vec::with_capacity(argv.len());
    args.push(prog.clone());
    for arg in argv.iter().skip(1) {
        match CString::new(arg.as_str()) {
            Ok(arg) => args.push(arg),
            Err(_) => {
                eprintln!("mymake: cannot execute '{}': invalid argument", program);
                process::exit(127);
            }
        }
    }

    if let Err(err) = execv(&prog, &args) {
        eprintln!("mymake: cannot execute '{}': {}", program, err);
    }
    process::exit(127);
}

/// Drain the final pipe until EOF, appending what arrives to the output
/// redirection file when one was given.
fn drain_tail(read_fd: RawFd, out_fd: Option<RawFd>) -> Result<(), RecipeError> {
    let mut source = unsafe { File::from_raw_fd(read_fd) };
    let mut sink = out_fd.map(|fd| unsafe { File::from_raw_fd(fd) });
    let mut buffer = [0u8; 4096];
    loop {
        match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(count) => {
                if let Some(out) = sink.as_mut() {
                    out.write_all(&buffer[..count]).map_err(RecipeError::Output)?;
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(RecipeError::Output(err)),
        }
    }
    Ok(())
}

fn close_quietly(fd: Option<RawFd>) {
    if let Some(fd) = fd {
        let _ = close(fd);
    }
}

/// Echo a stage before launching it, the program path first.
fn echo_resolved(program: &str, argv: &[String]) {
    let mut words = Vec::with_capacity(argv.len());
    words.push(program.to_string());
    words.extend(argv.iter().skip(1).cloned());
    println!("{}", words.join(" "));
}
