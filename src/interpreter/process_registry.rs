//! Process Registry
//!
//! Ordered set of live child pids. The engine keeps two: one for recipe
//! workers and one for pipeline stages. A pid is removed as soon as its
//! exit status is reaped, so teardown only ever signals processes that
//! are still live.

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::interpreter::trace::status_line;

#[derive(Debug, Default)]
pub struct ProcessRegistry {
    pids: Vec<Pid>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self { pids: Vec::new() }
    }

    /// Record a freshly forked child.
    pub fn add(&mut self, pid: Pid) {
        self.pids.push(pid);
    }

    /// Remove a reaped child.
    pub fn remove(&mut self, pid: Pid) {
        self.pids.retain(|p| *p != pid);
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    pub fn clear(&mut self) {
        self.pids.clear();
    }

    /// Signal every recorded pid and empty the registry. Kill errors are
    /// ignored: a child may have died between reap and signal.
    pub fn kill_all(&mut self, signal: Signal, trace: bool) {
        for pid in self.pids.drain(..) {
            if trace {
                status_line(&format!("Killing child PID: {}", pid));
            }
            let _ = kill(pid, signal);
        }
    }
}
