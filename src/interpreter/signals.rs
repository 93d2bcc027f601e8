//! Signal Wiring
//!
//! Interrupt and alarm handlers set process-wide atomic flags and nothing
//! else; all teardown logic runs in normal control flow at the wait
//! sites. Handlers are installed without SA_RESTART so a blocked
//! `waitpid` returns EINTR and the caller can consult the flags.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{sigaction, sigprocmask, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use nix::unistd::alarm;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static TIMED_OUT: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_interrupt(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::Relaxed);
}

extern "C" fn handle_alarm(_signal: libc::c_int) {
    TIMED_OUT.store(true, Ordering::Relaxed);
}

/// Install the driver's signal dispositions.
///
/// With `block_interrupt`, SIGINT is masked on the calling process
/// instead of handled; recipe workers later restore the default
/// disposition for themselves, so an interrupt kills only the children.
/// A positive `timeout` arms the wall-clock alarm.
pub fn install(block_interrupt: bool, timeout: Option<u32>) -> nix::Result<()> {
    if block_interrupt {
        let mut mask = SigSet::empty();
        mask.add(Signal::SIGINT);
        sigprocmask(SigmaskHow::SIG_BLOCK, Some(&mask), None)?;
    } else {
        let action = SigAction::new(
            SigHandler::Handler(handle_interrupt),
            SaFlags::empty(),
            SigSet::empty(),
        );
        unsafe { sigaction(Signal::SIGINT, &action) }?;
    }

    let action = SigAction::new(
        SigHandler::Handler(handle_alarm),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGALRM, &action) }?;

    if let Some(seconds) = timeout {
        if seconds > 0 {
            alarm::set(seconds);
        }
    }
    Ok(())
}

/// True once SIGINT has been delivered.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}

/// True once the wall-clock alarm has elapsed.
pub fn timed_out() -> bool {
    TIMED_OUT.load(Ordering::Relaxed)
}

/// Forget any recorded signals. Called by a freshly forked recipe worker,
/// whose flag copies belong to the driver's history.
pub fn reset_flags() {
    INTERRUPTED.store(false, Ordering::Relaxed);
    TIMED_OUT.store(false, Ordering::Relaxed);
}

/// Unblock SIGINT and restore its default disposition. Used by children
/// when the driver runs with the interrupt mask.
pub fn restore_default_interrupt() -> nix::Result<()> {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&mask), None)?;
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    unsafe { sigaction(Signal::SIGINT, &action) }?;
    Ok(())
}
