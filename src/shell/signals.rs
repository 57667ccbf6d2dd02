//! Signal policy for the shell and the children it launches.
//!
//! In the shell, SIGINT never terminates the process: its handler forwards the
//! signal to the foreground child, if one is running. SIGTSTP toggles
//! foreground-only mode, in which `&` is ignored. Children get SIGINT back at
//! its default disposition and ignore SIGTSTP.
//!
//! The handlers only touch the atomics in `SignalState` and write with
//! `write(2)`. They never allocate and never see the job table.

use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};

use failure::ResultExt;
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::Pid;

use crate::errors::{ErrorKind, Result};
use crate::util;

/// State shared between the shell's signal handlers and its main loop.
pub static SIGNAL_STATE: SignalState = SignalState::new();

const ENTER_FOREGROUND_ONLY_MESSAGE: &str = "\nEntering foreground-only mode (& is now ignored)\n";
const EXIT_FOREGROUND_ONLY_MESSAGE: &str = "\nExiting foreground-only mode\n";

const ENABLED: u8 = 0;
const FOREGROUND_ONLY: u8 = 1;

/// Whether commands ending in `&` run in the background.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundMode {
    Enabled,
    /// Background requests are run in the foreground instead.
    ForegroundOnly,
}

impl BackgroundMode {
    pub fn toggled(self) -> Self {
        match self {
            BackgroundMode::Enabled => BackgroundMode::ForegroundOnly,
            BackgroundMode::ForegroundOnly => BackgroundMode::Enabled,
        }
    }

    pub fn allows_background(self) -> bool {
        self == BackgroundMode::Enabled
    }

    /// The line printed when the shell switches into this mode.
    pub fn announcement(self) -> &'static str {
        match self {
            BackgroundMode::Enabled => EXIT_FOREGROUND_ONLY_MESSAGE,
            BackgroundMode::ForegroundOnly => ENTER_FOREGROUND_ONLY_MESSAGE,
        }
    }

    fn from_raw(raw: u8) -> Self {
        if raw == FOREGROUND_ONLY {
            BackgroundMode::ForegroundOnly
        } else {
            BackgroundMode::Enabled
        }
    }
}

/// Background mode plus the pid of the foreground child (0 when there is none).
///
/// Each field has one writer: the mode is flipped only by the SIGTSTP
/// handler, the foreground pid is set and cleared only by the launcher around
/// its wait.
#[derive(Debug)]
pub struct SignalState {
    mode: AtomicU8,
    foreground_pid: AtomicI32,
}

impl SignalState {
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(ENABLED),
            foreground_pid: AtomicI32::new(0),
        }
    }

    pub fn background_mode(&self) -> BackgroundMode {
        BackgroundMode::from_raw(self.mode.load(Ordering::SeqCst))
    }

    /// Flips the mode and returns the new one. Async-signal-safe.
    pub fn toggle_background_mode(&self) -> BackgroundMode {
        let previous = self.mode.fetch_xor(FOREGROUND_ONLY, Ordering::SeqCst);
        BackgroundMode::from_raw(previous).toggled()
    }

    pub fn foreground_pid(&self) -> Option<Pid> {
        match self.foreground_pid.load(Ordering::SeqCst) {
            0 => None,
            pid => Some(Pid::from_raw(pid)),
        }
    }

    pub fn set_foreground_pid(&self, pid: Pid) {
        self.foreground_pid.store(pid.as_raw(), Ordering::SeqCst);
    }

    pub fn clear_foreground_pid(&self) {
        self.foreground_pid.store(0, Ordering::SeqCst);
    }

    /// Sends `signal` to the foreground child, if there is one. Returns
    /// whether a signal was delivered. Async-signal-safe.
    pub fn forward_to_foreground(&self, signal: Signal) -> bool {
        match self.foreground_pid() {
            Some(pid) => signal::kill(pid, signal).is_ok(),
            None => false,
        }
    }
}

impl Default for SignalState {
    fn default() -> Self {
        Self::new()
    }
}

extern "C" fn handle_interrupt(_: libc::c_int) {
    SIGNAL_STATE.forward_to_foreground(Signal::SIGINT);
}

extern "C" fn handle_suspend(_: libc::c_int) {
    let mode = SIGNAL_STATE.toggle_background_mode();
    util::write_stdout(mode.announcement().as_bytes());
}

/// Installs the shell's SIGINT and SIGTSTP handlers.
///
/// `SA_RESTART` keeps a blocking read of the next command line from failing
/// with `EINTR` when the user presses Ctrl-Z at the prompt.
pub fn install_shell_handlers() -> Result<()> {
    let interrupt = SigAction::new(
        SigHandler::Handler(handle_interrupt),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    let suspend = SigAction::new(
        SigHandler::Handler(handle_suspend),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );

    unsafe {
        signal::sigaction(Signal::SIGINT, &interrupt).context(ErrorKind::Nix)?;
        signal::sigaction(Signal::SIGTSTP, &suspend).context(ErrorKind::Nix)?;
    }

    debug!("installed SIGINT and SIGTSTP handlers");
    Ok(())
}

/// Signal setup for a forked child, run before `exec`: SIGINT goes back to
/// its default action and SIGTSTP is ignored.
///
/// Handlers installed by the shell would be reset by `exec` anyway, but an
/// ignored disposition survives it, so both are set explicitly.
pub fn reset_for_child() -> nix::Result<()> {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());

    unsafe {
        signal::sigaction(Signal::SIGINT, &default)?;
        signal::sigaction(Signal::SIGTSTP, &ignore)?;
    }

    Ok(())
}
