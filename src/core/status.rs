use std::fmt;

use nix::sys::wait::WaitStatus;

/// How a child process terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationStatus {
    /// The process exited normally with this code.
    Exited(i32),
    /// The process was killed by this signal number.
    Signaled(i32),
}

impl TerminationStatus {
    pub fn from_success() -> Self {
        TerminationStatus::Exited(0)
    }

    pub fn from_failure() -> Self {
        TerminationStatus::Exited(1)
    }

    /// Returns `None` for wait statuses that do not mean the process is gone,
    /// e.g. `StillAlive` from a `WNOHANG` poll.
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(TerminationStatus::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(TerminationStatus::Signaled(signal as i32)),
            _ => None,
        }
    }

    pub fn success(&self) -> bool {
        *self == TerminationStatus::Exited(0)
    }

    /// The code a shell exits with for this status. Like bash, a process
    /// killed by signal n maps to 128 + n.
    pub fn code(&self) -> i32 {
        match *self {
            TerminationStatus::Exited(code) => code,
            TerminationStatus::Signaled(signal) => 128 + signal,
        }
    }
}

impl Default for TerminationStatus {
    fn default() -> Self {
        TerminationStatus::from_success()
    }
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TerminationStatus::Exited(code) => write!(f, "exit value {}", code),
            TerminationStatus::Signaled(signal) => write!(f, "terminated by signal {}", signal),
        }
    }
}
