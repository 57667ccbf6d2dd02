//! Smallsh - Shell Module
//!
//! The Shell reads commands, runs builtins itself, hands everything else to
//! the process launcher, and reports background jobs as they finish.

pub use self::shell::Shell;

pub mod builtins;
pub mod execute_command;
pub mod redirect;
#[allow(clippy::module_inception)]
mod shell;
pub mod signals;

const PROMPT: &str = ": ";

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if the `: ` prompt is written before each line is read.
    ///
    /// Note: the prompt is only written when stdin is a terminal.
    display_prompt: bool,

    /// Determines if the SIGINT and SIGTSTP handlers are installed.
    install_signal_handlers: bool,

    /// Number of background jobs tracked at once.
    job_capacity: usize,
}

impl ShellConfig {
    /// Creates an interactive shell, e.g. prompt, signal handling
    ///
    /// # Complete List
    /// - The prompt is displayed when stdin is a terminal
    /// - Ctrl-C interrupts the foreground command instead of the shell
    /// - Ctrl-Z toggles foreground-only mode
    pub fn interactive() -> Self {
        Self {
            display_prompt: true,
            install_signal_handlers: true,
            ..Default::default()
        }
    }

    /// Creates a shell that runs a command string or a script file
    ///
    /// # Complete List
    /// - No prompt is displayed
    /// - Signal handling is the same as for an interactive shell
    pub fn noninteractive() -> Self {
        Self {
            display_prompt: false,
            install_signal_handlers: true,
            ..Default::default()
        }
    }

    /// Overrides the number of background jobs tracked at once.
    pub fn with_job_capacity(self, job_capacity: usize) -> Self {
        Self {
            job_capacity,
            ..self
        }
    }
}

/// No prompt and no signal handlers, which leaves the process's signal
/// dispositions alone (e.g. when embedding a Shell in tests).
impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            display_prompt: false,
            install_signal_handlers: false,
            job_capacity: crate::core::job::JOB_TABLE_CAPACITY,
        }
    }
}
