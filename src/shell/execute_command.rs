//! Launching external commands.
//!
//! The shell forks; the child resets its signals, applies redirections and
//! replaces itself with the program. The parent either waits for the child
//! (foreground) or records it in the job table (background).

use std::ffi::CString;
use std::io::{self, Write};

use failure::{Fail, ResultExt};
use nix::errno::Errno;
use nix::sys::wait;
use nix::unistd::{self, ForkResult, Pid};

use crate::core::{job::JobTable, parser::Command, status::TerminationStatus};
use crate::errors::{Error, ErrorKind, Result};
use crate::shell::{
    redirect::{PreparedRedirects, RedirectPlan},
    signals::{self, SignalState},
};
use crate::util;

/// What became of a launched command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Launch {
    /// Running in the background. It is in the job table unless the table
    /// was full.
    Background(Pid),
    /// Ran in the foreground and has terminated.
    Foreground(TerminationStatus),
}

/// Runs `command`, which must not be a builtin.
///
/// `stdout` receives the shell's own reports (`background pid is <pid>`,
/// `terminated by signal <n>`); the child writes its errors straight to fd 1.
///
/// Only a failure in the shell itself (e.g. `fork`) is an error. A child that
/// cannot open a redirect or cannot exec its program exits with status 1,
/// which is reported like any other exit.
pub fn execute_external(
    command: &Command,
    signals: &SignalState,
    jobs: &mut JobTable,
    stdout: &mut dyn Write,
) -> Result<Launch> {
    let background = command.is_background() && signals.background_mode().allows_background();
    if command.is_background() && !background {
        debug!(
            "foreground-only mode, running in the foreground: {}",
            command.display()
        );
    }
    let setup = ChildSetup::new(command, background)?;

    // anything still buffered would otherwise be written by both processes
    stdout.flush().context(ErrorKind::Io)?;
    io::stdout().flush().context(ErrorKind::Io)?;

    match unsafe { unistd::fork() }.context(ErrorKind::Fork)? {
        ForkResult::Child => setup.exec(),
        ForkResult::Parent { child } => {
            if background {
                info!("started background pid {}: {}", child, command.display());
                jobs.push(child);
                writeln!(stdout, "background pid is {}", child).context(ErrorKind::Io)?;
                stdout.flush().context(ErrorKind::Io)?;
                Ok(Launch::Background(child))
            } else {
                debug!("waiting on foreground pid {}: {}", child, command.display());
                let status = wait_for_foreground(child, signals)?;
                debug!("foreground pid {} finished with {}", child, status);
                if let TerminationStatus::Signaled(_) = status {
                    writeln!(stdout, "{}", status).context(ErrorKind::Io)?;
                    stdout.flush().context(ErrorKind::Io)?;
                }
                Ok(Launch::Foreground(status))
            }
        }
    }
}

/// Everything the child needs, built before `fork`. The only allocation left
/// in the child is the argv pointer array `execvp` builds.
struct ChildSetup {
    argv: Vec<CString>,
    redirects: PreparedRedirects,
    exec_failure_message: String,
}

impl ChildSetup {
    fn new(command: &Command, background: bool) -> Result<Self> {
        let program = command
            .program()
            .ok_or_else(|| Error::syntax("empty command"))?;
        let argv = command
            .argv()
            .iter()
            .map(|arg| CString::new(arg.as_str()).map_err(|_| Error::invalid_argument(arg)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            argv,
            redirects: RedirectPlan::new(command, background).prepare()?,
            exec_failure_message: format!("{}: no such file or directory\n", program),
        })
    }

    /// Runs in the forked child and never returns.
    fn exec(&self) -> ! {
        // sigaction cannot fail for SIGINT/SIGTSTP with these dispositions
        let _ = signals::reset_for_child();

        if let Err(message) = self.redirects.apply() {
            util::write_stdout(message.as_bytes());
            util::exit_child(1);
        }

        let _ = unistd::execvp(&self.argv[0], &self.argv);
        util::write_stdout(self.exec_failure_message.as_bytes());
        util::exit_child(1)
    }
}

/// Blocks until `pid` terminates, publishing it as the foreground pid in the
/// meantime so the SIGINT handler can forward to it.
///
/// The pid is withdrawn as soon as `waitpid` has reaped the child, since it may
/// be reused from then on.
fn wait_for_foreground(pid: Pid, signals: &SignalState) -> Result<TerminationStatus> {
    signals.set_foreground_pid(pid);
    wait_for_termination_then(pid, || signals.clear_foreground_pid())
}

fn wait_for_termination(pid: Pid) -> Result<TerminationStatus> {
    wait_for_termination_then(pid, || {})
}

/// Runs `on_reaped` right after the final `waitpid`, before anything else.
fn wait_for_termination_then<F: FnOnce()>(pid: Pid, on_reaped: F) -> Result<TerminationStatus> {
    let result = loop {
        match wait::waitpid(pid, None) {
            Ok(wait_status) => {
                if let Some(status) = TerminationStatus::from_wait_status(wait_status) {
                    break Ok(status);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => break Err(e),
        }
    };
    on_reaped();

    result.map_err(|e| e.context(ErrorKind::Nix).into())
}
