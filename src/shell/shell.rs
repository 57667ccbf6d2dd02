use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use failure::ResultExt;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::core::{job::JobTable, parser::Command, status::TerminationStatus};
use crate::errors::{ErrorKind, Result};
use crate::shell::{
    builtins,
    execute_command::{self, Launch},
    signals::{self, BackgroundMode, SignalState, SIGNAL_STATE},
    ShellConfig, PROMPT,
};
use crate::util;

/// Smallsh Shell
pub struct Shell {
    job_table: JobTable,
    signals: &'static SignalState,
    /// Status of the last foreground command.
    last_status: TerminationStatus,
    config: ShellConfig,
    /// Is `false` if stdin is not a terminal, e.g. input is piped in.
    is_interactive: bool,
}

impl Shell {
    /// Constructs a new Shell, installing its signal handlers if the config
    /// asks for them.
    pub fn new(config: ShellConfig) -> Result<Self> {
        if config.install_signal_handlers {
            signals::install_shell_handlers()?;
        }

        let shell = Self {
            job_table: JobTable::with_capacity(config.job_capacity),
            signals: &SIGNAL_STATE,
            last_status: TerminationStatus::from_success(),
            config,
            is_interactive: util::stdin_is_terminal(),
        };

        info!("smallsh started up");
        Ok(shell)
    }

    /// Writes the prompt if appropriate and reads one line.
    /// Returns `None` when end of file is reached.
    fn prompt(&mut self) -> Result<Option<String>> {
        if self.config.display_prompt && self.is_interactive {
            let mut stdout = io::stdout();
            write!(stdout, "{}", PROMPT).context(ErrorKind::Io)?;
            stdout.flush().context(ErrorKind::Io)?;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line).context(ErrorKind::Io)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }

    /// Runs commands from stdin until EOF is received.
    pub fn execute_from_stdin(&mut self) {
        loop {
            self.reap_jobs();

            let input = match self.prompt() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("failed to read command: {}", e);
                    eprintln!("smallsh: {}", e);
                    break;
                }
            };

            let temp_result = self.execute_command_string(&input);
            report_error(temp_result);
        }
    }

    /// Parses and runs one line. Syntax errors are reported here and are not
    /// returned.
    pub fn execute_command_string(&mut self, input: &str) -> Result<()> {
        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(e) => {
                if let ErrorKind::Syntax(_) = *e.kind() {
                    eprintln!("smallsh: {}", e);
                    return Ok(());
                }

                return Err(e);
            }
        };

        self.execute_command(&command)
    }

    /// Runs a smallsh script from a file, one line at a time.
    pub fn execute_commands_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let mut f = File::open(path).context(ErrorKind::Io)?;
        let mut buffer = String::new();
        f.read_to_string(&mut buffer).context(ErrorKind::Io)?;

        for line in buffer.lines() {
            self.reap_jobs();
            let temp_result = self.execute_command_string(line);
            report_error(temp_result);
        }

        Ok(())
    }

    /// Runs a parsed command: builtins in the shell process, anything else
    /// through the process launcher. An empty command does nothing.
    pub fn execute_command(&mut self, command: &Command) -> Result<()> {
        let program = match command.program() {
            Some(program) => program,
            None => return Ok(()),
        };

        if builtins::is_builtin(program) {
            debug!("running builtin: {}", command.display());
            let result = builtins::run(self, program, command.args(), &mut io::stdout());
            if let Err(e) = result {
                eprintln!("smallsh: {}", e);
            }
            return Ok(());
        }

        let launch = execute_command::execute_external(
            command,
            self.signals,
            &mut self.job_table,
            &mut io::stdout(),
        )?;
        if let Launch::Foreground(status) = launch {
            self.last_status = status;
        }

        Ok(())
    }

    /// Reports background jobs that have terminated and stops tracking them.
    pub fn reap_jobs(&mut self) {
        let completed = self.job_table.reap();
        if completed.is_empty() {
            return;
        }

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for job in completed {
            info!("{}", job);
            let temp_result = writeln!(handle, "{}", job);
            log_if_err!(temp_result, "failed to report background pid {}", job.pid);
        }
        log_if_err!(handle.flush(), "failed to flush stdout");
    }

    /// Status of the last foreground command.
    pub fn last_status(&self) -> TerminationStatus {
        self.last_status
    }

    /// Pids of the background jobs still being tracked, oldest first.
    pub fn background_pids(&self) -> &[Pid] {
        self.job_table.pids()
    }

    /// Returns `true` if the shell has background jobs.
    pub fn has_background_jobs(&self) -> bool {
        !self.job_table.is_empty()
    }

    pub fn background_mode(&self) -> BackgroundMode {
        self.signals.background_mode()
    }

    /// Sends SIGTERM to every tracked background job.
    pub fn terminate_background_jobs(&self) {
        for &pid in self.background_pids() {
            debug!("terminating background pid {}", pid);
            let temp_result = signal::kill(pid, Signal::SIGTERM);
            log_if_err!(temp_result, "failed to terminate background pid {}", pid);
        }
    }

    /// Exit the shell, terminating its background jobs first.
    ///
    /// Valid exit codes are between 0 and 255. Like bash and its descendents, it automatically
    /// converts exit codes to a u8 such that positive n becomes n & 256 and negative n becomes
    /// (256 + n) % 256.
    ///
    /// Exit the shell with a status of n. If n is None, then the exit status is that of the last
    /// foreground command.
    pub fn exit(&mut self, n: Option<i32>) -> ! {
        self.terminate_background_jobs();

        let code = n.unwrap_or_else(|| self.last_status.code());
        let code_like_u8 = if code < 0 {
            (256 + code % 256) % 256
        } else {
            code % 256
        };

        info!("smallsh has shut down");
        process::exit(code_like_u8);
    }
}

/// A failed command never ends the read-eval loop.
fn report_error(result: Result<()>) {
    if let Err(e) = result {
        error!("execute_command_string: {}", e);
        eprintln!("smallsh: {}", e);
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}last status: {}\tbackground mode: {:?}",
            self.job_table,
            self.last_status,
            self.background_mode()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;
    use std::time::{Duration, Instant};

    fn new_shell() -> Shell {
        Shell::new(ShellConfig::default()).unwrap()
    }

    #[test]
    fn test_new_shell_status() {
        let shell = new_shell();
        assert_eq!(shell.last_status(), TerminationStatus::Exited(0));
        assert!(!shell.has_background_jobs());
    }

    #[test]
    fn test_foreground_updates_last_status() {
        let mut shell = new_shell();
        shell.execute_command_string("false").unwrap();
        assert_eq!(shell.last_status(), TerminationStatus::Exited(1));
        shell.execute_command_string("true\n").unwrap();
        assert_eq!(shell.last_status(), TerminationStatus::Exited(0));
    }

    #[test]
    fn test_signaled_foreground_updates_last_status() {
        let mut shell = new_shell();
        let command = Command::new(&["sh", "-c", "kill -KILL $$"]);
        shell.execute_command(&command).unwrap();
        assert_eq!(shell.last_status(), TerminationStatus::Signaled(9));
    }

    #[test]
    fn test_empty_and_invalid_lines_leave_status_alone() {
        let mut shell = new_shell();
        shell.execute_command_string("false").unwrap();

        shell.execute_command_string("").unwrap();
        shell.execute_command_string("# comment").unwrap();
        shell.execute_command_string("< only-a-redirect").unwrap();
        let too_long = "x".repeat(crate::core::parser::MAX_LINE_LENGTH + 1);
        shell.execute_command_string(&too_long).unwrap();

        assert_eq!(shell.last_status(), TerminationStatus::Exited(1));
    }

    #[test]
    fn test_builtins_do_not_update_last_status() {
        let mut shell = new_shell();
        shell.execute_command_string("false").unwrap();
        shell.execute_command_string("status").unwrap();
        shell.execute_command_string("cd /nonexistent/smallsh/dir").unwrap();
        assert_eq!(shell.last_status(), TerminationStatus::Exited(1));
    }

    #[test]
    fn test_background_job_is_reaped() {
        let mut shell = new_shell();
        assert_eq!(shell.background_mode(), BackgroundMode::Enabled);

        shell.execute_command_string("sh -c true &").unwrap();
        assert_eq!(shell.background_pids().len(), 1);
        assert_eq!(shell.last_status(), TerminationStatus::Exited(0));

        let deadline = Instant::now() + Duration::from_secs(10);
        while shell.has_background_jobs() {
            assert!(Instant::now() < deadline, "background job never finished");
            thread::sleep(Duration::from_millis(10));
            shell.reap_jobs();
        }
    }

    #[test]
    fn test_terminate_background_jobs() {
        let mut shell = new_shell();
        shell.execute_command_string("sleep 30 &").unwrap();
        let pids = shell.background_pids().to_vec();
        assert_eq!(pids.len(), 1);

        shell.terminate_background_jobs();
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut completed = Vec::new();
        while completed.is_empty() {
            assert!(Instant::now() < deadline, "background job was not terminated");
            completed = shell.job_table.reap();
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(completed[0].pid, pids[0]);
        assert_eq!(completed[0].status, TerminationStatus::Signaled(15));
    }
}
