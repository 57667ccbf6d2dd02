//! Standard stream redirection for launched commands.
//!
//! The shell decides each stream's source before forking (`RedirectPlan`)
//! and converts the plan into C strings and ready-made error messages
//! (`PreparedRedirects`). The child then only has to `open`, `dup2` and
//! `close`, none of which allocate. Failing any of them fails the launch.

use std::ffi::CString;
use std::fmt;
use std::os::unix::io::RawFd;

use nix::fcntl::{self, OFlag};
use nix::libc;
use nix::sys::stat::Mode;
use nix::unistd;

use crate::core::parser::Command;
use crate::errors::{Error, Result};

const DEV_NULL: &str = "/dev/null";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Input,
    Output,
}

impl Stream {
    fn fd(self) -> RawFd {
        match self {
            Stream::Input => libc::STDIN_FILENO,
            Stream::Output => libc::STDOUT_FILENO,
        }
    }

    fn flags(self) -> OFlag {
        match self {
            Stream::Input => OFlag::O_RDONLY,
            Stream::Output => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Stream::Input => write!(f, "input"),
            Stream::Output => write!(f, "output"),
        }
    }
}

/// Where a child's standard stream comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Redirect {
    /// Leave the stream the shell passed down.
    Inherit,
    /// A path named on the command line.
    File(String),
    /// `/dev/null`, so a background job does not fight over the terminal.
    DevNull,
}

impl Redirect {
    fn new(path: Option<&str>, background: bool) -> Self {
        match path {
            Some(path) => Redirect::File(path.to_string()),
            None if background => Redirect::DevNull,
            None => Redirect::Inherit,
        }
    }

    fn path(&self) -> Option<&str> {
        match *self {
            Redirect::Inherit => None,
            Redirect::File(ref path) => Some(path.as_str()),
            Redirect::DevNull => Some(DEV_NULL),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectPlan {
    pub stdin: Redirect,
    pub stdout: Redirect,
}

impl RedirectPlan {
    /// `background` is whether the command will actually run in the
    /// background, i.e. it asked for `&` and foreground-only mode is off.
    pub fn new(command: &Command, background: bool) -> Self {
        Self {
            stdin: Redirect::new(command.input_file(), background),
            stdout: Redirect::new(command.output_file(), background),
        }
    }

    pub fn prepare(&self) -> Result<PreparedRedirects> {
        Ok(PreparedRedirects {
            stdin: PreparedStream::new(&self.stdin, Stream::Input)?,
            stdout: PreparedStream::new(&self.stdout, Stream::Output)?,
        })
    }
}

/// A `RedirectPlan` ready to be applied in a forked child.
#[derive(Debug)]
pub struct PreparedRedirects {
    stdin: Option<PreparedStream>,
    stdout: Option<PreparedStream>,
}

impl PreparedRedirects {
    /// Rebinds fds 0 and 1. Must only run in the forked child, since it
    /// permanently replaces the process's standard streams.
    ///
    /// On failure, returns the message to report (`cannot open <path> for
    /// input` or `... for output`); streams already installed stay installed.
    pub fn apply(&self) -> std::result::Result<(), &str> {
        for stream in self.stdin.iter().chain(self.stdout.iter()) {
            stream.install()?;
        }

        Ok(())
    }
}

#[derive(Debug)]
struct PreparedStream {
    path: CString,
    stream: Stream,
    failure_message: String,
}

impl PreparedStream {
    fn new(redirect: &Redirect, stream: Stream) -> Result<Option<Self>> {
        let path = match redirect.path() {
            Some(path) => path,
            None => return Ok(None),
        };

        Ok(Some(Self {
            path: CString::new(path).map_err(|_| Error::invalid_argument(path))?,
            stream,
            failure_message: format!("cannot open {} for {}\n", path, stream),
        }))
    }

    fn install(&self) -> std::result::Result<(), &str> {
        let mode = Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH;
        let fd = fcntl::open(self.path.as_c_str(), self.stream.flags(), mode)
            .map_err(|_| self.failure_message.as_str())?;

        move_fd(fd, self.stream.fd()).map_err(|_| self.failure_message.as_str())
    }
}

/// Makes `target` refer to what `fd` refers to, then closes `fd`.
fn move_fd(fd: RawFd, target: RawFd) -> nix::Result<()> {
    if fd == target {
        return Ok(());
    }

    let result = unistd::dup2(fd, target).map(drop);
    let _ = unistd::close(fd);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::errors::ErrorKind;

    #[test]
    fn test_foreground_inherits_streams() {
        let command = Command::new(&["ls"]);
        assert_eq!(
            RedirectPlan::new(&command, false),
            RedirectPlan {
                stdin: Redirect::Inherit,
                stdout: Redirect::Inherit,
            }
        );
    }

    #[test]
    fn test_foreground_files() {
        let command = Command::new(&["sort"])
            .with_input_file("in.txt")
            .with_output_file("out.txt");
        assert_eq!(
            RedirectPlan::new(&command, false),
            RedirectPlan {
                stdin: Redirect::File("in.txt".to_string()),
                stdout: Redirect::File("out.txt".to_string()),
            }
        );
    }

    #[test]
    fn test_background_defaults_to_dev_null() {
        let command = Command::new(&["sleep", "5"]).in_background();
        assert_eq!(
            RedirectPlan::new(&command, true),
            RedirectPlan {
                stdin: Redirect::DevNull,
                stdout: Redirect::DevNull,
            }
        );
    }

    #[test]
    fn test_background_keeps_declared_files() {
        let command = Command::new(&["wc"]).with_input_file("in.txt").in_background();
        assert_eq!(
            RedirectPlan::new(&command, true),
            RedirectPlan {
                stdin: Redirect::File("in.txt".to_string()),
                stdout: Redirect::DevNull,
            }
        );
    }

    #[test]
    fn test_demoted_background_inherits_streams() {
        // `&` was given, but foreground-only mode runs it in the foreground
        let command = Command::new(&["cat"]).in_background();
        assert_eq!(
            RedirectPlan::new(&command, false),
            RedirectPlan {
                stdin: Redirect::Inherit,
                stdout: Redirect::Inherit,
            }
        );
    }

    #[test]
    fn test_prepare_failure_messages() {
        let command = Command::new(&["cat"])
            .with_input_file("missing.txt")
            .with_output_file("/no/such/dir/out.txt");
        let prepared = RedirectPlan::new(&command, false).prepare().unwrap();

        let stdin = prepared.stdin.as_ref().unwrap();
        assert_eq!(stdin.failure_message, "cannot open missing.txt for input\n");
        assert_eq!(stdin.path.to_str().unwrap(), "missing.txt");
        let stdout = prepared.stdout.as_ref().unwrap();
        assert_eq!(
            stdout.failure_message,
            "cannot open /no/such/dir/out.txt for output\n"
        );
    }

    #[test]
    fn test_prepare_inherit_is_empty() {
        let prepared = RedirectPlan::new(&Command::new(&["ls"]), false)
            .prepare()
            .unwrap();
        assert!(prepared.stdin.is_none());
        assert!(prepared.stdout.is_none());
        assert_eq!(prepared.apply(), Ok(()));
    }

    #[test]
    fn test_move_fd_reports_dup2_failure() {
        assert_eq!(move_fd(-1, 1000), Err(nix::errno::Errno::EBADF));
    }

    #[test]
    fn test_move_fd_onto_itself_is_a_no_op() {
        assert_eq!(move_fd(libc::STDOUT_FILENO, libc::STDOUT_FILENO), Ok(()));
    }

    #[test]
    fn test_prepare_rejects_nul_bytes() {
        let command = Command::new(&["cat"]).with_input_file("bad\0name");
        let e = RedirectPlan::new(&command, false).prepare().unwrap_err();
        assert!(match *e.kind() {
            ErrorKind::InvalidArgument(_) => true,
            _ => false,
        });
    }
}
