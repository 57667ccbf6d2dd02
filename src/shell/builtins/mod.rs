//! Smallsh builtins
//!
//! Builtins run inside the shell process, so they ignore redirection and `&`
//! and never change the status reported by `status`.

use std::iter;

use docopt::Docopt;
use failure::Fail;
use serde::de::DeserializeOwned;

use self::prelude::*;

use self::cd::Cd;
use self::exit::Exit;
use self::status::Status;

pub mod prelude {
    pub use std::io::Write;

    pub use failure::ResultExt;

    pub use super::parse_args;
    pub use crate::errors::{Error, ErrorKind, Result};
    pub use crate::shell::Shell;
}

mod cd;
mod exit;
mod status;

const CD_NAME: &str = "cd";
const EXIT_NAME: &str = "exit";
const STATUS_NAME: &str = "status";

/// Represents a Smallsh builtin command such as cd or status.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The help string to display to the user. Its first line is the usage
    /// summary and it carries a docopt `Usage:` section.
    const HELP: &'static str;
    /// The usage string to display to the user.
    fn usage() -> String {
        Self::HELP.lines().next().unwrap_or(Self::NAME).to_owned()
    }
    /// Runs the command with the given arguments in the `shell` environment.
    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [CD_NAME, EXIT_NAME, STATUS_NAME].contains(&program.as_ref())
}

/// precondition: `program` is a builtin.
pub fn run<S1, S2>(shell: &mut Shell, program: S1, args: &[S2], stdout: &mut dyn Write) -> Result<()>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    match program.as_ref() {
        CD_NAME => usage_on_bad_args::<Cd>(Cd::run(shell, args, stdout)),
        EXIT_NAME => usage_on_bad_args::<Exit>(Exit::run(shell, args, stdout)),
        STATUS_NAME => usage_on_bad_args::<Status>(Status::run(shell, args, stdout)),
        other => Err(Error::builtin_command(
            format!("{}: not a shell builtin", other),
            1,
        )),
    }
}

/// Replaces docopt's generic failure with the command's usage line.
fn usage_on_bad_args<B: BuiltinCommand>(result: Result<()>) -> Result<()> {
    result.map_err(|e| {
        if *e.kind() == ErrorKind::Docopt {
            Error::builtin_command(format!("usage: {}", B::usage()), 2)
        } else {
            e
        }
    })
}

pub fn parse_args<D, S, I>(usage: &str, program: S, args: I) -> Result<D>
where
    D: DeserializeOwned,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Docopt::new(usage)
        .and_then(|d| {
            d.argv(iter::once(program).chain(args))
                .help(false)
                .deserialize()
        })
        .map_err(|e| e.context(ErrorKind::Docopt).into())
}
