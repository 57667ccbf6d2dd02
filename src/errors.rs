//! Error module. See the [failure](https://crates.io/crates/failure) crate for details.

use std::fmt;
use std::result;

use failure::{Backtrace, Context, Fail};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    ctx: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.ctx.get_context()
    }

    pub(crate) fn syntax<T: AsRef<str>>(message: T) -> Error {
        Error::from(ErrorKind::Syntax(message.as_ref().to_string()))
    }

    pub(crate) fn builtin_command<T: AsRef<str>>(message: T, code: i32) -> Error {
        Error::from(ErrorKind::BuiltinCommand {
            message: message.as_ref().to_string(),
            code,
        })
    }

    pub(crate) fn invalid_argument<T: AsRef<str>>(argument: T) -> Error {
        Error::from(ErrorKind::InvalidArgument(argument.as_ref().to_string()))
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.ctx, f)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Syntax(String),
    BuiltinCommand { message: String, code: i32 },
    InvalidArgument(String),
    Fork,
    Docopt,
    Io,
    Nix,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ErrorKind::Syntax(ref message) => write!(f, "syntax error: {}", message),
            ErrorKind::BuiltinCommand { ref message, .. } => write!(f, "{}", message),
            ErrorKind::InvalidArgument(ref argument) => {
                write!(f, "{}: argument contains a nul byte", argument.escape_debug())
            }
            ErrorKind::Fork => write!(f, "fork failed"),
            ErrorKind::Docopt => write!(f, "invalid arguments"),
            ErrorKind::Io => write!(f, "I/O error occurred"),
            ErrorKind::Nix => write!(f, "Nix error occurred"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(ctx: Context<ErrorKind>) -> Error {
        Error { ctx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", Error::syntax("too many arguments")),
            "syntax error: too many arguments"
        );
        assert_eq!(
            format!("{}", Error::builtin_command("cd: HOME not set", 1)),
            "cd: HOME not set"
        );
    }

    #[test]
    fn test_error_kind() {
        let error = Error::builtin_command("exit", 2);
        assert_eq!(
            *error.kind(),
            ErrorKind::BuiltinCommand {
                message: "exit".to_string(),
                code: 2
            }
        );
        assert_eq!(*Error::from(ErrorKind::Fork).kind(), ErrorKind::Fork);
    }
}
