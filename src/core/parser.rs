//! Smallsh Parser
//!
//! Splits one input line into a `Command`. Tokens are separated by
//! whitespace; there is no quoting, escaping or expansion.

use crate::errors::{Error, Result};

/// Longest input line accepted, in bytes.
pub const MAX_LINE_LENGTH: usize = 2048;
/// Most arguments (program name included) a command may have.
pub const MAX_ARGS: usize = 512;

const COMMENT_PREFIX: char = '#';
const INPUT_REDIRECT: &str = "<";
const OUTPUT_REDIRECT: &str = ">";
const BACKGROUND: &str = "&";

/// A single command: program and arguments, optional redirections, and
/// whether it asked to run in the background.
///
/// A command with no arguments is a no-op.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
    input_file: Option<String>,
    output_file: Option<String>,
    background: bool,
}

impl Command {
    pub fn new<S: AsRef<str>>(argv: &[S]) -> Self {
        Self {
            argv: argv.iter().map(|arg| arg.as_ref().to_string()).collect(),
            ..Default::default()
        }
    }

    /// Parses an input line.
    ///
    /// Blank lines and lines starting with `#` give an empty command. `<` and
    /// `>` take the following token as the input or output file; `&` as the
    /// last token requests background execution, anywhere else it is an
    /// ordinary argument.
    ///
    /// # Examples
    ///
    /// ```
    /// use smallsh_rs::core::parser::Command;
    ///
    /// let command = Command::parse("sort < in.txt > out.txt &").unwrap();
    /// assert_eq!(command.program(), Some("sort"));
    /// assert_eq!(command.input_file(), Some("in.txt"));
    /// assert_eq!(command.output_file(), Some("out.txt"));
    /// assert!(command.is_background());
    /// ```
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if line.len() > MAX_LINE_LENGTH {
            return Err(Error::syntax(format!(
                "line is longer than {} bytes",
                MAX_LINE_LENGTH
            )));
        }

        let line = line.trim_start();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            return Ok(Self::default());
        }

        let mut command = Self::default();
        let mut tokens = line.split_whitespace().peekable();
        while let Some(token) = tokens.next() {
            match token {
                INPUT_REDIRECT => command.input_file = tokens.next().map(str::to_string),
                OUTPUT_REDIRECT => command.output_file = tokens.next().map(str::to_string),
                BACKGROUND if tokens.peek().is_none() => command.background = true,
                _ => command.argv.push(token.to_string()),
            }
        }

        if command.argv.len() > MAX_ARGS {
            return Err(Error::syntax(format!(
                "more than {} arguments",
                MAX_ARGS
            )));
        }

        Ok(command)
    }

    pub fn with_input_file<S: AsRef<str>>(self, path: S) -> Self {
        Self {
            input_file: Some(path.as_ref().to_string()),
            ..self
        }
    }

    pub fn with_output_file<S: AsRef<str>>(self, path: S) -> Self {
        Self {
            output_file: Some(path.as_ref().to_string()),
            ..self
        }
    }

    pub fn in_background(self) -> Self {
        Self {
            background: true,
            ..self
        }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    pub fn input_file(&self) -> Option<&str> {
        self.input_file.as_ref().map(String::as_str)
    }

    pub fn output_file(&self) -> Option<&str> {
        self.output_file.as_ref().map(String::as_str)
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    /// The command as the user would have typed it, used for log messages.
    pub fn display(&self) -> String {
        let mut words = self.argv.clone();
        words.extend(self.input_file().map(|path| format!("{} {}", INPUT_REDIRECT, path)));
        words.extend(self.output_file().map(|path| format!("{} {}", OUTPUT_REDIRECT, path)));
        if self.background {
            words.push(BACKGROUND.to_string());
        }
        words.join(" ")
    }
}
