//! Smallsh - a small shell
//!
//! Runs commands in the foreground or in the background, redirects standard
//! input and output to files, and reports how each process terminated.

#![deny(missing_debug_implementations, unused_import_braces)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

/// Logs `$result` if it is an error, then discards it.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(e) = $result {
            error!("{}: {}", $fmt, e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(e) = $result {
            error!("{}: {}", format_args!($fmt, $($arg)*), e);
        }
    }};
}

pub mod core;
pub mod errors;
pub mod shell;
mod util;

pub use crate::core::status::TerminationStatus;
pub use crate::shell::{Shell, ShellConfig};
