#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use docopt::Docopt;
use log::LevelFilter;
use nix::unistd::Pid;

use smallsh_rs::errors::*;
use smallsh_rs::{Shell, ShellConfig, TerminationStatus};

const LOG_FILE_NAME: &str = ".smallsh_log";

const USAGE: &str = "
smallsh.

Usage:
    smallsh [options]
    smallsh [options] -c <command>
    smallsh [options] <file>
    smallsh (-h | --help)
    smallsh --version

Options:
    -h --help               Show this screen.
    --version               Show version.
    -c                      If the -c option is present, then commands are read from the first
                                non-option argument command_string.
    --log=<path>            File to write log to, defaults to ~/.smallsh_log
    --log-level=<level>     One of off, error, warn, info, debug or trace [default: info]
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_log: Option<String>,
    flag_log_level: String,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    init_logger(&args.flag_log, &args.flag_log_level);
    debug!("{:?}", args);

    if args.flag_version {
        println!("smallsh version {}", env!("CARGO_PKG_VERSION"));
    } else if args.flag_c || args.arg_file.is_some() {
        execute_from_command_string_or_file(&args);
    } else {
        execute_from_stdin();
    }
}

/// Logging is best effort: a bad level or an unwritable log file leaves the
/// shell running without a logger.
fn init_logger(path: &Option<String>, level: &str) {
    let level = match LevelFilter::from_str(level) {
        Ok(LevelFilter::Off) => return,
        Ok(level) => level,
        Err(_) => {
            eprintln!("smallsh: {}: invalid log level", level);
            return;
        }
    };

    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => return,
    };
    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!("smallsh: {}: {}", log_path.display(), e);
            return;
        }
    };

    let pid = Pid::this();
    let result = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(log_file)
        .apply();
    if let Err(e) = result {
        eprintln!("smallsh: failed to initialize logging: {}", e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}

fn execute_from_command_string_or_file(args: &Args) -> ! {
    let shell_config = ShellConfig::noninteractive();
    let mut shell = Shell::new(shell_config).unwrap_or_else(|e| display_error_and_exit(&e));

    let result = match (&args.arg_command, &args.arg_file) {
        (Some(command), _) => shell.execute_command_string(command),
        (None, Some(file_path)) => shell.execute_commands_from_file(file_path),
        (None, None) => Ok(()),
    };

    exit(result, &mut shell);
}

fn execute_from_stdin() -> ! {
    let shell_config = ShellConfig::interactive();
    let mut shell = Shell::new(shell_config).unwrap_or_else(|e| display_error_and_exit(&e));
    shell.execute_from_stdin();
    shell.exit(None)
}

fn display_error_and_exit(error: &Error) -> ! {
    error!("failed to create shell: {}", error);
    eprintln!("smallsh: {}", error);
    process::exit(TerminationStatus::from_failure().code());
}

fn exit(result: Result<()>, shell: &mut Shell) -> ! {
    if let Err(e) = result {
        error!("{}", e);
        eprintln!("smallsh: {}", e);
        shell.exit(Some(TerminationStatus::from_failure().code()));
    } else {
        shell.exit(None);
    }
}
