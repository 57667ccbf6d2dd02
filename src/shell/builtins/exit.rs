use crate::shell::builtins::{self, prelude::*};

pub struct Exit;

impl builtins::BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    const HELP: &'static str = "\
exit: exit [n]
    Exit the shell with a status of N. If N is omitted, the exit status
    is 0. Background jobs are sent SIGTERM first.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let code = requested_code(args)?.unwrap_or(0);
        shell.exit(Some(code));
    }
}

/// A non-numeric argument is reported and treated as 2.
fn requested_code<T: AsRef<str>>(args: &[T]) -> Result<Option<i32>> {
    if args.len() > 1 {
        return Err(Error::builtin_command("exit: too many arguments", 1));
    }

    Ok(args.get(0).map(|arg| {
        arg.as_ref().parse::<i32>().unwrap_or_else(|_| {
            eprintln!("smallsh: exit: {}: numeric argument required", arg.as_ref());
            2
        })
    }))
}
