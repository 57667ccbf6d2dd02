use crate::shell::builtins::{self, prelude::*};

pub struct Status;

#[derive(Debug, Deserialize)]
struct StatusArgs {}

impl builtins::BuiltinCommand for Status {
    const NAME: &'static str = builtins::STATUS_NAME;

    const HELP: &'static str = "\
status: status
    Print how the last foreground command ended: its exit value, or the
    signal that terminated it. Builtins are not counted.

Usage:
    status";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let _: StatusArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref))?;
        writeln!(stdout, "{}", shell.last_status()).context(ErrorKind::Io)?;
        stdout.flush().context(ErrorKind::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::parser::Command;
    use crate::shell::{builtins::BuiltinCommand, ShellConfig};

    fn status_output(shell: &mut Shell) -> String {
        let mut stdout = Vec::new();
        let no_args: &[&str] = &[];
        Status::run(shell, no_args, &mut stdout).unwrap();
        String::from_utf8(stdout).unwrap()
    }

    #[test]
    fn test_status_reports_last_foreground_command() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        assert_eq!(status_output(&mut shell), "exit value 0\n");

        shell.execute_command(&Command::new(&["false"])).unwrap();
        assert_eq!(status_output(&mut shell), "exit value 1\n");

        shell
            .execute_command(&Command::new(&["sh", "-c", "kill -TERM $$"]))
            .unwrap();
        assert_eq!(status_output(&mut shell), "terminated by signal 15\n");
    }

    #[test]
    fn test_status_rejects_arguments() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        let mut stdout = Vec::new();
        let e = Status::run(&mut shell, &["now"], &mut stdout).unwrap_err();
        assert_eq!(*e.kind(), ErrorKind::Docopt);
    }
}
