use std::env;
use std::path::PathBuf;

use crate::shell::builtins::{self, prelude::*};

pub struct Cd;

#[derive(Debug, Deserialize)]
struct CdArgs {
    arg_dir: Option<String>,
}

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    const HELP: &'static str = "\
cd: cd [dir]
    Change the current directory to DIR. The variable $HOME is the default DIR.

Usage:
    cd [<dir>]";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let args: CdArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(AsRef::as_ref))?;
        debug!("{:?}", args);

        let dir = match args.arg_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .ok_or_else(|| Error::builtin_command("cd: HOME not set", 1))?,
        };

        env::set_current_dir(&dir).map_err(|e| {
            Error::builtin_command(format!("cd: {}: {}", dir.display(), e), 1)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::shell::{builtins::BuiltinCommand, ShellConfig};

    #[test]
    fn test_missing_directory() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        let mut stdout = Vec::new();
        let before = env::current_dir().unwrap();

        let e = Cd::run(&mut shell, &["/nonexistent/smallsh/dir"], &mut stdout).unwrap_err();
        match *e.kind() {
            ErrorKind::BuiltinCommand { ref message, code } => {
                assert!(message.starts_with("cd: /nonexistent/smallsh/dir: "));
                assert_eq!(code, 1);
            }
            ref kind => panic!("unexpected error kind: {:?}", kind),
        }
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_too_many_arguments() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        let mut stdout = Vec::new();
        let e = Cd::run(&mut shell, &["a", "b"], &mut stdout).unwrap_err();
        assert_eq!(*e.kind(), ErrorKind::Docopt);
    }
}
