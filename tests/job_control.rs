//! Background jobs, foreground-only mode and signal forwarding, driven
//! through a running smallsh.


use std::time::Duration;

use nix::sys::signal::Signal;
use nix::unistd::Pid;

use crate::workdir::{eventually, process_is_gone, WorkDir};

fn background_pid(line: &str) -> Pid {
    let pid = line
        .trim_start_matches("background pid is ")
        .parse()
        .expect("background pid should be a number");
    Pid::from_raw(pid)
}

#[test]
fn test_background_job_is_reported_once() {
    let wd = WorkDir::new();
    let mut session = wd.session();

    session.send("sleep 0 &");
    let pid = background_pid(&session.line_starting_with("background pid is "));

    // each line read gives the shell a chance to reap
    let done = format!("background pid {} is done: exit value 0", pid);
    let mut reported = 0;
    for _ in 0..50 {
        session.send("status");
        let before = session.lines_until("exit value 0");
        reported += before.iter().filter(|line| **line == done).count();
        if reported > 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(reported, 1);

    session.send("status");
    let before = session.lines_until("exit value 0");
    assert!(!before.iter().any(|line| *line == done));

    assert!(session.finish().success());
}

#[test]
fn test_foreground_only_mode_toggle() {
    let wd = WorkDir::new();
    let mut session = wd.session();

    // handlers are installed once the first command has run
    session.send("status");
    session.expect_line("exit value 0");

    session.signal(Signal::SIGTSTP);
    session.expect_line("Entering foreground-only mode (& is now ignored)");

    session.send("false &");
    session.send("status");
    let before = session.lines_until("exit value 1");
    assert!(!before.iter().any(|line| line.starts_with("background pid is ")));

    session.signal(Signal::SIGTSTP);
    session.expect_line("Exiting foreground-only mode");

    session.send("sleep 0 &");
    session.line_starting_with("background pid is ");

    session.send("exit 0");
    assert!(session.finish().success());
}

#[test]
fn test_interrupt_reaches_foreground_child_only() {
    let wd = WorkDir::new();
    let mut session = wd.session();

    session.send("status");
    session.expect_line("exit value 0");

    session.send("sleep 30");
    // the child may not have been forked yet, so keep interrupting
    let interrupted = eventually(Duration::from_secs(10), || {
        session.signal(Signal::SIGINT);
        session
            .wait_for_line("terminated by signal 2", Duration::from_millis(100))
            .is_some()
    });
    assert!(interrupted, "sleep was never interrupted");

    session.send("status");
    session.expect_line("terminated by signal 2");

    session.send("exit 0");
    assert!(session.finish().success());
}

#[test]
fn test_exit_terminates_background_jobs() {
    let wd = WorkDir::new();
    let mut session = wd.session();

    session.send("sleep 30 &");
    let pid = background_pid(&session.line_starting_with("background pid is "));

    session.send("exit");
    assert!(session.finish().success());
    assert!(eventually(Duration::from_secs(10), || process_is_gone(pid)));
}

#[test]
fn test_end_of_input_terminates_background_jobs() {
    let wd = WorkDir::new();
    let mut session = wd.session();

    session.send("sleep 30 &");
    let pid = background_pid(&session.line_starting_with("background pid is "));
    session.send("false");
    session.send("status");
    session.expect_line("exit value 1");

    assert_eq!(session.finish().code(), Some(1));
    assert!(eventually(Duration::from_secs(10), || process_is_gone(pid)));
}

#[test]
fn test_signaled_foreground_command_exit_code() {
    let wd = WorkDir::new();
    wd.write_file("die.sh", "kill -TERM $$\n");

    let output = wd.command(&["-c", "sh die.sh"]).output().unwrap();
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "terminated by signal 15\n"
    );
    assert_eq!(output.status.code(), Some(143));
}
