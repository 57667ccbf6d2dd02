use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use nix::errno::Errno;
use nix::libc;
use nix::unistd;

pub fn get_terminal() -> RawFd {
    io::stdin().as_raw_fd()
}

/// Is stdin a terminal? Errors count as "no".
pub fn stdin_is_terminal() -> bool {
    let temp_result = unistd::isatty(get_terminal());
    log_if_err!(temp_result, "unistd::isatty");
    temp_result.unwrap_or(false)
}

/// Writes all of `buf` to stdout with `write(2)`, bypassing Rust's buffered
/// stdout.
///
/// Async-signal-safe: it neither allocates nor takes a lock, so it may be
/// called from a signal handler or from a child between `fork` and `exec`.
/// Errors are ignored.
pub fn write_stdout(buf: &[u8]) {
    let mut written = 0;
    while written < buf.len() {
        match unistd::write(libc::STDOUT_FILENO, &buf[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
}

/// Terminates a forked child immediately, without running exit handlers or
/// flushing stdio buffers inherited from the shell.
pub fn exit_child(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}
