//! Background job tracking.
//!
//! The `JobTable` holds the pids of running background processes in launch
//! order. It has a fixed capacity; a pid pushed onto a full table is not
//! tracked (the process still runs, it just never gets reaped or reported).

use std::fmt;

use failure::ResultExt;
use nix::sys::wait::{self, WaitPidFlag};
use nix::unistd::Pid;

use crate::core::status::TerminationStatus;
use crate::errors::{ErrorKind, Result};

/// Number of background jobs tracked at once.
pub const JOB_TABLE_CAPACITY: usize = 100;

/// A background job that `JobTable::reap` observed as terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletedJob {
    pub pid: Pid,
    pub status: TerminationStatus,
}

impl fmt::Display for CompletedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "background pid {} is done: {}", self.pid, self.status)
    }
}

pub struct JobTable {
    pids: Vec<Pid>,
    capacity: usize,
}

impl JobTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pids: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.pids.len() >= self.capacity
    }

    /// Tracked pids, oldest first.
    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    /// Starts tracking `pid`.
    ///
    /// Returns `false` and leaves the table unchanged if the table is full or
    /// already tracks `pid`.
    pub fn push(&mut self, pid: Pid) -> bool {
        if self.contains(pid) {
            warn!("background pid {} is already tracked", pid);
            return false;
        }

        if self.is_full() {
            warn!(
                "job table is full ({} jobs), not tracking background pid {}",
                self.capacity, pid
            );
            return false;
        }

        debug!("tracking background pid {}", pid);
        self.pids.push(pid);
        true
    }

    /// Checks every job without blocking. Terminated jobs are removed and
    /// returned in launch order; the rest keep their relative order.
    pub fn reap(&mut self) -> Vec<CompletedJob> {
        self.reap_with(poll_process)
    }

    /// Like `reap`, with `poll` deciding whether a pid has terminated.
    ///
    /// A pid whose poll fails is dropped from the table, since it will never
    /// be reported.
    pub fn reap_with<F>(&mut self, mut poll: F) -> Vec<CompletedJob>
    where
        F: FnMut(Pid) -> Result<Option<TerminationStatus>>,
    {
        let mut completed = Vec::new();
        self.pids.retain(|&pid| match poll(pid) {
            Ok(Some(status)) => {
                debug!("background pid {} finished with {}", pid, status);
                completed.push(CompletedJob { pid, status });
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(
                    "failed to check background pid {}, no longer tracking it: {}",
                    pid, e
                );
                false
            }
        });
        completed
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::with_capacity(JOB_TABLE_CAPACITY)
    }
}

impl fmt::Debug for JobTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} jobs\tcapacity: {}", self.pids.len(), self.capacity)?;
        for pid in &self.pids {
            writeln!(f, "pid: {}", pid)?;
        }

        Ok(())
    }
}

/// Checks whether `pid` has terminated, without blocking.
pub fn poll_process(pid: Pid) -> Result<Option<TerminationStatus>> {
    let wait_status = wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)).context(ErrorKind::Nix)?;
    Ok(TerminationStatus::from_wait_status(wait_status))
}
