//! Shell-independent data: parsed commands, termination statuses, and the
//! table of background jobs.

pub mod job;
pub mod parser;
pub mod status;
