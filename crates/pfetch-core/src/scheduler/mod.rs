//! Batch scheduler.
//!
//! Runs a task list strictly in order: partition into batches, fetch each task
//! through the retry loop, hand stored files to the archive, and pause
//! between batches. Every step is reported to a [`ProgressSink`](crate::progress::ProgressSink).

mod error;
mod progress_worker;
mod run;
mod state;

pub use error::SchedulerError;
pub use progress_worker::run_progress_worker;
pub use run::BatchScheduler;
pub use state::{SchedulerPhase, SchedulerState};

#[cfg(test)]
mod tests;
