//! Progress events emitted by the batch scheduler.
//!
//! Every event carries absolute counters (task n of N, batch b of B, seconds
//! elapsed of total) so a renderer never has to keep its own tally. Events
//! are emitted in the order things happen; sinks must not reorder them.

mod sink;
mod summary;

pub use sink::{ChannelSink, CollectingSink, NullSink, ProgressSink};
pub use summary::{FailedTask, JobSummary};

use std::path::PathBuf;

use crate::delay::DelayTick;

/// 1-based position of a task in the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPosition {
    pub number: usize,
    pub total: usize,
}

/// 1-based position of a batch among all batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPosition {
    pub number: usize,
    pub total: usize,
}

impl BatchPosition {
    pub fn is_last(&self) -> bool {
        self.number >= self.total
    }
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Stored {
        path: PathBuf,
        bytes: u64,
        attempts: u32,
        sha256: String,
    },
    /// Output already present; nothing fetched.
    Skipped { path: PathBuf },
    /// Every attempt failed.
    Failed { attempts: u32, error: String },
}

impl TaskOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TaskOutcome::Stored { .. } => "stored",
            TaskOutcome::Skipped { .. } => "skipped",
            TaskOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    JobStarted {
        total_tasks: usize,
        total_batches: usize,
    },
    BatchStarted {
        batch: BatchPosition,
        /// 1-based number of the first task in the batch.
        first_task: usize,
        /// 1-based number of the last task in the batch.
        last_task: usize,
        size: usize,
    },
    TaskStarted {
        task: TaskPosition,
        label: String,
        url: String,
    },
    AttemptFailed {
        task: TaskPosition,
        attempt: u32,
        attempts_remaining: u32,
        backoff_ms: u64,
        error: String,
    },
    TaskCompleted {
        task: TaskPosition,
        label: String,
        url: String,
        outcome: TaskOutcome,
    },
    BatchCompleted {
        batch: BatchPosition,
        /// Tasks finished so far across the whole job.
        tasks_done: usize,
        total_tasks: usize,
        /// Size of the following batch, if any.
        next_batch_size: Option<usize>,
    },
    DelayStarted {
        after_batch: BatchPosition,
        total_secs: u64,
    },
    DelayTick(DelayTick),
    DelayFinished {
        after_batch: BatchPosition,
    },
    JobFinished(JobSummary),
}

impl ProgressEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::JobStarted { .. } => "job_started",
            ProgressEvent::BatchStarted { .. } => "batch_started",
            ProgressEvent::TaskStarted { .. } => "task_started",
            ProgressEvent::AttemptFailed { .. } => "attempt_failed",
            ProgressEvent::TaskCompleted { .. } => "task_completed",
            ProgressEvent::BatchCompleted { .. } => "batch_completed",
            ProgressEvent::DelayStarted { .. } => "delay_started",
            ProgressEvent::DelayTick(_) => "delay_tick",
            ProgressEvent::DelayFinished { .. } => "delay_finished",
            ProgressEvent::JobFinished(_) => "job_finished",
        }
    }
}
