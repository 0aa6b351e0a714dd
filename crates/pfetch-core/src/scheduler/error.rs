use crate::config::ConfigError;
use crate::retry::TaskError;

/// Why a job stopped before finishing.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// Spans handed to `run_batches` that do not tile the task list.
    #[error("batch plan does not cover {total} task(s) in order (at batch index {batch})")]
    BatchPlan { batch: usize, total: usize },
    /// A fatal task error. Tasks completed before it are already on disk.
    #[error(transparent)]
    Task(#[from] TaskError),
}
