//! Fetch and task error types for retry classification.

use std::path::PathBuf;

/// Error returned by one fetch attempt.
/// Kept separate from anyhow so the retry loop can classify it.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Transfer-level failure (timeout, connection reset, DNS, ...).
    #[error("transfer failed: {0}")]
    Transfer(String),
    /// The fetch capability itself is unusable (e.g. browser process gone). Not retried.
    #[error("fetcher unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a task that did not produce a stored file.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Every attempt failed. Reported and skipped; the job continues.
    #[error("gave up on {url} after {attempts} attempts: {last_error}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
    /// The fetcher reported itself unusable. Ends the job.
    #[error("fetcher unusable while fetching {url}")]
    FetcherUnavailable {
        url: String,
        #[source]
        source: FetchError,
    },
    /// Content could not be written locally. Ends the job.
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl TaskError {
    /// True if the error must stop the whole job rather than just this task.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TaskError::FetchExhausted { .. })
    }
}
