//! Retry loop: fetch, persist, then pay the polite delay.

use std::path::PathBuf;
use std::time::Duration;

use super::classify::classify;
use super::error::TaskError;
use super::policy::{RetryDecision, RetryState, MAX_ATTEMPTS};
use crate::checksum;
use crate::delay::DelayWindow;
use crate::fetch::Fetcher;
use crate::storage;
use crate::task::Task;

/// A task whose content is durably on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTask {
    pub path: PathBuf,
    pub bytes: u64,
    pub attempts: u32,
    pub sha256: String,
}

/// A failed attempt that will be retried (or was the last one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    /// 1-based attempt number.
    pub attempt: u32,
    pub attempts_remaining: u32,
    /// Wait before the next attempt (zero when none follows).
    pub backoff: Duration,
    pub error: String,
}

/// Wraps a [`Fetcher`] with bounded retries, local persistence, and the per-URL delay.
pub struct RetryingFetcher<'a> {
    fetcher: &'a dyn Fetcher,
    window: DelayWindow,
}

impl<'a> RetryingFetcher<'a> {
    /// `window` is used both for retry backoff and for the polite delay after each request.
    pub fn new(fetcher: &'a dyn Fetcher, window: DelayWindow) -> Self {
        Self { fetcher, window }
    }

    /// Fetches `task.url`, writes it to `task.output_path()`, and returns once
    /// the content is durable and the polite delay has passed.
    ///
    /// `on_failure` sees every failed attempt as it happens.
    pub async fn fetch_with_retry<F>(
        &self,
        task: &Task,
        mut on_failure: F,
    ) -> Result<FetchedTask, TaskError>
    where
        F: FnMut(&AttemptFailure),
    {
        let mut state = RetryState::armed(MAX_ATTEMPTS);
        loop {
            state.begin_attempt();
            let err = match self.fetcher.fetch(&task.url).await {
                Ok(content) => {
                    let fetched = persist(task, content, state.attempts_made()).await?;
                    self.polite_delay().await;
                    return Ok(fetched);
                }
                Err(e) => e,
            };

            let decision = state.after_failure(classify(&err), &self.window);
            let backoff = match decision {
                RetryDecision::RetryAfter(d) => d,
                _ => Duration::ZERO,
            };
            tracing::debug!(
                url = %task.url,
                attempt = state.attempts_made(),
                remaining = state.attempts_remaining(),
                error = %err,
                "fetch attempt failed"
            );
            on_failure(&AttemptFailure {
                attempt: state.attempts_made(),
                attempts_remaining: state.attempts_remaining(),
                backoff,
                error: err.to_string(),
            });

            match decision {
                RetryDecision::RetryAfter(d) => tokio::time::sleep(d).await,
                RetryDecision::Abort => {
                    return Err(TaskError::FetcherUnavailable {
                        url: task.url.clone(),
                        source: err,
                    })
                }
                RetryDecision::GiveUp => {
                    // Keeps request cadence uniform after a failed task too.
                    self.polite_delay().await;
                    return Err(TaskError::FetchExhausted {
                        url: task.url.clone(),
                        attempts: state.attempts_made(),
                        last_error: err.to_string(),
                    });
                }
            }
        }
    }

    async fn polite_delay(&self) {
        let d = self.window.draw();
        if !d.is_zero() {
            tokio::time::sleep(d).await;
        }
    }
}

async fn persist(task: &Task, content: Vec<u8>, attempts: u32) -> Result<FetchedTask, TaskError> {
    let path = task.output_path();
    let write_path = path.clone();
    let written = tokio::task::spawn_blocking(move || {
        storage::write_output(&write_path, &content)?;
        Ok::<_, anyhow::Error>((content.len() as u64, checksum::sha256_bytes(&content)))
    })
    .await
    .map_err(anyhow::Error::from)
    .and_then(|r| r);

    match written {
        Ok((bytes, sha256)) => Ok(FetchedTask {
            path,
            bytes,
            attempts,
            sha256,
        }),
        Err(source) => Err(TaskError::Write { path, source }),
    }
}
