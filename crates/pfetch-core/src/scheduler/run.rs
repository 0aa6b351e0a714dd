//! The batch execution loop.

use std::sync::Arc;

use crate::chunker::{plan_batches, BatchPolicy, BatchSpan};
use crate::config::ConfigError;
use crate::delay::{run_countdown, Countdown, TimeoutPolicy};
use crate::fetch::Fetcher;
use crate::progress::{JobSummary, ProgressEvent, ProgressSink, TaskOutcome, TaskPosition};
use crate::retry::{RetryingFetcher, TaskError};
use crate::store::Store;
use crate::task::Task;

use super::{SchedulerError, SchedulerState};

/// Sequential batch runner. One task in flight at a time.
pub struct BatchScheduler {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn Store>,
    sink: Arc<dyn ProgressSink>,
    batch_policy: BatchPolicy,
    timeouts: TimeoutPolicy,
    skip_existing: bool,
}

impl BatchScheduler {
    /// Fails if `batch_policy` is invalid.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn Store>,
        sink: Arc<dyn ProgressSink>,
        batch_policy: BatchPolicy,
        timeouts: TimeoutPolicy,
    ) -> Result<Self, ConfigError> {
        batch_policy.validate()?;
        Ok(Self {
            fetcher,
            store,
            sink,
            batch_policy,
            timeouts,
            skip_existing: false,
        })
    }

    /// Skip tasks whose output file already exists and is non-empty.
    pub fn skip_existing(mut self, yes: bool) -> Self {
        self.skip_existing = yes;
        self
    }

    pub fn batch_policy(&self) -> BatchPolicy {
        self.batch_policy
    }

    /// Plans batches for `tasks` and runs them.
    pub async fn run(&self, tasks: &[Task]) -> Result<JobSummary, SchedulerError> {
        let spans = plan_batches(tasks.len(), &self.batch_policy)?;
        self.run_batches(tasks, &spans).await
    }

    /// Runs `tasks` using pre-planned `spans`, which must cover the list in
    /// order without gaps or overlap.
    ///
    /// Archive copies started by the store are awaited before the job is
    /// reported finished, and also when a fatal error stops the job.
    pub async fn run_batches(
        &self,
        tasks: &[Task],
        spans: &[BatchSpan],
    ) -> Result<JobSummary, SchedulerError> {
        check_spans(tasks.len(), spans)?;

        let mut state = SchedulerState::new(tasks.len(), spans.len());
        self.sink.emit(ProgressEvent::JobStarted {
            total_tasks: tasks.len(),
            total_batches: spans.len(),
        });
        tracing::info!(tasks = tasks.len(), batches = spans.len(), "job started");

        let result = self.run_spans(tasks, spans, &mut state).await;
        self.store.flush().await;
        result?;

        state.finish();
        let summary = state.summary();
        tracing::info!(
            stored = summary.stored,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "job finished"
        );
        self.sink.emit(ProgressEvent::JobFinished(summary.clone()));
        Ok(summary)
    }

    async fn run_spans(
        &self,
        tasks: &[Task],
        spans: &[BatchSpan],
        state: &mut SchedulerState,
    ) -> Result<(), SchedulerError> {
        let retrying = RetryingFetcher::new(self.fetcher.as_ref(), self.timeouts.per_task);

        for (i, span) in spans.iter().enumerate() {
            state.enter_batch(i);
            let batch = state.batch_position(i);
            self.fetcher.begin_batch(i);
            tracing::info!(
                batch = batch.number,
                of = batch.total,
                first = span.first_task_number(),
                last = span.last_task_number(),
                "batch started"
            );
            self.sink.emit(ProgressEvent::BatchStarted {
                batch,
                first_task: span.first_task_number(),
                last_task: span.last_task_number(),
                size: span.len(),
            });

            for (offset, task) in span.slice(tasks).iter().enumerate() {
                let pos = state.task_position(span.start + offset);
                self.run_task(&retrying, task, pos, state).await?;
            }

            self.sink.emit(ProgressEvent::BatchCompleted {
                batch,
                tasks_done: state.tasks_done(),
                total_tasks: state.total_tasks(),
                next_batch_size: spans.get(i + 1).map(BatchSpan::len),
            });

            if batch.is_last() {
                break;
            }
            let Some(window) = self.timeouts.between_batches else {
                continue;
            };
            state.enter_delay(i);
            let countdown = Countdown::new(window.draw());
            tracing::info!(
                after_batch = batch.number,
                secs = countdown.total_secs(),
                "pausing between batches"
            );
            self.sink.emit(ProgressEvent::DelayStarted {
                after_batch: batch,
                total_secs: countdown.total_secs(),
            });
            run_countdown(countdown, |tick| {
                self.sink.emit(ProgressEvent::DelayTick(tick))
            })
            .await;
            state.delay_finished();
            self.sink.emit(ProgressEvent::DelayFinished { after_batch: batch });
        }
        Ok(())
    }

    async fn run_task(
        &self,
        retrying: &RetryingFetcher<'_>,
        task: &Task,
        pos: TaskPosition,
        state: &mut SchedulerState,
    ) -> Result<(), SchedulerError> {
        self.sink.emit(ProgressEvent::TaskStarted {
            task: pos,
            label: task.display_label.clone(),
            url: task.url.clone(),
        });

        let outcome = if self.skip_existing && task.has_existing_output() {
            tracing::debug!(url = %task.url, "output exists, skipping");
            TaskOutcome::Skipped {
                path: task.output_path(),
            }
        } else {
            let result = retrying
                .fetch_with_retry(task, |f| {
                    self.sink.emit(ProgressEvent::AttemptFailed {
                        task: pos,
                        attempt: f.attempt,
                        attempts_remaining: f.attempts_remaining,
                        backoff_ms: f.backoff.as_millis() as u64,
                        error: f.error.clone(),
                    })
                })
                .await;
            match result {
                Ok(fetched) => {
                    self.store.store(&fetched.path, &task.destination_key_prefix);
                    TaskOutcome::Stored {
                        path: fetched.path,
                        bytes: fetched.bytes,
                        attempts: fetched.attempts,
                        sha256: fetched.sha256,
                    }
                }
                Err(TaskError::FetchExhausted {
                    url,
                    attempts,
                    last_error,
                }) => {
                    tracing::warn!(%url, attempts, error = %last_error, "giving up on task");
                    TaskOutcome::Failed {
                        attempts,
                        error: last_error,
                    }
                }
                Err(e) => {
                    tracing::error!(url = %task.url, error = %e, "job stopped");
                    return Err(e.into());
                }
            }
        };

        state.record(&task.url, &outcome);
        self.sink.emit(ProgressEvent::TaskCompleted {
            task: pos,
            label: task.display_label.clone(),
            url: task.url.clone(),
            outcome,
        });
        Ok(())
    }
}

/// Spans must be non-empty, start at 0, follow each other with no gap and end
/// at `total`.
fn check_spans(total: usize, spans: &[BatchSpan]) -> Result<(), SchedulerError> {
    let mut next = 0;
    for (batch, span) in spans.iter().enumerate() {
        if span.start != next || span.is_empty() || span.end > total {
            return Err(SchedulerError::BatchPlan { batch, total });
        }
        next = span.end;
    }
    if next != total {
        return Err(SchedulerError::BatchPlan {
            batch: spans.len(),
            total,
        });
    }
    Ok(())
}
