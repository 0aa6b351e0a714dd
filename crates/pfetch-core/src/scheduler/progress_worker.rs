//! Background task that journals task outcomes and forwards events to a renderer.

use tokio::sync::mpsc::UnboundedReceiver;

use crate::journal::{Journal, RunCounts, RunId};
use crate::progress::{ProgressEvent, TaskOutcome};

/// Drains `rx` until the scheduler's sink is dropped.
///
/// Every `TaskCompleted` is written to `journal` (when given) before the event
/// reaches `render`. Returns the tallied outcomes, which stay accurate even if
/// the job stopped on a fatal error. Spawn this with `tokio::spawn`.
pub async fn run_progress_worker<F>(
    mut rx: UnboundedReceiver<ProgressEvent>,
    journal: Option<(Journal, RunId)>,
    mut render: F,
) -> RunCounts
where
    F: FnMut(&ProgressEvent),
{
    let mut counts = RunCounts::default();
    while let Some(event) = rx.recv().await {
        if let ProgressEvent::TaskCompleted {
            task, url, outcome, ..
        } = &event
        {
            match outcome {
                TaskOutcome::Stored { .. } => counts.stored += 1,
                TaskOutcome::Skipped { .. } => counts.skipped += 1,
                TaskOutcome::Failed { .. } => counts.failed += 1,
            }
            if let Some((db, run_id)) = &journal {
                if let Err(e) = db.record_task(*run_id, task.number, url, outcome).await {
                    tracing::warn!(run_id, task = task.number, "journal write failed: {:#}", e);
                }
            }
        }
        render(&event);
    }
    counts
}
