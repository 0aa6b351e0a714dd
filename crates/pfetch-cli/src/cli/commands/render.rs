//! Plain-text rendering of scheduler progress events.

use pfetch_core::progress::{ProgressEvent, TaskOutcome};
use std::io::Write;

/// Prints one event. Countdown ticks overwrite a single line.
pub fn print_event(event: &ProgressEvent) {
    let Some(line) = describe(event) else {
        return;
    };
    if let ProgressEvent::DelayTick(tick) = event {
        print!("\r{}", line);
        if tick.remaining_secs() == 0 {
            println!();
        }
        let _ = std::io::stdout().flush();
    } else {
        println!("{}", line);
    }
}

/// Text for `event`, or `None` for events that print nothing.
pub fn describe(event: &ProgressEvent) -> Option<String> {
    let line = match event {
        ProgressEvent::JobStarted {
            total_tasks,
            total_batches,
        } => format!("Fetching {} URLs in {} batch(es)", total_tasks, total_batches),
        ProgressEvent::BatchStarted {
            batch,
            first_task,
            last_task,
            size,
        } => format!(
            "Batch {}/{}: URLs {}-{} ({})",
            batch.number, batch.total, first_task, last_task, size
        ),
        ProgressEvent::TaskStarted { task, label, url } => {
            format!("[{}/{}] {}  {}", task.number, task.total, label, url)
        }
        ProgressEvent::AttemptFailed {
            attempt,
            attempts_remaining: 0,
            error,
            ..
        } => format!("  attempt {} failed: {}; giving up", attempt, error),
        ProgressEvent::AttemptFailed {
            attempt,
            attempts_remaining,
            backoff_ms,
            error,
            ..
        } => format!(
            "  attempt {} failed: {}; {} left, retrying in {:.1}s",
            attempt,
            error,
            attempts_remaining,
            *backoff_ms as f64 / 1000.0
        ),
        ProgressEvent::TaskCompleted { outcome, .. } => match outcome {
            TaskOutcome::Stored {
                path,
                bytes,
                attempts,
                ..
            } if *attempts > 1 => format!(
                "  stored {} ({} bytes, {} attempts)",
                path.display(),
                bytes,
                attempts
            ),
            TaskOutcome::Stored { path, bytes, .. } => {
                format!("  stored {} ({} bytes)", path.display(), bytes)
            }
            TaskOutcome::Skipped { path } => format!("  skipped, {} exists", path.display()),
            TaskOutcome::Failed { attempts, error } => {
                format!("  FAILED after {} attempts: {}", attempts, error)
            }
        },
        ProgressEvent::BatchCompleted {
            batch,
            tasks_done,
            total_tasks,
            next_batch_size,
        } => {
            let next = next_batch_size
                .map(|n| format!(", next batch has {}", n))
                .unwrap_or_default();
            format!(
                "Batch {}/{} done: {}/{} URLs{}",
                batch.number, batch.total, tasks_done, total_tasks, next
            )
        }
        ProgressEvent::DelayStarted { total_secs, .. } => format!(
            "Pausing {:02}:{:02} before the next batch",
            total_secs / 60,
            total_secs % 60
        ),
        ProgressEvent::DelayTick(tick) => format!("  next batch in {}", tick.clock()),
        ProgressEvent::DelayFinished { .. } | ProgressEvent::JobFinished(_) => return None,
    };
    Some(line)
}
