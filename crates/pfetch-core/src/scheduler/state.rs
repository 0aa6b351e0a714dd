//! Counters and phase of a running job.

use std::time::Instant;

use crate::progress::{BatchPosition, FailedTask, JobSummary, TaskOutcome, TaskPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    /// Running the batch with this 0-based index.
    RunningBatch(usize),
    /// Waiting after the batch with this 0-based index.
    DelayingBetweenBatches { after: usize },
    Finished,
}

/// Single owner of the job's counters; events are built from it so every
/// position a renderer sees is consistent with every other.
#[derive(Debug)]
pub struct SchedulerState {
    phase: SchedulerPhase,
    total_tasks: usize,
    total_batches: usize,
    tasks_done: usize,
    stored: usize,
    skipped: usize,
    failed: Vec<FailedTask>,
    delays: usize,
    started: Instant,
}

impl SchedulerState {
    pub fn new(total_tasks: usize, total_batches: usize) -> Self {
        Self {
            phase: SchedulerPhase::Idle,
            total_tasks,
            total_batches,
            tasks_done: 0,
            stored: 0,
            skipped: 0,
            failed: Vec::new(),
            delays: 0,
            started: Instant::now(),
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn tasks_done(&self) -> usize {
        self.tasks_done
    }

    pub fn total_tasks(&self) -> usize {
        self.total_tasks
    }

    pub fn enter_batch(&mut self, index: usize) {
        debug_assert!(index < self.total_batches);
        self.phase = SchedulerPhase::RunningBatch(index);
    }

    pub fn enter_delay(&mut self, after: usize) {
        debug_assert_eq!(self.phase, SchedulerPhase::RunningBatch(after));
        self.phase = SchedulerPhase::DelayingBetweenBatches { after };
    }

    pub fn delay_finished(&mut self) {
        self.delays += 1;
    }

    pub fn finish(&mut self) {
        self.phase = SchedulerPhase::Finished;
    }

    /// Position of the task at 0-based `index` in the list.
    pub fn task_position(&self, index: usize) -> TaskPosition {
        TaskPosition {
            number: index + 1,
            total: self.total_tasks,
        }
    }

    pub fn batch_position(&self, index: usize) -> BatchPosition {
        BatchPosition {
            number: index + 1,
            total: self.total_batches,
        }
    }

    pub fn record(&mut self, url: &str, outcome: &TaskOutcome) {
        self.tasks_done += 1;
        match outcome {
            TaskOutcome::Stored { .. } => self.stored += 1,
            TaskOutcome::Skipped { .. } => self.skipped += 1,
            TaskOutcome::Failed { attempts, error } => self.failed.push(FailedTask {
                url: url.to_string(),
                attempts: *attempts,
                error: error.clone(),
            }),
        }
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            total_tasks: self.total_tasks,
            total_batches: self.total_batches,
            stored: self.stored,
            skipped: self.skipped,
            failed: self.failed.clone(),
            delays: self.delays,
            elapsed: self.started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn counters_follow_outcomes() {
        let mut s = SchedulerState::new(3, 1);
        assert_eq!(s.phase(), SchedulerPhase::Idle);
        s.enter_batch(0);
        s.record(
            "a",
            &TaskOutcome::Stored {
                path: PathBuf::from("a"),
                bytes: 1,
                attempts: 1,
                sha256: String::new(),
            },
        );
        s.record("b", &TaskOutcome::Skipped { path: PathBuf::from("b") });
        s.record(
            "c",
            &TaskOutcome::Failed {
                attempts: 10,
                error: "HTTP 500".into(),
            },
        );
        s.finish();
        let sum = s.summary();
        assert_eq!(s.phase(), SchedulerPhase::Finished);
        assert_eq!(sum.processed(), 3);
        assert_eq!(sum.failed[0].url, "c");
        assert!(!sum.all_succeeded());
    }

    #[test]
    fn positions_are_one_based() {
        let s = SchedulerState::new(137, 3);
        assert_eq!(s.task_position(0), TaskPosition { number: 1, total: 137 });
        assert_eq!(s.batch_position(2), BatchPosition { number: 3, total: 3 });
    }
}
