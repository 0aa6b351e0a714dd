use std::time::Duration;

/// A task whose retries were exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTask {
    pub url: String,
    pub attempts: u32,
    pub error: String,
}

/// Final tally of a completed job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub total_tasks: usize,
    pub total_batches: usize,
    pub stored: usize,
    pub skipped: usize,
    pub failed: Vec<FailedTask>,
    /// Inter-batch delays actually waited.
    pub delays: usize,
    pub elapsed: Duration,
}

impl JobSummary {
    pub fn processed(&self) -> usize {
        self.stored + self.skipped + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}
