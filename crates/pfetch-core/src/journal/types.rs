//! Row types for the run journal.

pub type RunId = i64;

/// Run state stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Completed,
    /// Stopped by a fatal error.
    Failed,
    /// Process ended while the run was still marked running.
    Interrupted,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
            RunState::Interrupted => "interrupted",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "running" => RunState::Running,
            "completed" => RunState::Completed,
            "failed" => RunState::Failed,
            _ => RunState::Interrupted,
        }
    }
}

/// Counters written when a run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub stored: i64,
    pub skipped: i64,
    pub failed: i64,
}

/// One row of `pfetch status`.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub id: RunId,
    pub url_set: String,
    pub state: RunState,
    pub total_tasks: i64,
    pub counts: RunCounts,
    pub started_at: i64,
    pub finished_at: Option<i64>,
}

/// Outcome of one task as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// 1-based position in the task list.
    pub task_number: i64,
    pub url: String,
    /// "stored", "skipped" or "failed".
    pub outcome: String,
    pub path: Option<String>,
    pub attempts: i64,
    pub bytes: Option<i64>,
    pub sha256: Option<String>,
    pub error: Option<String>,
}
