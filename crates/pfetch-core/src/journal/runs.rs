//! Run and task-result reads and writes.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::db::{process_alive, unix_timestamp, Journal};
use super::types::{RunCounts, RunId, RunState, RunSummary, TaskRecord};
use crate::progress::TaskOutcome;

impl Journal {
    /// Insert a new run in state `running`.
    pub async fn begin_run(&self, url_set: &str, total_tasks: usize) -> Result<RunId> {
        let id = sqlx::query(
            r#"
            INSERT INTO runs (url_set, state, total_tasks, started_at, pid)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(url_set)
        .bind(RunState::Running.as_str())
        .bind(total_tasks as i64)
        .bind(unix_timestamp())
        .bind(std::process::id() as i64)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// Record how task `task_number` (1-based) ended. A later record for the
    /// same task replaces the earlier one.
    pub async fn record_task(
        &self,
        run_id: RunId,
        task_number: usize,
        url: &str,
        outcome: &TaskOutcome,
    ) -> Result<()> {
        let (path, attempts, bytes, sha256, error) = match outcome {
            TaskOutcome::Stored {
                path,
                bytes,
                attempts,
                sha256,
            } => (
                Some(path.display().to_string()),
                *attempts as i64,
                Some(*bytes as i64),
                Some(sha256.clone()),
                None,
            ),
            TaskOutcome::Skipped { path } => {
                (Some(path.display().to_string()), 0, None, None, None)
            }
            TaskOutcome::Failed { attempts, error } => {
                (None, *attempts as i64, None, None, Some(error.clone()))
            }
        };

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO task_results (
                run_id, task_number, url, outcome, path,
                attempts, bytes, sha256, error, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(run_id)
        .bind(task_number as i64)
        .bind(url)
        .bind(outcome.label())
        .bind(path)
        .bind(attempts)
        .bind(bytes)
        .bind(sha256)
        .bind(error)
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Close a run with its final state and counters.
    pub async fn finish_run(&self, run_id: RunId, state: RunState, counts: RunCounts) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE runs
            SET state = ?1,
                stored = ?2,
                skipped = ?3,
                failed = ?4,
                finished_at = ?5
            WHERE id = ?6
            "#,
        )
        .bind(state.as_str())
        .bind(counts.stored)
        .bind(counts.skipped)
        .bind(counts.failed)
        .bind(unix_timestamp())
        .bind(run_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark runs left in `running` by a crashed or killed process as interrupted.
    /// Runs whose process is still alive, including this one, are left alone.
    /// Returns how many were changed.
    pub async fn recover_running_runs(&self) -> Result<u64> {
        let rows = sqlx::query("SELECT id, pid FROM runs WHERE state = ?1")
            .bind(RunState::Running.as_str())
            .fetch_all(&self.pool)
            .await?;

        let mut changed = 0;
        for row in rows {
            let id: RunId = row.get("id");
            let pid: Option<i64> = row.get("pid");
            let owner = pid.and_then(|p| u32::try_from(p).ok());
            if owner.is_some_and(process_alive) {
                tracing::debug!(run = id, pid = ?owner, "run still owned by a live process");
                continue;
            }
            changed += sqlx::query("UPDATE runs SET state = ?1 WHERE id = ?2 AND state = ?3")
                .bind(RunState::Interrupted.as_str())
                .bind(id)
                .bind(RunState::Running.as_str())
                .execute(&self.pool)
                .await?
                .rows_affected();
        }
        Ok(changed)
    }

    /// Most recent runs first.
    pub async fn list_runs(&self, limit: u32) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url_set, state, total_tasks, stored, skipped, failed,
                   started_at, finished_at
            FROM runs
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(run_from_row).collect())
    }

    pub async fn get_run(&self, run_id: RunId) -> Result<Option<RunSummary>> {
        let row = sqlx::query(
            r#"
            SELECT id, url_set, state, total_tasks, stored, skipped, failed,
                   started_at, finished_at
            FROM runs
            WHERE id = ?1
            "#,
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(run_from_row))
    }

    /// Task outcomes of `run_id` in task order.
    pub async fn task_results(&self, run_id: RunId) -> Result<Vec<TaskRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT task_number, url, outcome, path, attempts, bytes, sha256, error
            FROM task_results
            WHERE run_id = ?1
            ORDER BY task_number ASC
            "#,
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TaskRecord {
                task_number: row.get("task_number"),
                url: row.get("url"),
                outcome: row.get("outcome"),
                path: row.get("path"),
                attempts: row.get("attempts"),
                bytes: row.get("bytes"),
                sha256: row.get("sha256"),
                error: row.get("error"),
            })
            .collect())
    }
}

fn run_from_row(row: &SqliteRow) -> RunSummary {
    let state: String = row.get("state");
    RunSummary {
        id: row.get("id"),
        url_set: row.get("url_set"),
        state: RunState::parse(&state),
        total_tasks: row.get("total_tasks"),
        counts: RunCounts {
            stored: row.get("stored"),
            skipped: row.get("skipped"),
            failed: row.get("failed"),
        },
        started_at: row.get("started_at"),
        finished_at: row.get("finished_at"),
    }
}
