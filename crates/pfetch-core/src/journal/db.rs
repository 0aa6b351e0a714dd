//! Connection handling and schema.

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Percent-encode a path for a sqlite:// URI.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the run journal.
///
/// The default database lives at `~/.local/state/pfetch/runs.db`.
#[derive(Clone)]
pub struct Journal {
    pub(crate) pool: Pool<Sqlite>,
}

impl Journal {
    /// Open (or create) the default journal and run migrations.
    pub async fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("pfetch")?;
        let db_path = xdg_dirs
            .place_state_file("runs.db")
            .context("create pfetch state directory")?;
        Self::open_at(db_path).await
    }

    /// Open (or create) the journal at `path`, creating parent directories.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&uri)
            .await
            .with_context(|| format!("open journal {}", path.display()))?;
        let journal = Journal { pool };
        journal.migrate().await?;
        Ok(journal)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url_set TEXT NOT NULL,
                state TEXT NOT NULL,
                total_tasks INTEGER NOT NULL,
                stored INTEGER NOT NULL DEFAULT 0,
                skipped INTEGER NOT NULL DEFAULT 0,
                failed INTEGER NOT NULL DEFAULT 0,
                started_at INTEGER NOT NULL,
                finished_at INTEGER,
                pid INTEGER
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Journals created before runs recorded their owning process.
        let has_pid: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('runs') WHERE name = 'pid'",
        )
        .fetch_one(&self.pool)
        .await?;
        if has_pid == 0 {
            sqlx::query("ALTER TABLE runs ADD COLUMN pid INTEGER")
                .execute(&self.pool)
                .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS task_results (
                run_id INTEGER NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
                task_number INTEGER NOT NULL,
                url TEXT NOT NULL,
                outcome TEXT NOT NULL,
                path TEXT,
                attempts INTEGER NOT NULL,
                bytes INTEGER,
                sha256 TEXT,
                error TEXT,
                recorded_at INTEGER NOT NULL,
                PRIMARY KEY (run_id, task_number)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Whether process `pid` still exists. Only answerable through `/proc`;
/// elsewhere every other process counts as gone.
pub(crate) fn process_alive(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    cfg!(target_os = "linux") && Path::new("/proc").join(pid.to_string()).exists()
}

pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
/// In-memory journal for tests.
pub(crate) async fn open_memory() -> Result<Journal> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let journal = Journal { pool };
    journal.migrate().await?;
    Ok(journal)
}
