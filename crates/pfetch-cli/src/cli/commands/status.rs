//! `pfetch status` – list recent runs.

use anyhow::Result;
use pfetch_core::journal::Journal;
use std::time::{SystemTime, UNIX_EPOCH};

pub async fn run_status(journal: &Journal, limit: u32) -> Result<()> {
    let runs = journal.list_runs(limit).await?;
    if runs.is_empty() {
        println!("No runs recorded.");
        return Ok(());
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    println!(
        "{:<6} {:<12} {:>6} {:>7} {:>7} {:>7} {:<10} {}",
        "ID", "STATE", "TASKS", "STORED", "SKIPPED", "FAILED", "STARTED", "URL SET"
    );
    for r in runs {
        println!(
            "{:<6} {:<12} {:>6} {:>7} {:>7} {:>7} {:<10} {}",
            r.id,
            r.state.as_str(),
            r.total_tasks,
            r.counts.stored,
            r.counts.skipped,
            r.counts.failed,
            format_age(now - r.started_at),
            r.url_set
        );
    }
    Ok(())
}

/// Coarse "how long ago" for a number of seconds.
fn format_age(secs: i64) -> String {
    match secs.max(0) {
        s if s < 60 => format!("{}s ago", s),
        s if s < 3600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3600),
        s => format!("{}d ago", s / 86_400),
    }
}
