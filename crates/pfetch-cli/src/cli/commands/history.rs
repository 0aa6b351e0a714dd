//! `pfetch history` – task outcomes of one run.

use anyhow::{bail, Result};
use pfetch_core::journal::{Journal, RunId, TaskRecord};

pub async fn run_history(journal: &Journal, id: RunId, failed_only: bool) -> Result<()> {
    let Some(run) = journal.get_run(id).await? else {
        bail!("no run with id {}", id);
    };
    println!(
        "Run {} ({}): {} of {} tasks recorded from {}",
        run.id,
        run.state.as_str(),
        run.counts.stored + run.counts.skipped + run.counts.failed,
        run.total_tasks,
        run.url_set
    );

    let records = journal.task_results(id).await?;
    println!("{:<6} {:<8} {:>8} {}", "TASK", "OUTCOME", "ATTEMPTS", "URL");
    for r in records.iter().filter(|r| !failed_only || r.outcome == "failed") {
        println!(
            "{:<6} {:<8} {:>8} {}  {}",
            r.task_number,
            r.outcome,
            r.attempts,
            r.url,
            detail(r)
        );
    }
    Ok(())
}

fn detail(r: &TaskRecord) -> String {
    match (&r.error, &r.path) {
        (Some(err), _) => err.clone(),
        (None, Some(path)) => path.clone(),
        (None, None) => String::new(),
    }
}
