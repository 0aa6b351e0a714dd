//! `pfetch run` – fetch a url-set batch by batch.

use anyhow::{Context, Result};
use pfetch_core::config::PfetchConfig;
use pfetch_core::fetch::{CurlFetcher, CurlFetcherOptions};
use pfetch_core::journal::{Journal, RunState};
use pfetch_core::progress::{ChannelSink, JobSummary};
use pfetch_core::scheduler::{self, BatchScheduler};
use pfetch_core::storage;
use pfetch_core::store::{DirStore, NullStore, Store};
use std::path::PathBuf;
use std::sync::Arc;

use super::render::print_event;
use super::{default_output_dir, load_tasks};
use crate::cli::{batch_policy_from_flags, BatchArgs};

#[derive(Debug)]
pub struct RunOptions {
    pub url_set: PathBuf,
    pub batch: BatchArgs,
    pub no_batch_delay: bool,
    pub skip_existing: bool,
    pub output_dir: Option<PathBuf>,
    pub archive_dir: Option<PathBuf>,
}

pub async fn run_fetch(journal: &Journal, cfg: &PfetchConfig, opts: RunOptions) -> Result<()> {
    let recovered = journal.recover_running_runs().await?;
    if recovered > 0 {
        tracing::info!("marked {} unfinished run(s) as interrupted", recovered);
    }

    let default_folder = default_output_dir(cfg, opts.output_dir.as_deref())?;
    let tasks = load_tasks(&opts.url_set, &default_folder)?;

    let mut removed = 0usize;
    for task in &tasks {
        if storage::remove_stale_part(&task.output_path())? {
            removed += 1;
        }
    }
    if removed > 0 {
        tracing::info!(removed, "removed partial files from an earlier run");
    }

    let policy = batch_policy_from_flags(cfg, &opts.batch)?;
    let mut timeouts = cfg.timeout_policy()?;
    if opts.no_batch_delay {
        timeouts.between_batches = None;
    }

    let store: Arc<dyn Store> = match opts.archive_dir.or_else(|| cfg.store.archive_dir.clone()) {
        Some(root) => {
            tracing::debug!(root = %root.display(), "archiving to directory");
            Arc::new(DirStore::new(root))
        }
        None => Arc::new(NullStore),
    };
    let fetcher = Arc::new(CurlFetcher::new(CurlFetcherOptions::from(&cfg.fetch)));

    let (sink, rx) = ChannelSink::channel();
    let scheduler = BatchScheduler::new(fetcher, store, Arc::new(sink), policy, timeouts)?
        .skip_existing(opts.skip_existing);

    let run_id = journal
        .begin_run(&opts.url_set.display().to_string(), tasks.len())
        .await?;
    let worker = tokio::spawn(scheduler::run_progress_worker(
        rx,
        Some((journal.clone(), run_id)),
        print_event,
    ));

    let result = scheduler.run(&tasks).await;
    // Closes the event channel so the worker drains and exits.
    drop(scheduler);
    let counts = worker.await.context("progress worker panicked")?;

    match result {
        Ok(summary) => {
            journal.finish_run(run_id, RunState::Completed, counts).await?;
            print_summary(run_id, &summary);
            Ok(())
        }
        Err(e) => {
            journal.finish_run(run_id, RunState::Failed, counts).await?;
            Err(anyhow::Error::from(e).context(format!("run {} stopped", run_id)))
        }
    }
}

fn print_summary(run_id: i64, summary: &JobSummary) {
    println!(
        "Run {} finished in {:.0}s: {} stored, {} skipped, {} failed ({} batches)",
        run_id,
        summary.elapsed.as_secs_f64(),
        summary.stored,
        summary.skipped,
        summary.failed.len(),
        summary.total_batches
    );
    for f in &summary.failed {
        println!("  failed: {} ({} attempts): {}", f.url, f.attempts, f.error);
    }
}
