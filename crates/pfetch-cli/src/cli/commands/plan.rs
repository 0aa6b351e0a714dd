//! `pfetch plan` – show the batch layout of a url-set without fetching.

use anyhow::Result;
use pfetch_core::chunker::{plan_batches, BatchSpan};
use pfetch_core::config::PfetchConfig;
use pfetch_core::delay::DelayWindow;
use std::path::Path;

use super::{default_output_dir, load_tasks};
use crate::cli::{batch_policy_from_flags, BatchArgs};

pub fn run_plan(cfg: &PfetchConfig, url_set: &Path, batch: &BatchArgs) -> Result<()> {
    let tasks = load_tasks(url_set, &default_output_dir(cfg, None)?)?;
    let policy = batch_policy_from_flags(cfg, batch)?;
    let timeouts = cfg.timeout_policy()?;
    let spans = plan_batches(tasks.len(), &policy)?;

    println!("{} URLs, policy {:?}", tasks.len(), policy);
    for (i, span) in spans.iter().enumerate() {
        println!("{}", span_line(i, spans.len(), span));
    }
    println!("per-URL delay:    {}", window_text(&timeouts.per_task));
    match &timeouts.between_batches {
        Some(w) => println!("between batches:  {}", window_text(w)),
        None => println!("between batches:  none"),
    }
    Ok(())
}

fn span_line(index: usize, total: usize, span: &BatchSpan) -> String {
    format!(
        "  batch {}/{}: URLs {}-{} ({})",
        index + 1,
        total,
        span.first_task_number(),
        span.last_task_number(),
        span.len()
    )
}

fn window_text(w: &DelayWindow) -> String {
    if w.is_zero() {
        "none".to_string()
    } else if w.min() == w.max() {
        format!("{}s", w.min().as_secs())
    } else {
        format!("{}-{}s", w.min().as_secs(), w.max().as_secs())
    }
}
