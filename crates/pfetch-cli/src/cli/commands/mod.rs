//! CLI command handlers, one file per command.

mod checksum;
mod completions;
mod history;
mod plan;
mod render;
mod run;
mod status;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use history::run_history;
pub use plan::run_plan;
pub use run::{run_fetch, RunOptions};
pub use status::run_status;

use anyhow::{Context, Result};
use pfetch_core::config::PfetchConfig;
use pfetch_core::task::{self, Task};
use std::path::{Path, PathBuf};

/// Folder for records that name none: flag, then config, then the current dir.
fn default_output_dir(cfg: &PfetchConfig, flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = flag.or(cfg.output_dir.as_deref()) {
        return Ok(dir.to_path_buf());
    }
    std::env::current_dir().context("current directory")
}

fn load_tasks(url_set: &Path, default_folder: &Path) -> Result<Vec<Task>> {
    task::load_url_set(url_set, default_folder)
        .with_context(|| format!("load url set {}", url_set.display()))
}
