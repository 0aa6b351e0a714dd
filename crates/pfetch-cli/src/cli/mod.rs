//! CLI for pfetch.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pfetch_core::chunker::BatchPolicy;
use pfetch_core::config::{self, ConfigError, PfetchConfig};
use pfetch_core::journal::Journal;
use std::path::PathBuf;

use commands::{run_checksum, run_completions, run_fetch, run_history, run_plan, run_status, RunOptions};

/// Top-level CLI for pfetch.
#[derive(Debug, Parser)]
#[command(name = "pfetch")]
#[command(about = "pfetch: polite, resumable batch page fetcher", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Per-run overrides of the `[batch]` config section.
#[derive(Debug, Clone, Default, Args)]
pub struct BatchArgs {
    /// Fixed batch size.
    #[arg(long, value_name = "N", conflicts_with_all = ["batch_min", "batch_max", "no_batch"])]
    pub batch_size: Option<usize>,
    /// Smallest random batch size (needs --batch-max).
    #[arg(long, value_name = "N", conflicts_with = "no_batch")]
    pub batch_min: Option<usize>,
    /// Largest random batch size (needs --batch-min).
    #[arg(long, value_name = "N", conflicts_with = "no_batch")]
    pub batch_max: Option<usize>,
    /// Run the whole list as one batch.
    #[arg(long)]
    pub no_batch: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch every URL of a url-set file, batch by batch.
    Run {
        /// JSON url-set file.
        url_set: PathBuf,
        #[command(flatten)]
        batch: BatchArgs,
        /// Skip the pause between batches.
        #[arg(long)]
        no_batch_delay: bool,
        /// Do not fetch URLs whose output file already exists.
        #[arg(long)]
        skip_existing: bool,
        /// Folder for records without an output folder (default: config, then current dir).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Mirror stored files into this directory.
        #[arg(long, value_name = "DIR")]
        archive_dir: Option<PathBuf>,
    },

    /// Show how a url-set would be split into batches, without fetching.
    Plan {
        url_set: PathBuf,
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// List recent runs.
    Status {
        /// Number of runs to show.
        #[arg(long, default_value = "20", value_name = "N")]
        limit: u32,
    },

    /// Show task outcomes of one run.
    History {
        /// Run identifier (see `pfetch status`).
        id: i64,
        /// Only list failed tasks.
        #[arg(long)]
        failed: bool,
    },

    /// Print SHA-256 of files, or verify a run's stored files against the journal.
    Checksum {
        /// Files to hash.
        #[arg(required_unless_present = "run")]
        paths: Vec<PathBuf>,
        /// Verify every file stored by this run.
        #[arg(long, value_name = "ID", conflicts_with = "paths")]
        run: Option<i64>,
    },

    /// Print shell completions to stdout.
    Completions {
        shell: clap_complete::Shell,
    },
}

/// Batch policy for this invocation: flags win over the config file.
pub fn batch_policy_from_flags(cfg: &PfetchConfig, args: &BatchArgs) -> Result<BatchPolicy, ConfigError> {
    let policy = if args.no_batch {
        BatchPolicy::whole_list()
    } else if let Some(size) = args.batch_size {
        BatchPolicy::Uniform { size }
    } else {
        match (args.batch_min, args.batch_max) {
            (Some(min), Some(max)) => BatchPolicy::Randomized { min, max },
            (None, None) => return cfg.batch_policy(),
            _ => return Err(ConfigError::PartialBatchRange),
        }
    };
    policy.validate()?;
    Ok(policy)
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Checksum { paths, run: None } => run_checksum(&paths, None).await?,
            CliCommand::Checksum { run: Some(id), .. } => {
                let journal = Journal::open_default().await?;
                run_checksum(&[], Some((&journal, id))).await?;
            }
            CliCommand::Status { limit } => {
                let journal = Journal::open_default().await?;
                run_status(&journal, limit).await?;
            }
            CliCommand::History { id, failed } => {
                let journal = Journal::open_default().await?;
                run_history(&journal, id, failed).await?;
            }
            CliCommand::Plan { url_set, batch } => {
                let cfg = config::load_or_init()?;
                run_plan(&cfg, &url_set, &batch)?;
            }
            CliCommand::Run {
                url_set,
                batch,
                no_batch_delay,
                skip_existing,
                output_dir,
                archive_dir,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let journal = Journal::open_default().await?;
                let opts = RunOptions {
                    url_set,
                    batch,
                    no_batch_delay,
                    skip_existing,
                    output_dir,
                    archive_dir,
                };
                run_fetch(&journal, &cfg, opts).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
