//! Logging init: append to a file under the XDG state dir, or write to stderr.
//!
//! The filter comes from `RUST_LOG`, then `[log] level` in the config file,
//! then `info,pfetch=debug`.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

const DEFAULT_FILTER: &str = "info,pfetch=debug";

/// A cloned log file handle, or stderr when the clone fails.
enum LogWriter {
    File(fs::File),
    Stderr,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogWriter::File(f) => f.write(buf),
            LogWriter::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogWriter::File(f) => f.flush(),
            LogWriter::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct LogFile(fs::File);

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(LogWriter::File)
            .unwrap_or(LogWriter::Stderr)
    }
}

/// The filter to install and, when `[log] level` did not parse, a message saying so.
struct FilterChoice {
    filter: EnvFilter,
    rejected_level: Option<String>,
}

fn choose_filter(env: Option<&str>, level: Option<&str>) -> FilterChoice {
    if let Some(filter) = env.and_then(|e| EnvFilter::try_new(e).ok()) {
        return FilterChoice {
            filter,
            rejected_level: None,
        };
    }
    let default = || EnvFilter::new(DEFAULT_FILTER);
    match level.map(str::trim).filter(|l| !l.is_empty()) {
        Some(l) => match EnvFilter::try_new(l) {
            Ok(filter) => FilterChoice {
                filter,
                rejected_level: None,
            },
            Err(e) => FilterChoice {
                filter: default(),
                rejected_level: Some(format!("ignoring [log] level {:?}: {}", l, e)),
            },
        },
        None => FilterChoice {
            filter: default(),
            rejected_level: None,
        },
    }
}

fn filter_from(cfg: &LogConfig) -> FilterChoice {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    choose_filter(env.as_deref(), cfg.level.as_deref())
}

/// `~/.local/state/pfetch/pfetch.log`; creates the directory.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pfetch")?;
    xdg_dirs
        .place_state_file("pfetch.log")
        .context("create pfetch state directory")
}

/// Install the global subscriber described by `cfg`.
/// Returns Err (without installing anything) if the log file cannot be opened.
pub fn init_logging(cfg: &LogConfig) -> Result<()> {
    if cfg.stderr {
        init_logging_stderr(cfg);
        return Ok(());
    }

    let path = log_file_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let choice = filter_from(cfg);
    tracing_subscriber::fmt()
        .with_env_filter(choice.filter)
        .with_writer(BoxMakeWriter::new(LogFile(file)))
        .with_ansi(false)
        .init();

    tracing::info!("pfetch logging to {}", path.display());
    if let Some(msg) = choice.rejected_level {
        tracing::warn!("{}", msg);
    }
    Ok(())
}

/// Stderr-only logging, for `[log] stderr = true` or when [`init_logging`] fails.
pub fn init_logging_stderr(cfg: &LogConfig) {
    let choice = filter_from(cfg);
    tracing_subscriber::fmt()
        .with_env_filter(choice.filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
    if let Some(msg) = choice.rejected_level {
        tracing::warn!("{}", msg);
    }
}
