//! Global configuration loaded from `~/.config/pfetch/config.toml`.
//!
//! The file only carries values; [`PfetchConfig::batch_policy`] and
//! [`PfetchConfig::timeout_policy`] turn them into validated policies for the
//! scheduler.

mod error;

pub use error::ConfigError;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::chunker::BatchPolicy;
use crate::delay::{DelayWindow, TimeoutPolicy};

/// How the task list is split into batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// When false the whole task list runs as a single batch.
    pub enabled: bool,
    /// Draw each batch size from `[min_size, max_size]` instead of using `size`.
    pub random: bool,
    /// Uniform batch size.
    pub size: usize,
    pub min_size: usize,
    pub max_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            random: true,
            size: 50,
            min_size: 50,
            max_size: 80,
        }
    }
}

/// Pause after every fetched URL, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlDelayConfig {
    pub required: bool,
    pub random: bool,
    pub uniform_secs: u64,
    pub min_secs: u64,
    pub max_secs: u64,
}

impl Default for UrlDelayConfig {
    fn default() -> Self {
        Self {
            required: true,
            random: true,
            uniform_secs: 0,
            min_secs: 3,
            max_secs: 6,
        }
    }
}

/// Pause between batches, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDelayConfig {
    pub required: bool,
    pub random: bool,
    pub uniform_minutes: u64,
    pub min_minutes: u64,
    pub max_minutes: u64,
}

impl Default for BatchDelayConfig {
    fn default() -> Self {
        Self {
            required: true,
            random: true,
            uniform_minutes: 0,
            min_minutes: 5,
            max_minutes: 10,
        }
    }
}

/// Settings for the built-in HTTP fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    /// Pool of user agents; one is picked at random at the start of each batch.
    #[serde(default)]
    pub user_agents: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 120,
            user_agents: vec![
                "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
                    .to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36"
                    .to_string(),
            ],
        }
    }
}

/// Where fetched files are archived after they are written locally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Mirror directory; `None` disables archiving.
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
}

/// Logging settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// tracing filter directives, such as `"warn"` or `"info,pfetch=trace"`.
    #[serde(default)]
    pub level: Option<String>,
    /// Write to stderr instead of `~/.local/state/pfetch/pfetch.log`.
    #[serde(default)]
    pub stderr: bool,
}

/// Global configuration loaded from `~/.config/pfetch/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PfetchConfig {
    /// Folder used for tasks whose record has no output folder (None = current dir).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub url_delay: UrlDelayConfig,
    #[serde(default)]
    pub batch_delay: BatchDelayConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl PfetchConfig {
    /// Batch policy described by the `[batch]` section.
    pub fn batch_policy(&self) -> Result<BatchPolicy, ConfigError> {
        let b = &self.batch;
        let policy = if !b.enabled {
            BatchPolicy::whole_list()
        } else if b.random {
            BatchPolicy::Randomized {
                min: b.min_size,
                max: b.max_size,
            }
        } else {
            BatchPolicy::Uniform { size: b.size }
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Per-URL and inter-batch delay windows from `[url_delay]` and `[batch_delay]`.
    pub fn timeout_policy(&self) -> Result<TimeoutPolicy, ConfigError> {
        let u = &self.url_delay;
        let per_task = if !u.required {
            DelayWindow::ZERO
        } else if u.random {
            DelayWindow::checked(
                "url",
                Duration::from_secs(u.min_secs),
                Duration::from_secs(u.max_secs),
            )?
        } else {
            DelayWindow::fixed(Duration::from_secs(u.uniform_secs))
        };

        let d = &self.batch_delay;
        let between_batches = if !d.required {
            None
        } else if d.random {
            Some(DelayWindow::checked(
                "batch",
                Duration::from_secs(d.min_minutes * 60),
                Duration::from_secs(d.max_minutes * 60),
            )?)
        } else {
            Some(DelayWindow::fixed(Duration::from_secs(
                d.uniform_minutes * 60,
            )))
        };

        Ok(TimeoutPolicy {
            per_task,
            between_batches,
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load the configuration file if there is one. Never creates it.
pub fn load_existing() -> Result<Option<PfetchConfig>> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(&path)?;
    Ok(Some(toml::from_str(&data)?))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PfetchConfig> {
    if let Some(cfg) = load_existing()? {
        return Ok(cfg);
    }
    let path = config_path()?;
    let default_cfg = PfetchConfig::default();
    let toml = toml::to_string_pretty(&default_cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, toml)?;
    tracing::info!("created default config at {}", path.display());
    Ok(default_cfg)
}
