use pfetch_core::config::{self, LogConfig};
use pfetch_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Commands load the config again and report errors there.
    let log_cfg = match config::load_existing() {
        Ok(cfg) => cfg.map(|c| c.log).unwrap_or_default(),
        Err(_) => LogConfig::default(),
    };
    if let Err(e) = logging::init_logging(&log_cfg) {
        logging::init_logging_stderr(&log_cfg);
        tracing::warn!("log file unavailable, logging to stderr: {:#}", e);
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("pfetch error: {:#}", err);
        std::process::exit(1);
    }
}
