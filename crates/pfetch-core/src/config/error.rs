//! Configuration errors raised before any batch starts.

/// Invalid batch or delay settings. Always fatal and never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("batch size range is inverted: min {min} > max {max}")]
    InvertedBatchRange { min: usize, max: usize },
    #[error("{name} delay window is inverted: min {min_ms}ms > max {max_ms}ms")]
    InvertedDelayWindow {
        name: &'static str,
        min_ms: u64,
        max_ms: u64,
    },
    #[error("incomplete batch size override: both --batch-min and --batch-max are required")]
    PartialBatchRange,
}
