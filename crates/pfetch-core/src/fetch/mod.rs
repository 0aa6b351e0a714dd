//! The page-fetch capability consumed by the scheduler.
//!
//! Anything that can turn a URL into bytes implements [`Fetcher`]; the
//! scheduler never looks inside. [`CurlFetcher`] is the built-in plain HTTP
//! implementation.

mod curl;

pub use self::curl::{CurlFetcher, CurlFetcherOptions};
pub use crate::retry::FetchError;

use async_trait::async_trait;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns the raw content.
    ///
    /// Return [`FetchError::Unavailable`] only when the fetcher can no longer work at all;
    /// every other error is retried.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Called before the first task of each batch (0-based index).
    fn begin_batch(&self, _batch_index: usize) {}
}
