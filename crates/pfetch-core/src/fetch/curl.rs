//! Plain HTTP GET fetcher built on libcurl.
//!
//! Each fetch runs on the blocking pool; the user agent is re-drawn from the
//! configured pool at the start of every batch.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::Mutex;
use std::time::Duration;

use super::{FetchError, Fetcher};
use crate::config::FetchConfig;

#[derive(Debug, Clone)]
pub struct CurlFetcherOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub user_agents: Vec<String>,
}

impl From<&FetchConfig> for CurlFetcherOptions {
    fn from(cfg: &FetchConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            user_agents: cfg.user_agents.clone(),
        }
    }
}

pub struct CurlFetcher {
    opts: CurlFetcherOptions,
    user_agent: Mutex<Option<String>>,
}

impl CurlFetcher {
    pub fn new(opts: CurlFetcherOptions) -> Self {
        let first = opts.user_agents.first().cloned();
        Self {
            opts,
            user_agent: Mutex::new(first),
        }
    }

    /// User agent sent with the current batch's requests.
    pub fn current_user_agent(&self) -> Option<String> {
        self.user_agent.lock().ok().and_then(|ua| ua.clone())
    }
}

#[async_trait]
impl Fetcher for CurlFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let url = url.to_string();
        let user_agent = self.current_user_agent();
        let connect_timeout = self.opts.connect_timeout;
        let timeout = self.opts.timeout;
        tokio::task::spawn_blocking(move || {
            get(&url, user_agent.as_deref(), connect_timeout, timeout)
        })
        .await
        .map_err(|e| FetchError::Unavailable(format!("fetch worker failed: {}", e)))?
    }

    fn begin_batch(&self, batch_index: usize) {
        let Some(ua) = self.opts.user_agents.choose(&mut rand::thread_rng()) else {
            return;
        };
        if let Ok(mut current) = self.user_agent.lock() {
            *current = Some(ua.clone());
        }
        tracing::debug!(batch = batch_index + 1, user_agent = %ua, "rotated user agent");
    }
}

fn curl_err(e: curl::Error) -> FetchError {
    FetchError::Transfer(e.to_string())
}

/// Blocking GET; runs in the current thread.
fn get(
    url: &str,
    user_agent: Option<&str>,
    connect_timeout: Duration,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(curl_err)?;
    easy.follow_location(true).map_err(curl_err)?;
    easy.max_redirections(10).map_err(curl_err)?;
    easy.accept_encoding("").map_err(curl_err)?;
    easy.connect_timeout(connect_timeout).map_err(curl_err)?;
    easy.timeout(timeout).map_err(curl_err)?;
    if let Some(ua) = user_agent {
        easy.useragent(ua).map_err(curl_err)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(curl_err)?;
        transfer.perform().map_err(curl_err)?;
    }

    let code = easy.response_code().map_err(curl_err)?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_config() {
        let cfg = FetchConfig::default();
        let opts = CurlFetcherOptions::from(&cfg);
        assert_eq!(opts.connect_timeout, Duration::from_secs(30));
        assert_eq!(opts.user_agents.len(), cfg.user_agents.len());
    }

    #[test]
    fn begin_batch_picks_from_pool() {
        let opts = CurlFetcherOptions {
            connect_timeout: Duration::from_secs(1),
            timeout: Duration::from_secs(1),
            user_agents: vec!["ua-one".into(), "ua-two".into()],
        };
        let f = CurlFetcher::new(opts);
        assert_eq!(f.current_user_agent().as_deref(), Some("ua-one"));
        for i in 0..10 {
            f.begin_batch(i);
            let ua = f.current_user_agent().unwrap();
            assert!(ua == "ua-one" || ua == "ua-two");
        }
    }

    #[test]
    fn empty_pool_sends_no_user_agent() {
        let f = CurlFetcher::new(CurlFetcherOptions {
            connect_timeout: Duration::from_secs(1),
            timeout: Duration::from_secs(1),
            user_agents: Vec::new(),
        });
        f.begin_batch(0);
        assert!(f.current_user_agent().is_none());
    }

    #[tokio::test]
    async fn connection_refused_is_transient() {
        // Port 9 (discard) is almost never listening on loopback.
        let f = CurlFetcher::new(CurlFetcherOptions {
            connect_timeout: Duration::from_secs(2),
            timeout: Duration::from_secs(2),
            user_agents: Vec::new(),
        });
        let err = f.fetch("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, FetchError::Transfer(_)));
    }
}
