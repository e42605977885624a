//! Image reachability probe.
//!
//! Groups are never created for faces whose source image the UI cannot
//! render, so every batch starts with a HEAD probe of the file's URL. Any
//! error, timeout, or non-2xx status counts as unreachable.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Checks whether an image URL is currently fetchable.
#[async_trait]
pub trait ImageProber: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

/// HEAD-probes URLs with a bounded timeout.
pub struct HttpImageProber {
    client: reqwest::Client,
}

impl HttpImageProber {
    /// Build a prober whose requests time out after `timeout_ms`.
    pub fn new(timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }
}

#[async_trait]
impl ImageProber for HttpImageProber {
    async fn is_reachable(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url, error = %e, "HEAD probe failed");
                false
            }
        }
    }
}
