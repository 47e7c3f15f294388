//! Fetch remote content and ignore every failure

use crate::config::LinkConfig;
use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::time::Duration;

/// Downloads link content (avatars, attachments) for relaying
#[derive(Debug, Clone)]
pub struct LinkFetcher {
    client: reqwest::Client,
}

impl LinkFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Use a preconfigured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &LinkConfig) -> Result<Self> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// Fetch `url`, returning an empty string on any failure.
    ///
    /// With `encode` the body is base64-encoded, otherwise it is decoded as
    /// UTF-8 (lossy).
    pub async fn fetch(&self, url: &str, encode: bool) -> String {
        match self.fetch_bytes(url).await {
            Ok(body) if encode => STANDARD.encode(&body),
            Ok(body) => String::from_utf8_lossy(&body).into_owned(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Link fetch failed, ignoring");
                String::new()
            }
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}
