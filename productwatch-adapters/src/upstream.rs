//! Upstream listing adapter.
//!
//! The ground-station archive publishes a plain-text (usually HTML) directory
//! listing per sensor. This adapter only retrieves the text; finding
//! timestamps in it is left to the caller.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::AdapterError;

/// Client for upstream per-sensor listings.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> UpstreamClientBuilder {
        UpstreamClientBuilder::default()
    }

    /// Retrieve the listing text at `url`.
    ///
    /// A non-success status is an error; callers decide how to report it.
    pub async fn fetch_listing(&self, url: &str) -> Result<String, AdapterError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::status(response.status().as_u16()));
        }

        let text = response.text().await?;
        debug!("Retrieved {} bytes from {}", text.len(), url);

        Ok(text)
    }
}

/// Builder for UpstreamClient.
#[derive(Debug, Default)]
pub struct UpstreamClientBuilder {
    timeout: Option<Duration>,
}

impl UpstreamClientBuilder {
    /// Set the request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<UpstreamClient, AdapterError> {
        Ok(UpstreamClient {
            client: crate::build_client(self.timeout)?,
        })
    }
}
