//! Network sources consumed by an evaluation cycle.
//!
//! The aggregator and the diagnosis engine only see these traits. The HTTP
//! clients from `productwatch-adapters` implement them for production use;
//! tests substitute in-memory fakes.

use std::fmt::Debug;

use async_trait::async_trait;

use productwatch_adapters::{AdapterError, UpstreamClient, VolcviewClient};
use productwatch_types::MirrorStatus;

/// Something that can report a downstream mirror's status.
#[async_trait]
pub trait StatusSource: Send + Sync + Debug {
    /// Fetch the status published at `url` for `mirror_id`.
    ///
    /// Failures are encoded in the returned status' outcome, never raised.
    async fn fetch_status(&self, mirror_id: &str, url: &str) -> MirrorStatus;
}

/// Something that can retrieve an upstream listing.
#[async_trait]
pub trait ListingSource: Send + Sync + Debug {
    /// Fetch the listing text at `url`.
    async fn fetch_listing(&self, url: &str) -> Result<String, AdapterError>;
}

#[async_trait]
impl StatusSource for VolcviewClient {
    async fn fetch_status(&self, mirror_id: &str, url: &str) -> MirrorStatus {
        VolcviewClient::fetch_status(self, mirror_id, url).await
    }
}

#[async_trait]
impl ListingSource for UpstreamClient {
    async fn fetch_listing(&self, url: &str) -> Result<String, AdapterError> {
        UpstreamClient::fetch_listing(self, url).await
    }
}
