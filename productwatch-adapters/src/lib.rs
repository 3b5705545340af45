//! # productwatch-adapters
//!
//! HTTP adapters for the two tiers of the imagery pipeline.
//!
//! - **Volcview** ([`volcview`]) - queries a downstream mirror's status
//!   endpoint and reduces it to the freshest age per sensor
//! - **Upstream** ([`upstream`]) - retrieves the raw directory listing a
//!   sensor's ground-station archive publishes
//!
//! Every request carries a bounded timeout, so a hung server can delay a
//! cycle but never stall it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use productwatch_adapters::volcview::VolcviewClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = VolcviewClient::builder()
//!         .timeout(Duration::from_secs(15))
//!         .build()?;
//!
//!     let status = client
//!         .fetch_status("avo1", "https://volcview.example.org/api/imageApi/getImageStatus")
//!         .await;
//!
//!     println!("{}: {} sensors", status.mirror_id, status.sensor_ages.len());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::{Client, StatusCode};

pub mod error;
pub mod upstream;
pub mod volcview;

pub use error::AdapterError;
pub use upstream::UpstreamClient;
pub use volcview::VolcviewClient;

// Re-export types for convenience
pub use productwatch_types::{FetchOutcome, MirrorStatus};

/// Request timeout used when a builder is not given one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Canonical reason phrase for an HTTP status code, e.g. "Service Unavailable".
pub fn status_reason(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown")
}

fn build_client(timeout: Option<Duration>) -> Result<Client, AdapterError> {
    Client::builder()
        .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
        .user_agent(concat!("productwatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AdapterError::Client(e.to_string()))
}
