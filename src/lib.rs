//! # productwatch
//!
//! Watches near-real-time satellite imagery moving from an upstream
//! ground-station archive into downstream Volcview mirrors, and works out
//! where the flow stopped when images go stale.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                           cycle                               │
//! │  ┌───────────┐    ┌──────────┐    ┌──────────┐    ┌────────┐  │
//! │  │ aggregate │───▶│ summary  │───▶│ diagnose │───▶│ notify │  │
//! │  │ (mirrors) │    │(min age) │    │(escalate)│    │(alerts)│  │
//! │  └─────┬─────┘    └──────────┘    └────┬─────┘    └────────┘  │
//! │        │                               │                      │
//! │        ▼                               ▼                      │
//! │  ┌───────────┐                   ┌───────────┐                │
//! │  │  source   │◀── Volcview       │  extract  │◀── listings    │
//! │  └───────────┘                   └───────────┘                │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`aggregate`]**: queries every mirror, alerts on fetch failures,
//!   and reduces ages to a [`SensorAgeSummary`]
//! - **[`diagnose`]**: the two-stage check per sensor, escalating to the
//!   upstream listing only when the downstream age is over threshold
//! - **[`extract`]**: finds the newest timestamp in an upstream listing
//! - **[`notify`]**: the [`Notifier`] capability alerts are delivered through
//! - **[`settings`]**: the immutable [`WatcherConfig`]
//! - **[`source`]**: traits at the network seam
//! - **[`cycle`]**: ties the above together for one evaluation
//!
//! ## Usage
//!
//! ```bash
//! PRODUCT_WATCHER_CONFIG=/etc/productwatch.yaml productwatch
//! productwatch --config watcher.yaml --report last-cycle.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::path::Path;
//! use productwatch::{Watcher, WatcherConfig};
//!
//! # tokio_test::block_on(async {
//! let config = WatcherConfig::load(Path::new("watcher.yaml")).unwrap();
//! let watcher = Watcher::new(config).unwrap();
//! let report = watcher.run(chrono::Utc::now()).await;
//! println!("{} alerts sent", report.alerts_sent);
//! # });
//! ```

pub mod aggregate;
pub mod cycle;
pub mod diagnose;
pub mod extract;
pub mod notify;
pub mod settings;
pub mod source;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use aggregate::StatusAggregator;
pub use cycle::{run_cycle, CycleReport, Watcher};
pub use diagnose::DiagnosisEngine;
pub use extract::extract_most_recent_age;
pub use notify::{LogNotifier, Notifier, WebhookNotifier};
pub use settings::{ConfigError, SensorConfig, WatcherConfig};
pub use source::{ListingSource, StatusSource};

pub use productwatch_types::{
    Alert, DiagnosisResult, FetchOutcome, MirrorStatus, SensorAgeSummary, SensorVariant, Verdict,
};
