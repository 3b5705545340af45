//! # productwatch-types
//!
//! Core types for watching near-real-time satellite product flow. These are
//! the values exchanged between the status aggregator, the diagnosis engine
//! and whatever delivers alerts.
//!
//! ## Design Goals
//!
//! - **No I/O**: everything here is plain data, cheap to build in tests
//! - **Optional serialization**: enable the `serde` feature for JSON reports
//! - **Cycle scoped**: values are created for one evaluation cycle and dropped
//!
//! ## Example
//!
//! ```rust
//! use productwatch_types::{FetchOutcome, MirrorStatus, SensorAgeSummary};
//!
//! let mut avo1 = MirrorStatus::new("avo1", FetchOutcome::Ok(200));
//! avo1.record_age("MODIS", 8.0);
//! avo1.record_age("MODIS", 2.5);
//!
//! let mut avo2 = MirrorStatus::new("avo2", FetchOutcome::Ok(200));
//! avo2.record_age("MODIS", 1.0);
//!
//! let summary = SensorAgeSummary::from_statuses(&[avo1, avo2]);
//! assert_eq!(summary.get("MODIS"), Some(1.0));
//! ```

mod alert;
mod diagnosis;
mod sensor;
mod status;

pub use alert::*;
pub use diagnosis::*;
pub use sensor::*;
pub use status::*;
