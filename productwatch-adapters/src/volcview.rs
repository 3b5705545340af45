//! Volcview adapter for downstream image status.
//!
//! Each Volcview mirror publishes a JSON array describing the images it
//! holds. Only two fields matter here:
//!
//! ```json
//! [
//!   { "data_type_name": "MODIS", "age_hours": 2.25 },
//!   { "data_type_name": "MODIS", "age_hours": "7.5" },
//!   { "data_type_name": "VIIRS", "age_hours": 0.8 }
//! ]
//! ```
//!
//! A sensor may appear several times (one row per sub-product); the mirror's
//! age for that sensor is the smallest of them.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use productwatch_types::{FetchOutcome, MirrorStatus};

use crate::AdapterError;

/// Client for Volcview status endpoints.
#[derive(Debug, Clone)]
pub struct VolcviewClient {
    client: Client,
}

impl VolcviewClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> VolcviewClientBuilder {
        VolcviewClientBuilder::default()
    }

    /// Fetch one mirror's status.
    ///
    /// Never fails: HTTP and transport problems are recorded in the returned
    /// [`FetchOutcome`] and leave the sensor ages empty.
    pub async fn fetch_status(&self, mirror_id: &str, url: &str) -> MirrorStatus {
        match self.fetch_records(url).await {
            Ok((code, records)) => {
                let mut status = MirrorStatus::new(mirror_id, FetchOutcome::Ok(code)).with_url(url);
                for record in records {
                    status.record_age(&record.sensor, record.age_hours);
                }
                debug!(
                    "{} reported {} sensors",
                    mirror_id,
                    status.sensor_ages.len()
                );
                status
            }
            Err(AdapterError::Status { code, .. }) => {
                MirrorStatus::new(mirror_id, FetchOutcome::HttpError(code)).with_url(url)
            }
            Err(e) => {
                MirrorStatus::new(mirror_id, FetchOutcome::TransportError(e.to_string())).with_url(url)
            }
        }
    }

    async fn fetch_records(&self, url: &str) -> Result<(u16, Vec<StatusRecord>), AdapterError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::status(response.status().as_u16()));
        }

        let code = response.status().as_u16();
        let body = response.text().await?;
        let records = parse_status(&body)?;

        Ok((code, records))
    }
}

/// One usable row of a status document.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRecord {
    pub sensor: String,
    pub age_hours: f64,
}

/// Parse a status document.
///
/// The document must be a JSON array. Rows without a sensor name or with an
/// age that cannot be read as a non-negative number are skipped.
pub fn parse_status(body: &str) -> Result<Vec<StatusRecord>, AdapterError> {
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| AdapterError::Parse(e.to_string()))?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let raw: RawRecord = match serde_json::from_value(row) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping malformed status record: {}", e);
                continue;
            }
        };

        match raw.age_hours.as_hours() {
            Some(age_hours) => records.push(StatusRecord {
                sensor: raw.data_type_name,
                age_hours,
            }),
            None => warn!(
                "Skipping {} record with unusable age {:?}",
                raw.data_type_name, raw.age_hours
            ),
        }
    }

    Ok(records)
}

/// Builder for VolcviewClient.
#[derive(Debug, Default)]
pub struct VolcviewClientBuilder {
    timeout: Option<Duration>,
}

impl VolcviewClientBuilder {
    /// Set the request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<VolcviewClient, AdapterError> {
        Ok(VolcviewClient {
            client: crate::build_client(self.timeout)?,
        })
    }
}

/// A status row as published by Volcview.
#[derive(Debug, Deserialize)]
struct RawRecord {
    data_type_name: String,
    age_hours: AgeValue,
}

/// Ages arrive as numbers from some deployments and as strings from others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AgeValue {
    Number(f64),
    Text(String),
}

impl AgeValue {
    fn as_hours(&self) -> Option<f64> {
        let hours = match self {
            AgeValue::Number(n) => *n,
            AgeValue::Text(s) => s.trim().parse().ok()?,
        };
        (hours.is_finite() && hours >= 0.0).then_some(hours)
    }
}
