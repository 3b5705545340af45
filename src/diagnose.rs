//! Per-sensor staleness diagnosis.
//!
//! Each enabled sensor goes through two stages:
//!
//! 1. **Local check** - the freshest downstream age is compared with the
//!    sensor's threshold. Strictly below the threshold is healthy and ends
//!    the diagnosis without touching the upstream source.
//! 2. **Escalation** - otherwise the upstream listing is fetched and its
//!    newest timestamp decides who is at fault:
//!
//! ```text
//!   upstream age > threshold   ──▶ UpstreamOutage   (the source stopped)
//!   upstream age <= threshold  ──▶ ProcessingStall  (fresh data never arrived)
//!   listing not retrievable    ──▶ TransportError
//! ```
//!
//! Every verdict other than `Healthy` sends exactly one alert to the
//! sensor's recipients.

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use productwatch_adapters::AdapterError;
use productwatch_types::{Alert, DiagnosisResult, SensorAgeSummary, Verdict};

use crate::extract::{age_hours, most_recent, sentinel};
use crate::notify::{deliver, Notifier};
use crate::settings::SensorConfig;
use crate::source::ListingSource;

/// Returns true if the downstream age passes the local check.
///
/// The boundary is exclusive: an age equal to the threshold escalates.
pub fn is_healthy(downstream_age_hours: f64, threshold_hours: f64) -> bool {
    downstream_age_hours < threshold_hours
}

/// Classify an escalated sensor from its upstream age.
pub fn classify(upstream_age_hours: f64, threshold_hours: f64) -> Verdict {
    if upstream_age_hours > threshold_hours {
        Verdict::UpstreamOutage
    } else {
        Verdict::ProcessingStall
    }
}

/// Diagnoses sensors, escalating to upstream listings only when needed.
#[derive(Debug)]
pub struct DiagnosisEngine<'a> {
    listings: &'a dyn ListingSource,
    notifier: &'a dyn Notifier,
    concurrency: usize,
}

impl<'a> DiagnosisEngine<'a> {
    pub fn new(listings: &'a dyn ListingSource, notifier: &'a dyn Notifier) -> Self {
        Self {
            listings,
            notifier,
            concurrency: 1,
        }
    }

    /// Set how many sensors may escalate at once (minimum 1).
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Diagnose every enabled sensor in `configs`.
    ///
    /// Disabled sensors produce no result. If no mirror answered this cycle
    /// there is nothing to judge downstream ages by, so no sensor is
    /// diagnosed; the mirror failures have been reported already.
    pub async fn diagnose(
        &self,
        ages: &SensorAgeSummary,
        configs: &[SensorConfig],
        now: DateTime<Utc>,
    ) -> Vec<DiagnosisResult> {
        if ages.successful_mirrors == 0 {
            warn!("No mirror reported status, skipping sensor diagnosis");
            return Vec::new();
        }

        let results: Vec<Option<DiagnosisResult>> = stream::iter(configs)
            .map(|config| self.diagnose_sensor(ages, config, now))
            .buffered(self.concurrency)
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }

    async fn diagnose_sensor(
        &self,
        ages: &SensorAgeSummary,
        config: &SensorConfig,
        now: DateTime<Utc>,
    ) -> Option<DiagnosisResult> {
        let sensor = config.name;

        if config.disabled {
            info!("Sensor {} is disabled, skipping.", sensor);
            return None;
        }

        // A sensor no mirror reports cannot pass the local check
        let downstream = ages.get(sensor.name());
        if let Some(age) = downstream {
            if is_healthy(age, config.threshold_hours) {
                info!("{} is healthy. ({:.2} hrs)", sensor, age);
                return Some(DiagnosisResult::healthy(sensor, age));
            }
        }

        let (result, alert) = match self.listings.fetch_listing(&config.upstream_url).await {
            Ok(listing) => {
                let newest = most_recent(sensor, &listing);
                let upstream = age_hours(now, newest);
                let verdict = classify(upstream, config.threshold_hours);
                let alert = match verdict {
                    Verdict::UpstreamOutage => {
                        warn!("{} outage upstream ({:.2} hrs)", sensor, upstream);
                        outage_alert(config, upstream, newest == sentinel())
                    }
                    _ => {
                        warn!(
                            "{} data processing problem, check {}",
                            sensor,
                            config.processing_label()
                        );
                        stall_alert(config, downstream, upstream)
                    }
                };
                let result = DiagnosisResult {
                    sensor,
                    verdict,
                    downstream_age_hours: downstream,
                    upstream_age_hours: Some(upstream),
                };
                (result, alert)
            }
            Err(e) => {
                warn!("{} upstream listing unavailable: {}", sensor, e);
                let result = DiagnosisResult {
                    sensor,
                    verdict: Verdict::TransportError,
                    downstream_age_hours: downstream,
                    upstream_age_hours: None,
                };
                (result, listing_failure_alert(config, &e))
            }
        };

        deliver(self.notifier, &config.recipients, &alert).await;
        Some(result)
    }
}

fn outage_alert(config: &SensorConfig, upstream_age: f64, nothing_found: bool) -> Alert {
    let sensor = config.name;
    let mut body = if nothing_found {
        format!(
            "No {} images were found upstream at {}; the listing is empty or unrecognisable ({:.2} hours since the fallback date).",
            sensor,
            config.source_label(),
            upstream_age
        )
    } else {
        format!(
            "The most recent {} image upstream at {} is {:.2} hours old.",
            sensor,
            config.source_label(),
            upstream_age
        )
    };
    body.push_str(&format!("\n\nUpstream URL: {}", config.upstream_url));

    Alert::new(format!("{} outage upstream", sensor), body)
}

fn stall_alert(config: &SensorConfig, downstream_age: Option<f64>, upstream_age: f64) -> Alert {
    let sensor = config.name;
    let downstream = match downstream_age {
        Some(age) => format!("Most recent {} image in volcview is {:.2} hours old", sensor, age),
        None => format!("No {} images are reported in volcview", sensor),
    };

    Alert::new(
        format!("{} data processing problem", sensor),
        format!(
            "{}, while {} has more recent data ({:.2} hrs). Check {}.",
            downstream,
            config.source_label(),
            upstream_age,
            config.processing_label()
        ),
    )
}

fn listing_failure_alert(config: &SensorConfig, error: &AdapterError) -> Alert {
    let body = match error {
        AdapterError::Status { code, reason } => format!(
            "Cannot retrieve file list from {}. Received response code {} ({}).",
            config.upstream_url, code, reason
        ),
        other => format!(
            "Cannot retrieve file list from {}: {}.",
            config.upstream_url, other
        ),
    };

    Alert::new(format!("CRITICAL error upstream of {}", config.name), body)
}
