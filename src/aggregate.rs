//! Downstream status aggregation.
//!
//! Queries every Volcview mirror once per cycle. A mirror that cannot be
//! read is reported straight away: a fetch failure is actionable on its own
//! and must not be mistaken for stale data later on.

use std::collections::BTreeMap;

use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use productwatch_adapters::status_reason;
use productwatch_types::{Alert, FetchOutcome, MirrorStatus, SensorAgeSummary};

use crate::notify::{deliver, Notifier};
use crate::source::StatusSource;

/// Fetches mirror statuses and reports the ones that fail.
#[derive(Debug)]
pub struct StatusAggregator<'a> {
    source: &'a dyn StatusSource,
    notifier: &'a dyn Notifier,
    watchers: &'a [String],
    concurrency: usize,
}

impl<'a> StatusAggregator<'a> {
    /// Create an aggregator alerting `watchers` through `notifier`.
    pub fn new(
        source: &'a dyn StatusSource,
        notifier: &'a dyn Notifier,
        watchers: &'a [String],
    ) -> Self {
        Self {
            source,
            notifier,
            watchers,
            concurrency: 1,
        }
    }

    /// Set how many mirrors may be queried at once (minimum 1).
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Query each mirror at `base_url + status_path`.
    ///
    /// Results come back in mirror-id order. Every failed mirror has already
    /// produced one alert by the time this returns.
    pub async fn gather(
        &self,
        mirrors: &BTreeMap<String, String>,
        status_path: &str,
    ) -> Vec<MirrorStatus> {
        stream::iter(mirrors)
            .map(|(mirror_id, base_url)| {
                self.fetch_one(mirror_id, format!("{}{}", base_url, status_path))
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn fetch_one(&self, mirror_id: &str, url: String) -> MirrorStatus {
        let status = self.source.fetch_status(mirror_id, &url).await;

        if let Some(alert) = fetch_failure_alert(&status) {
            warn!("{}: {}", mirror_id, alert.body);
            deliver(self.notifier, self.watchers, &alert).await;
        }

        status
    }

    /// Alert for every successful mirror whose freshest image is older than
    /// `max_age_hours`. Returns the ids of the stale mirrors.
    pub async fn check_freshness(
        &self,
        statuses: &[MirrorStatus],
        max_age_hours: f64,
    ) -> Vec<String> {
        let mut stale = Vec::new();

        for status in statuses.iter().filter(|s| s.is_success()) {
            match status.freshest_age() {
                Some(age) if age <= max_age_hours => {
                    info!("{} age: {:.2} hours. No reason to panic.", status.mirror_id, age);
                }
                age => {
                    warn!(
                        "{} age: {}. That's not good.",
                        status.mirror_id,
                        age.map_or("unknown".to_string(), |a| format!("{:.2} hours", a))
                    );
                    deliver(self.notifier, self.watchers, &stale_mirror_alert(status)).await;
                    stale.push(status.mirror_id.clone());
                }
            }
        }

        stale
    }
}

/// Minimum age per sensor across successful mirrors.
///
/// Only meaningful once every fetch of the cycle has finished.
pub fn summarize(statuses: &[MirrorStatus]) -> SensorAgeSummary {
    SensorAgeSummary::from_statuses(statuses)
}

/// The alert a failed status fetch produces, if it failed.
pub fn fetch_failure_alert(status: &MirrorStatus) -> Option<Alert> {
    let subject = format!("CRITICAL error on {}", status.mirror_id);

    let body = match &status.outcome {
        FetchOutcome::Ok(_) => return None,
        FetchOutcome::HttpError(code) => format!(
            "Unable to pull status from {}. Received response code {} ({}).",
            status.url,
            code,
            status_reason(*code)
        ),
        FetchOutcome::TransportError(reason) => {
            format!("Unable to pull status from {}: {}.", status.url, reason)
        }
    };

    Some(Alert::new(subject, body))
}

fn stale_mirror_alert(status: &MirrorStatus) -> Alert {
    let detail = match status.freshest_age() {
        Some(age) => format!("Most recent image is {:.2} hours old.", age),
        None => "No images are listed at all.".to_string(),
    };

    Alert::new(
        format!("CRITICAL error on {}", status.mirror_id),
        format!("Images aren't making it to {}. {}", status.mirror_id, detail),
    )
}
