//! One evaluation cycle.
//!
//! ```text
//!  mirrors ──▶ StatusAggregator ──▶ MirrorStatus[] ──▶ SensorAgeSummary
//!                    │                    │                   │
//!                    ▼                    ▼                   ▼
//!              fetch failures      mirror freshness     DiagnosisEngine ──▶ upstream
//!                    │                    │                   │
//!                    └────────────────────┴───────────────────┴──▶ Notifier
//! ```
//!
//! A cycle always runs to completion. Nothing that happens on the network
//! is an error at this level; it is an alert.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use productwatch_adapters::{AdapterError, UpstreamClient, VolcviewClient};
use productwatch_types::{DiagnosisResult, MirrorStatus, SensorAgeSummary, Verdict};

use crate::aggregate::{summarize, StatusAggregator};
use crate::diagnose::DiagnosisEngine;
use crate::notify::{CountingNotifier, LogNotifier, Notifier, NotifyError, WebhookNotifier};
use crate::settings::{NotifierConfig, WatcherConfig};
use crate::source::{ListingSource, StatusSource};

/// Everything a cycle observed and decided.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Evaluation time used for every age computation.
    pub evaluated_at: DateTime<Utc>,
    pub mirrors: Vec<MirrorStatus>,
    pub summary: SensorAgeSummary,
    /// Mirrors whose freshest image is older than the configured maximum.
    pub stale_mirrors: Vec<String>,
    pub diagnoses: Vec<DiagnosisResult>,
    /// Alerts the notifier accepted.
    pub alerts_sent: usize,
}

impl CycleReport {
    /// Diagnoses that ended in a fault.
    pub fn faults(&self) -> impl Iterator<Item = &DiagnosisResult> {
        self.diagnoses.iter().filter(|d| d.verdict.is_fault())
    }

    /// Number of sensors with the given verdict.
    pub fn count(&self, verdict: Verdict) -> usize {
        self.diagnoses.iter().filter(|d| d.verdict == verdict).count()
    }
}

/// Run one cycle against the given sources.
pub async fn run_cycle(
    config: &WatcherConfig,
    statuses: &dyn StatusSource,
    listings: &dyn ListingSource,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> CycleReport {
    let notifier = CountingNotifier::new(notifier);
    let concurrency = config.http.max_concurrent_fetches;

    let aggregator = StatusAggregator::new(statuses, &notifier, &config.volcview.watchers)
        .concurrency(concurrency);
    let mirrors = aggregator
        .gather(&config.volcview.mirrors, &config.volcview.status_path)
        .await;

    let stale_mirrors = match config.volcview.max_age_hours {
        Some(max_age) => aggregator.check_freshness(&mirrors, max_age).await,
        None => Vec::new(),
    };

    // Every mirror fetch has completed before the summary is taken
    let summary = summarize(&mirrors);

    let diagnoses = DiagnosisEngine::new(listings, &notifier)
        .concurrency(concurrency)
        .diagnose(&summary, &config.sensors, now)
        .await;

    let report = CycleReport {
        evaluated_at: now,
        mirrors,
        summary,
        stale_mirrors,
        diagnoses,
        alerts_sent: notifier.accepted(),
    };

    info!(
        "Cycle complete: {} mirrors, {} sensors diagnosed, {} faults, {} alerts sent",
        report.mirrors.len(),
        report.diagnoses.len(),
        report.faults().count(),
        report.alerts_sent
    );

    report
}

/// Problems building the network clients.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Production wiring: HTTP clients and the configured notifier.
#[derive(Debug)]
pub struct Watcher {
    config: WatcherConfig,
    volcview: VolcviewClient,
    upstream: UpstreamClient,
    notifier: Box<dyn Notifier>,
}

impl Watcher {
    /// Build clients from a validated configuration.
    pub fn new(config: WatcherConfig) -> Result<Self, SetupError> {
        let timeout = config.http.timeout();
        let volcview = VolcviewClient::builder().timeout(timeout).build()?;
        let upstream = UpstreamClient::builder().timeout(timeout).build()?;

        let notifier: Box<dyn Notifier> = match &config.notifier {
            NotifierConfig::Log => Box::new(LogNotifier::new()),
            NotifierConfig::Webhook { url } => Box::new(WebhookNotifier::new(url, timeout)?),
        };

        Ok(Self {
            config,
            volcview,
            upstream,
            notifier,
        })
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Run one cycle evaluated at `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> CycleReport {
        run_cycle(
            &self.config,
            &self.volcview,
            &self.upstream,
            self.notifier.as_ref(),
            now,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use config::FileFormat;
    use httpmock::prelude::*;
    use productwatch_types::{FetchOutcome, SensorVariant};

    use crate::testing::{FakeListingSource, FakeStatusSource, RecordingNotifier};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 5, 3, 12, 0, 0).unwrap()
    }

    fn config(max_age: Option<f64>) -> WatcherConfig {
        let mut yaml = String::from(
            r#"
volcview:
  status_path: /status
  watchers: [ops@example.org]
  mirrors:
    avo1: http://avo1
    avo2: http://avo2
sensors:
  - name: MODIS
    url: http://gina/modis/
    limit: 6
    watchers: [modis@example.org]
  - name: VIIRS
    url: http://gina/viirs/
    limit: 6
    watchers: [viirs@example.org]
  - name: AVHRR
    url: http://gina/avhrr/
    limit: 6
    disabled: true
"#,
        );
        if let Some(max_age) = max_age {
            yaml = yaml.replace("  mirrors:", &format!("  max_age_hours: {}\n  mirrors:", max_age));
        }
        WatcherConfig::parse(&yaml, FileFormat::Yaml).unwrap()
    }

    #[tokio::test]
    async fn test_cycle_with_one_failed_mirror() {
        let statuses = FakeStatusSource::new()
            .ok("avo1", &[("MODIS", 8.0), ("VIIRS", 2.0), ("AVHRR", 900.0)])
            .http_error("avo2", 503);
        let listings = FakeListingSource::new().listing("http://gina/modis/", "a1.18123.1030.modis.hdf");
        let notifier = RecordingNotifier::new();

        let report = run_cycle(&config(None), &statuses, &listings, &notifier, now()).await;

        assert_eq!(report.mirrors.len(), 2);
        assert_eq!(report.mirrors[1].outcome, FetchOutcome::HttpError(503));
        assert_eq!(report.summary.successful_mirrors, 1);

        // AVHRR is disabled; VIIRS is healthy; MODIS stalled locally
        assert_eq!(report.diagnoses.len(), 2);
        assert_eq!(report.count(Verdict::Healthy), 1);
        assert_eq!(report.count(Verdict::ProcessingStall), 1);
        assert_eq!(listings.requested_urls(), vec!["http://gina/modis/".to_string()]);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1.subject, "CRITICAL error on avo2");
        assert_eq!(sent[0].0, vec!["ops@example.org".to_string()]);
        assert_eq!(sent[1].1.subject, "MODIS data processing problem");
        assert_eq!(sent[1].0, vec!["modis@example.org".to_string()]);
        assert_eq!(report.alerts_sent, 2);
    }

    #[tokio::test]
    async fn test_cycle_all_mirrors_down() {
        let statuses = FakeStatusSource::new()
            .transport_error("avo1", "connection refused")
            .http_error("avo2", 502);
        let listings = FakeListingSource::new();
        let notifier = RecordingNotifier::new();

        let report = run_cycle(&config(None), &statuses, &listings, &notifier, now()).await;

        assert!(report.diagnoses.is_empty());
        assert!(listings.requested_urls().is_empty());
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_cycle_mirror_freshness() {
        let statuses = FakeStatusSource::new()
            .ok("avo1", &[("MODIS", 1.0), ("VIIRS", 2.0)])
            .ok("avo2", &[("MODIS", 20.0), ("VIIRS", 25.0)]);
        let listings = FakeListingSource::new();
        let notifier = RecordingNotifier::new();

        let report = run_cycle(&config(Some(12.0)), &statuses, &listings, &notifier, now()).await;

        assert_eq!(report.stale_mirrors, vec!["avo2".to_string()]);
        // avo1 keeps every sensor healthy
        assert_eq!(report.count(Verdict::Healthy), 2);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let statuses = FakeStatusSource::new()
            .ok("avo1", &[("MODIS", 1.0), ("VIIRS", 1.0)])
            .ok("avo2", &[("MODIS", 2.0), ("VIIRS", 3.0)]);
        let listings = FakeListingSource::new();
        let notifier = RecordingNotifier::new();

        let report = run_cycle(&config(None), &statuses, &listings, &notifier, now()).await;
        assert!(notifier.sent().is_empty());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["alerts_sent"], 0);
        assert_eq!(json["diagnoses"][0]["sensor"], "MODIS");
        assert_eq!(json["diagnoses"][0]["verdict"], "Healthy");
        assert_eq!(json["mirrors"][0]["outcome"]["kind"], "Ok");
    }

    #[tokio::test]
    async fn test_watcher_over_http() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/avo1/status");
                then.status(200)
                    .body(r#"[{"data_type_name": "VIIRS", "age_hours": "9.5"}]"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/avo2/status");
                then.status(503);
            })
            .await;
        let listing = server
            .mock_async(|when, then| {
                when.method(GET).path("/gina/viirs/");
                then.status(200).body("");
            })
            .await;

        let yaml = format!(
            r#"
volcview:
  status_path: /status
  mirrors:
    avo1: {base}/avo1
    avo2: {base}/avo2
sensors:
  - name: VIIRS
    url: {base}/gina/viirs/
    limit: 6
http:
  timeout_secs: 5
"#,
            base = server.base_url()
        );
        let config = WatcherConfig::parse(&yaml, FileFormat::Yaml).unwrap();
        let watcher = Watcher::new(config).unwrap();

        let report = watcher.run(now()).await;

        listing.assert_async().await;
        assert_eq!(report.mirrors[1].outcome, FetchOutcome::HttpError(503));
        assert_eq!(report.diagnoses.len(), 1);
        assert_eq!(report.diagnoses[0].sensor, SensorVariant::Viirs);
        assert_eq!(report.diagnoses[0].verdict, Verdict::UpstreamOutage);
        assert_eq!(report.diagnoses[0].downstream_age_hours, Some(9.5));
        // Log-only delivery still counts as accepted
        assert_eq!(report.alerts_sent, 2);
    }
}
