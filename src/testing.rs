//! In-memory sources and notifiers for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use productwatch_adapters::AdapterError;
use productwatch_types::{Alert, FetchOutcome, MirrorStatus};

use crate::notify::{Notifier, NotifyError};
use crate::source::{ListingSource, StatusSource};

/// Serves canned mirror statuses keyed by mirror id.
#[derive(Debug, Default)]
pub struct FakeStatusSource {
    statuses: HashMap<String, MirrorStatus>,
    requested: Mutex<Vec<String>>,
}

impl FakeStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, mirror_id: &str, ages: &[(&str, f64)]) -> Self {
        let mut status = MirrorStatus::new(mirror_id, FetchOutcome::Ok(200));
        for (sensor, age) in ages {
            status.record_age(sensor, *age);
        }
        self.statuses.insert(mirror_id.to_string(), status);
        self
    }

    pub fn http_error(mut self, mirror_id: &str, code: u16) -> Self {
        let status = MirrorStatus::new(mirror_id, FetchOutcome::HttpError(code));
        self.statuses.insert(mirror_id.to_string(), status);
        self
    }

    pub fn transport_error(mut self, mirror_id: &str, reason: &str) -> Self {
        let status = MirrorStatus::new(mirror_id, FetchOutcome::TransportError(reason.into()));
        self.statuses.insert(mirror_id.to_string(), status);
        self
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusSource for FakeStatusSource {
    async fn fetch_status(&self, mirror_id: &str, url: &str) -> MirrorStatus {
        self.requested.lock().unwrap().push(url.to_string());
        self.statuses
            .get(mirror_id)
            .cloned()
            .unwrap_or_else(|| {
                MirrorStatus::new(mirror_id, FetchOutcome::TransportError("unknown mirror".into()))
            })
            .with_url(url)
    }
}

/// Serves canned listings keyed by URL and counts requests.
#[derive(Debug, Default)]
pub struct FakeListingSource {
    listings: HashMap<String, Result<String, u16>>,
    requested: Mutex<Vec<String>>,
}

impl FakeListingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(mut self, url: &str, text: &str) -> Self {
        self.listings.insert(url.to_string(), Ok(text.to_string()));
        self
    }

    pub fn failing(mut self, url: &str, code: u16) -> Self {
        self.listings.insert(url.to_string(), Err(code));
        self
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingSource for FakeListingSource {
    async fn fetch_listing(&self, url: &str) -> Result<String, AdapterError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.listings.get(url) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(code)) => Err(AdapterError::status(*code)),
            None => Err(AdapterError::Connection(format!("no route to {}", url))),
        }
    }
}

/// Keeps every alert it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Vec<String>, Alert)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Vec<String>, Alert)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipients: &[String], alert: &Alert) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipients.to_vec(), alert.clone()));
        Ok(())
    }
}

/// Refuses every alert.
#[derive(Debug, Default)]
pub struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn send(&self, _recipients: &[String], _alert: &Alert) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected(502))
    }
}
