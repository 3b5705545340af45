//! Alert delivery.
//!
//! The cycle hands every alert to a [`Notifier`] together with its
//! recipients. How the alert leaves the process is the notifier's business:
//!
//! - [`LogNotifier`] writes it to the log. This is the degraded mode used
//!   when no transport is configured, and it always succeeds.
//! - [`WebhookNotifier`] posts it as JSON to an HTTP endpoint that relays it
//!   (mail gateway, chat bridge, pager).

mod log;
mod webhook;

pub use self::log::LogNotifier;
pub use webhook::WebhookNotifier;

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::error;

use productwatch_types::Alert;

/// Errors raised while delivering an alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The relay could not be reached.
    #[error("delivery failed: {0}")]
    Transport(String),

    /// The relay refused the alert.
    #[error("relay answered with status {0}")]
    Rejected(u16),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

/// Delivers alerts to a list of recipients.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    /// Send `alert` to every address in `recipients`.
    async fn send(&self, recipients: &[String], alert: &Alert) -> Result<(), NotifyError>;
}

/// Send an alert, logging instead of propagating a delivery failure.
///
/// Returns true if the notifier accepted the alert.
pub async fn deliver(notifier: &dyn Notifier, recipients: &[String], alert: &Alert) -> bool {
    match notifier.send(recipients, alert).await {
        Ok(()) => true,
        Err(e) => {
            error!("Unable to deliver '{}' to {:?}: {}", alert.subject, recipients, e);
            false
        }
    }
}

/// Wraps a notifier and counts the alerts it accepted.
#[derive(Debug)]
pub struct CountingNotifier<'a> {
    inner: &'a dyn Notifier,
    accepted: AtomicUsize,
}

impl<'a> CountingNotifier<'a> {
    pub fn new(inner: &'a dyn Notifier) -> Self {
        Self {
            inner,
            accepted: AtomicUsize::new(0),
        }
    }

    /// Number of alerts the wrapped notifier accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Notifier for CountingNotifier<'_> {
    async fn send(&self, recipients: &[String], alert: &Alert) -> Result<(), NotifyError> {
        self.inner.send(recipients, alert).await?;
        self.accepted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BrokenNotifier, RecordingNotifier};

    #[tokio::test]
    async fn test_deliver_reports_acceptance() {
        let alert = Alert::new("subject", "body");
        let recipients = vec!["ops@example.org".to_string()];

        assert!(deliver(&RecordingNotifier::new(), &recipients, &alert).await);
        assert!(!deliver(&BrokenNotifier, &recipients, &alert).await);
    }

    #[tokio::test]
    async fn test_counting_notifier() {
        let recording = RecordingNotifier::new();
        let counting = CountingNotifier::new(&recording);
        let alert = Alert::new("subject", "body");

        deliver(&counting, &[], &alert).await;
        deliver(&counting, &[], &alert).await;
        assert_eq!(counting.accepted(), 2);
        assert_eq!(recording.sent().len(), 2);

        let broken = CountingNotifier::new(&BrokenNotifier);
        deliver(&broken, &[], &alert).await;
        assert_eq!(broken.accepted(), 0);
    }
}
