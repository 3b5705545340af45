//! Log-only notifier.

use async_trait::async_trait;
use tracing::info;

use productwatch_types::Alert;

use super::{Notifier, NotifyError};

/// Writes alerts to the log instead of sending them anywhere.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipients: &[String], alert: &Alert) -> Result<(), NotifyError> {
        info!("Skipping delivery, no transport configured.");
        info!("Alert for {}:\n{}", recipients.join(", "), alert.to_message());
        Ok(())
    }
}
