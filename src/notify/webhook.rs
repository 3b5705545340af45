//! Webhook notifier.
//!
//! Posts each alert as a JSON document:
//!
//! ```json
//! {
//!   "recipients": ["ops@example.org"],
//!   "subject": "MODIS outage upstream",
//!   "body": "...",
//!   "message": "Subject: MODIS outage upstream\n\n..."
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use productwatch_types::Alert;

use super::{Notifier, NotifyError};

/// Delivers alerts by POSTing them to a relay endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct Payload<'a> {
    recipients: &'a [String],
    subject: &'a str,
    body: &'a str,
    message: String,
}

impl WebhookNotifier {
    /// Create a notifier posting to `url`, giving up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, recipients: &[String], alert: &Alert) -> Result<(), NotifyError> {
        let payload = Payload {
            recipients,
            subject: &alert.subject,
            body: &alert.body,
            message: alert.to_message(),
        };

        info!("Sending '{}' to {}", alert.subject, recipients.join(", "));
        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_posts_alert_payload() {
        let server = MockServer::start_async().await;
        let relay = server
            .mock_async(|when, then| {
                when.method(POST).path("/alerts").json_body(json!({
                    "recipients": ["ops@example.org", "sat@example.org"],
                    "subject": "MODIS outage upstream",
                    "body": "nothing new",
                    "message": "Subject: MODIS outage upstream\n\nnothing new"
                }));
                then.status(202);
            })
            .await;

        let notifier = WebhookNotifier::new(server.url("/alerts"), Duration::from_secs(5)).unwrap();
        let recipients = vec!["ops@example.org".to_string(), "sat@example.org".to_string()];
        let alert = Alert::new("MODIS outage upstream", "nothing new");

        notifier.send(&recipients, &alert).await.unwrap();
        relay.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_alert_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/alerts");
                then.status(500);
            })
            .await;

        let notifier = WebhookNotifier::new(server.url("/alerts"), Duration::from_secs(5)).unwrap();
        let err = notifier
            .send(&["ops@example.org".into()], &Alert::new("s", "b"))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Rejected(500)));
    }
}
