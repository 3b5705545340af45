//! Alert messages handed to a notifier.

use std::fmt;

/// A subject and body destined for a list of recipients.
///
/// Rendering follows mail framing: a `Subject:` line, a blank line, then the
/// body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

impl Alert {
    /// Create a new alert.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Render the alert as a mail-style message.
    pub fn to_message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subject: {}\n\n{}", self.subject, self.body)
    }
}
