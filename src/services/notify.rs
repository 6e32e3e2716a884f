//! Outgoing user notifications.
//!
//! Delivery is a hook: services decide who hears about what, a [`Notifier`]
//! decides how. The binary logs them; mail or push belong behind the same trait.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(recipient: &str, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient: recipient.to_string(),
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Sink for notifications. Sending never fails the calling operation.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes each notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        log::info!(
            "[Notify] {} <- {}: {}",
            notification.recipient,
            notification.title,
            notification.message
        );
    }
}
