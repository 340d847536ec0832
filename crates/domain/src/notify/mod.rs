//! Outbound notifications to customers and the administrator.

mod dispatcher;
mod recording;

pub use dispatcher::{DEFAULT_NOTIFY_TIMEOUT, NotificationDispatcher};
pub use recording::{RecordingNotifier, SentNotification};

use async_trait::async_trait;
use common::ChatId;
use serde::Serialize;
use thiserror::Error;

/// An interactive control attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub label: String,
    /// Payload delivered back as a callback when pressed.
    pub data: String,
}

impl ActionButton {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Text plus optional rows of buttons.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Notification {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Vec<ActionButton>>,
}

impl Notification {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    /// Appends a row of buttons; empty rows are dropped.
    pub fn with_row(mut self, row: Vec<ActionButton>) -> Self {
        if !row.is_empty() {
            self.buttons.push(row);
        }
        self
    }
}

/// Errors reported by a notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification to {chat_id} rejected: {reason}")]
    Rejected { chat_id: ChatId, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Notification to {0} timed out")]
    Timeout(ChatId),
}

/// Sends text to a chat endpoint.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: ChatId, notification: &Notification) -> Result<(), NotifyError>;
}
