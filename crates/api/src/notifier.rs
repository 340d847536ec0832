//! Production notifiers.

use async_trait::async_trait;
use common::ChatId;
use domain::{Notification, Notifier, NotifyError};
use serde_json::{Value, json};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Delivers notifications through the Telegram Bot API `sendMessage` call.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, TELEGRAM_API)
    }

    /// Points the notifier at another API host.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.base_url, self.token)
    }
}

/// Builds the `sendMessage` request body.
pub fn send_message_body(chat_id: ChatId, notification: &Notification) -> Value {
    let mut body = json!({
        "chat_id": chat_id.as_i64(),
        "text": notification.text,
    });
    if !notification.buttons.is_empty() {
        let keyboard: Vec<Vec<Value>> = notification
            .buttons
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| json!({ "text": b.label, "callback_data": b.data }))
                    .collect()
            })
            .collect();
        body["reply_markup"] = json!({ "inline_keyboard": keyboard });
    }
    body
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: ChatId, notification: &Notification) -> Result<(), NotifyError> {
        let resp: Value = self
            .client
            .post(self.endpoint())
            .json(&send_message_body(chat_id, notification))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?
            .json()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        if resp["ok"].as_bool() == Some(true) {
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                chat_id,
                reason: resp["description"]
                    .as_str()
                    .unwrap_or("unknown error")
                    .to_string(),
            })
        }
    }
}

/// Writes notifications to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, chat_id: ChatId, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            %chat_id,
            text = %notification.text,
            buttons = notification.buttons.iter().map(Vec::len).sum::<usize>(),
            "notification"
        );
        Ok(())
    }
}
