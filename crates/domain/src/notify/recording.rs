use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use common::ChatId;

use super::{Notification, Notifier, NotifyError};

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub chat_id: ChatId,
    pub notification: Notification,
}

#[derive(Debug, Default)]
struct Recorded {
    sent: Vec<SentNotification>,
    attempts: usize,
    fail_all: bool,
    failing: HashSet<ChatId>,
}

/// Notifier that records deliveries instead of sending them.
///
/// Failures can be injected for every chat or for specific chats.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    inner: Mutex<Recorded>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successfully delivered notifications, in order.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.lock().sent.clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<Notification> {
        self.lock()
            .sent
            .iter()
            .filter(|s| s.chat_id == chat_id)
            .map(|s| s.notification.clone())
            .collect()
    }

    /// Number of sends attempted, including failed ones.
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.lock().fail_all = fail;
    }

    pub fn fail_for(&self, chat_id: ChatId) {
        self.lock().failing.insert(chat_id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat_id: ChatId, notification: &Notification) -> Result<(), NotifyError> {
        let mut inner = self.lock();
        inner.attempts += 1;
        if inner.fail_all || inner.failing.contains(&chat_id) {
            return Err(NotifyError::Rejected {
                chat_id,
                reason: "injected failure".to_string(),
            });
        }
        inner.sent.push(SentNotification {
            chat_id,
            notification: notification.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_fails_per_chat() {
        let notifier = RecordingNotifier::new();
        notifier.fail_for(ChatId::new(2));

        notifier
            .send(ChatId::new(1), &Notification::text("a"))
            .await
            .unwrap();
        assert!(notifier
            .send(ChatId::new(2), &Notification::text("b"))
            .await
            .is_err());

        assert_eq!(notifier.attempts(), 2);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(notifier.sent_to(ChatId::new(1))[0].text, "a");
        assert!(notifier.sent_to(ChatId::new(2)).is_empty());
    }
}
