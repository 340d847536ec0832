use std::sync::Arc;
use std::time::Duration;

use common::ChatId;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use super::{Notification, Notifier, NotifyError};

/// Upper bound on a single send.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Fire-and-forget delivery of notifications.
///
/// Sends run as background tasks bounded by a timeout. Failures are logged
/// and counted but never reach the caller, so a notification can never undo
/// a persisted change.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    admin: ChatId,
    timeout: Duration,
    pending: Arc<Mutex<JoinSet<()>>>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, admin: ChatId) -> Self {
        Self {
            notifier,
            admin,
            timeout: DEFAULT_NOTIFY_TIMEOUT,
            pending: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The administrator's chat.
    pub fn admin_chat(&self) -> ChatId {
        self.admin
    }

    pub async fn notify_customer(&self, chat_id: ChatId, notification: Notification) {
        self.dispatch(chat_id, notification, "customer").await;
    }

    pub async fn notify_admin(&self, notification: Notification) {
        self.dispatch(self.admin, notification, "admin").await;
    }

    /// Waits for every in-flight send to finish.
    pub async fn flush(&self) {
        let mut pending = self.pending.lock().await;
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "notification task panicked");
            }
        }
    }

    async fn dispatch(&self, chat_id: ChatId, notification: Notification, audience: &'static str) {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.timeout;

        let mut pending = self.pending.lock().await;
        // Reap finished sends so the set does not grow without bound.
        while pending.try_join_next().is_some() {}

        pending.spawn(async move {
            let result = match tokio::time::timeout(timeout, notifier.send(chat_id, &notification))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(NotifyError::Timeout(chat_id)),
            };

            match result {
                Ok(()) => tracing::debug!(%chat_id, audience, "notification sent"),
                Err(e) => {
                    metrics::counter!("notifications_failed_total", "audience" => audience)
                        .increment(1);
                    tracing::warn!(%chat_id, audience, error = %e, "failed to send notification");
                }
            }
        });
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("admin", &self.admin)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
