//! Per-actor fixed-window rate limiting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::ChatId;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default number of actions allowed per window.
pub const DEFAULT_ACTIONS_PER_WINDOW: u32 = 20;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Windows idle for this long are dropped by [`RateLimiter::cleanup`].
const STALE_AFTER: Duration = Duration::from_secs(300);

struct Window {
    count: u32,
    started: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<ChatId, Window>>>,
    max_actions: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_actions: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_actions,
            window,
        }
    }

    /// Counts one action for `actor`. Returns `false` once the actor has
    /// used up the current window.
    pub async fn check(&self, actor: ChatId) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let entry = windows.entry(actor).or_insert_with(|| Window {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }

        entry.count = entry.count.saturating_add(1);
        entry.count <= self.max_actions
    }

    /// Forgets actors whose window started long ago.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let cutoff = STALE_AFTER.max(self.window);
        self.windows
            .lock()
            .await
            .retain(|_, w| now.duration_since(w.started) < cutoff);
    }

    pub async fn tracked_actors(&self) -> usize {
        self.windows.lock().await.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIONS_PER_WINDOW, DEFAULT_WINDOW)
    }
}
