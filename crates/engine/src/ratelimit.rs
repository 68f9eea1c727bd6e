//! Per-recipient alert rate limiter.
//!
//! Fixed one-hour windows with a small quota, process-local and
//! intentionally ephemeral: state is lost on restart and never persisted.
//! Denial is silent policy, not an error — callers skip the send without
//! marking the subscription as notified, so a later tick retries once the
//! window resets.
//!
//! The engine owns this single-threaded (ticks never overlap), so no
//! internal synchronization is needed.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Window state for one recipient. Created lazily on first send attempt.
#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    reset_at: DateTime<Utc>,
    last_sent: Option<DateTime<Utc>>,
}

/// Caps outbound alerts per recipient per rolling window.
pub struct AlertRateLimiter {
    entries: HashMap<String, RateLimitEntry>,
    quota: u32,
    window: Duration,
}

impl AlertRateLimiter {
    pub fn new(quota: u32, window_secs: i64) -> Self {
        Self {
            entries: HashMap::new(),
            quota,
            window: Duration::seconds(window_secs),
        }
    }

    /// Try to consume one send slot for `recipient`. Returns `false` when
    /// the quota for the current window is exhausted.
    pub fn try_consume(&mut self, recipient: &str, now: DateTime<Utc>) -> bool {
        let key = recipient.to_lowercase();
        match self.entries.get_mut(&key) {
            None => {
                self.entries.insert(
                    key,
                    RateLimitEntry {
                        count: 1,
                        reset_at: now + self.window,
                        last_sent: None,
                    },
                );
                true
            }
            Some(entry) => {
                if now > entry.reset_at {
                    entry.count = 1;
                    entry.reset_at = now + self.window;
                    true
                } else if entry.count < self.quota {
                    entry.count += 1;
                    true
                } else {
                    debug!(
                        recipient = %recipient,
                        count = entry.count,
                        reset_at = %entry.reset_at,
                        "alert rate limit reached, deferring send"
                    );
                    false
                }
            }
        }
    }

    /// Record a completed send without touching the counter. For callers
    /// that already consumed a slot via [`try_consume`](Self::try_consume).
    pub fn record_sent(&mut self, recipient: &str, now: DateTime<Utc>) {
        let key = recipient.to_lowercase();
        self.entries
            .entry(key)
            .and_modify(|e| e.last_sent = Some(now))
            .or_insert(RateLimitEntry {
                count: 0,
                reset_at: now + self.window,
                last_sent: Some(now),
            });
    }

    /// Drop entries whose window has expired, bounding the map to
    /// recently-active recipients.
    pub fn sweep(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, e| e.reset_at > now);
    }

    /// Number of recipients currently tracked.
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}
