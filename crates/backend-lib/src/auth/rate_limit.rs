// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Fixed-window rate limiting for login attempts.
//!
//! Every attempt against a key counts, successful or not; a success does not
//! reset the window. Keys share nothing, so per-key updates serialize only at
//! the counter while the rest of the login flow runs concurrently.
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitSettings;

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { retry_after: Duration },
}

/// Attempt window for a single key
#[derive(Debug)]
struct Window {
    attempts: u32,
    started: Instant,
}

/// Rate limiter for login attempts, keyed by source identifier
#[derive(Debug, Clone)]
pub struct LoginRateLimiter {
    windows: Arc<DashMap<String, Window>>,
    window: Duration,
    max_attempts: u32,
}

impl LoginRateLimiter {
    pub fn new(window: Duration, max_attempts: u32) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            window,
            max_attempts,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(
            Duration::from_secs(settings.window_secs),
            settings.max_attempts,
        )
    }

    /// Count one attempt for `key` and decide whether it may proceed.
    ///
    /// The window rolls over lazily: an expired entry restarts rather than
    /// waiting for the sweep.
    pub fn check(&self, key: &str) -> Decision {
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window {
                attempts: 0,
                started: now,
            });

        if now.duration_since(entry.started) >= self.window {
            entry.attempts = 0;
            entry.started = now;
        }

        entry.attempts = entry.attempts.saturating_add(1);

        if entry.attempts > self.max_attempts {
            let elapsed = now.duration_since(entry.started);
            Decision::Deny {
                retry_after: self.window.saturating_sub(elapsed),
            }
        } else {
            Decision::Allow
        }
    }

    /// Drop expired windows to bound memory growth.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, window| now.duration_since(window.started) < self.window);
    }

    /// Number of live windows, expired or not
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Spawn a background task sweeping expired windows once per window.
    pub fn spawn_sweeper(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = self.window;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                self.cleanup();
            }
        })
    }
}
