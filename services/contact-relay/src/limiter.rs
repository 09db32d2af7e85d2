// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for contact submissions.
//!
//! Each client address gets its own window, opened by its first submission
//! and lasting `window_secs`. Every submission inside the window counts,
//! admitted or not; once `max_submissions` is reached the rest are denied
//! until the window rolls over.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining submissions in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }

    /// Time until the identity's window resets.
    pub fn reset_in(&self) -> Duration {
        match *self {
            RateLimitResult::Allowed { reset_in, .. } => reset_in,
            RateLimitResult::Limited { retry_after } => retry_after,
        }
    }

    pub fn remaining(&self) -> u32 {
        match *self {
            RateLimitResult::Allowed { remaining, .. } => remaining,
            RateLimitResult::Limited { .. } => 0,
        }
    }
}

/// Counter for one identity's current window.
#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    fn expired(&self, now: Instant, length: Duration) -> bool {
        now.saturating_duration_since(self.started) >= length
    }

    fn reset_in(&self, now: Instant, length: Duration) -> Duration {
        (self.started + length).saturating_duration_since(now)
    }
}

/// Thread-safe rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Per-IP windows
    windows: Arc<RwLock<HashMap<IpAddr, Window>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Submissions admitted per window.
    pub fn limit(&self) -> u32 {
        self.config.max_submissions
    }

    pub fn window(&self) -> Duration {
        self.config.window_duration()
    }

    /// Check and count a submission from `ip` now.
    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        self.check_at(ip, Instant::now()).await
    }

    /// Check and count a submission from `ip` at `now`.
    ///
    /// The read-modify-write happens under one write lock, so concurrent
    /// submissions from the same address are counted exactly once each.
    pub async fn check_at(&self, ip: IpAddr, now: Instant) -> RateLimitResult {
        let length = self.config.window_duration();

        let mut windows = self.windows.write().await;
        let window = windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });

        if window.expired(now, length) {
            window.started = now;
            window.count = 0;
        }

        window.count = window.count.saturating_add(1);
        let reset_in = window.reset_in(now, length);

        if window.count <= self.config.max_submissions {
            RateLimitResult::Allowed {
                remaining: self.config.max_submissions - window.count,
                reset_in,
            }
        } else {
            debug!(%ip, count = window.count, ?reset_in, "Submission rate limit exceeded");
            RateLimitResult::Limited {
                retry_after: reset_in,
            }
        }
    }

    /// Admit-or-deny form of [`RateLimiter::check_at`].
    pub async fn admit(&self, ip: IpAddr, now: Instant) -> bool {
        self.check_at(ip, now).await.is_allowed()
    }

    /// Clean up expired entries (should be called periodically).
    pub async fn cleanup(&self) {
        self.cleanup_at(Instant::now()).await;
    }

    pub async fn cleanup_at(&self, now: Instant) {
        let length = self.config.window_duration();
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, window| !window.expired(now, length));

        let evicted = before - windows.len();
        if evicted > 0 {
            debug!(evicted, remaining = windows.len(), "Evicted expired rate limit windows");
        }
    }

    /// Number of identities currently tracked.
    pub async fn tracked(&self) -> usize {
        self.windows.read().await.len()
    }
}
