//! Per-client sliding-window request limiting.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::clock::SharedClock;
use crate::config::ApiConfig;

/// Default number of requests allowed per window
pub const DEFAULT_LIMIT: u32 = 60;

/// Default trailing window (one minute)
pub const DEFAULT_WINDOW_SECS: i64 = 60;

/// Sliding-window rate limiter keyed by client identity.
///
/// Each identity keeps the instants of its accepted requests inside the trailing window.
/// The map shard lock held by `entry` makes prune, check and append one atomic step.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, VecDeque<DateTime<Utc>>>>,
    limit: usize,
    window: Duration,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration, clock: SharedClock) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            limit: limit as usize,
            window,
            clock,
        }
    }

    pub fn from_config(api: &ApiConfig, clock: SharedClock) -> Self {
        Self::new(
            api.rate_limit_requests,
            Duration::seconds(api.rate_limit_window_secs as i64),
            clock,
        )
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record a request for `identity`, returning false when it must be rejected.
    /// Rejected attempts are not recorded.
    pub fn allow(&self, identity: &str) -> bool {
        let now = self.clock.now();
        let cutoff = now - self.window;

        let mut entry = self.windows.entry(identity.to_string()).or_default();
        let timestamps = entry.value_mut();
        prune(timestamps, cutoff);

        if timestamps.len() >= self.limit {
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Evict identities whose window has emptied, returning how many were removed
    pub fn sweep(&self) -> usize {
        let cutoff = self.clock.now() - self.window;
        let before = self.windows.len();
        self.windows.retain(|_, timestamps| {
            prune(timestamps, cutoff);
            !timestamps.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    /// Run `sweep` every `every` on the current tokio runtime
    pub fn spawn_sweeper(&self, every: std::time::Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = limiter.sweep();
                if evicted > 0 {
                    tracing::debug!(
                        "Rate limiter evicted {} idle identities, {} still tracked",
                        evicted,
                        limiter.tracked_identities()
                    );
                }
            }
        })
    }
}

fn prune(timestamps: &mut VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) {
    while timestamps.front().is_some_and(|t| *t <= cutoff) {
        timestamps.pop_front();
    }
}
