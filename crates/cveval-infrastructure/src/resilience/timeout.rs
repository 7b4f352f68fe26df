//! Adaptive timeout registry (§4.5): process-scoped, keyed by
//! `(endpoint, operation)`, concurrency-safe via `dashmap`.

use std::time::Duration;

use dashmap::DashMap;

/// Bounds and starting point for an endpoint/operation's adaptive timeout.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// The lower bound `current` is never allowed to drop below.
    pub min: Duration,
    /// The upper bound `current` is never allowed to exceed.
    pub max: Duration,
    /// The starting value for a key seen for the first time.
    pub initial: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(500),
            max: Duration::from_secs(30),
            initial: Duration::from_secs(5),
        }
    }
}

/// Process-wide adaptive per-call timeout, one entry per `(endpoint, operation)`.
pub struct AdaptiveTimeoutRegistry {
    entries: DashMap<(String, String), Duration>,
    config: TimeoutConfig,
}

impl AdaptiveTimeoutRegistry {
    /// Build a registry with the given bounds.
    #[must_use]
    pub fn new(config: TimeoutConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// The current timeout to apply for `(endpoint, operation)`.
    #[must_use]
    pub fn current(&self, endpoint: &str, operation: &str) -> Duration {
        let key = (endpoint.to_owned(), operation.to_owned());
        *self.entries.entry(key).or_insert(self.config.initial)
    }

    fn clamp(&self, value: Duration) -> Duration {
        value.clamp(self.config.min, self.config.max)
    }

    /// Fast successes (duration under half the current timeout) nudge the
    /// timeout down; everything else leaves it unchanged.
    pub fn on_success(&self, endpoint: &str, operation: &str, duration: Duration) {
        let key = (endpoint.to_owned(), operation.to_owned());
        let mut entry = self.entries.entry(key).or_insert(self.config.initial);
        if duration < *entry / 2 {
            let scaled = entry.mul_f64(0.95);
            *entry = self.clamp(scaled);
        }
    }

    /// A content-level failure (not a timeout) nudges the timeout up.
    pub fn on_failure(&self, endpoint: &str, operation: &str) {
        let key = (endpoint.to_owned(), operation.to_owned());
        let mut entry = self.entries.entry(key).or_insert(self.config.initial);
        let scaled = entry.mul_f64(1.05);
        *entry = self.clamp(scaled);
    }

    /// An actual timeout nudges the timeout up more aggressively.
    pub fn on_timeout(&self, endpoint: &str, operation: &str) {
        let key = (endpoint.to_owned(), operation.to_owned());
        let mut entry = self.entries.entry(key).or_insert(self.config.initial);
        let scaled = entry.mul_f64(1.10);
        *entry = self.clamp(scaled);
    }
}
