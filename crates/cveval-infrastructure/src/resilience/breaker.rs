//! Circuit breaker registry (§4.5): process-scoped, keyed by
//! `(endpoint, operation)`, concurrency-safe via `dashmap`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cveval_domain::entities::{BreakerState, BreakerStatus};
use cveval_domain::ports::MetricsProvider;
use dashmap::DashMap;

/// Breaker tuning, grounded on the teacher's `ResilienceConfig` fields
/// (`circuit_breaker_failure_threshold`, `circuit_breaker_timeout_secs`,
/// `circuit_breaker_success_threshold`).
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    /// Consecutive failures in `closed` before tripping to `open`.
    pub failure_threshold: u32,
    /// How long `open` holds before the next call is allowed through as a probe.
    pub cooldown: Duration,
    /// Consecutive `half-open` successes required to close.
    pub success_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
            success_threshold: 3,
        }
    }
}

fn status_metric_value(status: BreakerStatus) -> f64 {
    match status {
        BreakerStatus::Closed => 0.0,
        BreakerStatus::HalfOpen => 0.5,
        BreakerStatus::Open => 1.0,
    }
}

/// Process-wide circuit breaker state, one entry per `(endpoint, operation)`.
pub struct CircuitBreakerRegistry {
    entries: DashMap<(String, String), BreakerState>,
    config: BreakerConfig,
    metrics: Arc<dyn MetricsProvider>,
}

impl CircuitBreakerRegistry {
    /// Build a registry with the given tuning, publishing transitions through `metrics`.
    #[must_use]
    pub fn new(config: BreakerConfig, metrics: Arc<dyn MetricsProvider>) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            metrics,
        }
    }

    /// Whether a call may currently proceed for `(endpoint, operation)`.
    ///
    /// `open` entries become eligible again once the cooldown has elapsed,
    /// transitioning to `half-open` as a side effect of this check (the
    /// "next eligibility check" in §4.5).
    pub fn is_eligible(&self, endpoint: &str, operation: &str) -> bool {
        let key = (endpoint.to_owned(), operation.to_owned());
        let mut entry = self.entries.entry(key).or_default();
        match entry.status {
            BreakerStatus::Closed | BreakerStatus::HalfOpen => true,
            BreakerStatus::Open => {
                let cooldown_elapsed = entry
                    .last_failure_at
                    .is_none_or(|at| at.elapsed() >= self.config.cooldown);
                if cooldown_elapsed {
                    entry.status = BreakerStatus::HalfOpen;
                    entry.half_open_successes = 0;
                    self.publish(endpoint, operation, BreakerStatus::HalfOpen);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call.
    pub fn record_success(&self, endpoint: &str, operation: &str) {
        let key = (endpoint.to_owned(), operation.to_owned());
        let mut entry = self.entries.entry(key).or_default();
        match entry.status {
            BreakerStatus::Closed => {
                entry.consecutive_failures = 0;
            }
            BreakerStatus::HalfOpen => {
                entry.half_open_successes += 1;
                if entry.half_open_successes >= self.config.success_threshold {
                    entry.status = BreakerStatus::Closed;
                    entry.consecutive_failures = 0;
                    entry.half_open_successes = 0;
                    self.publish(endpoint, operation, BreakerStatus::Closed);
                }
            }
            BreakerStatus::Open => {}
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self, endpoint: &str, operation: &str) {
        let key = (endpoint.to_owned(), operation.to_owned());
        let mut entry = self.entries.entry(key).or_default();
        entry.last_failure_at = Some(Instant::now());
        match entry.status {
            BreakerStatus::Closed => {
                entry.consecutive_failures += 1;
                if entry.consecutive_failures >= self.config.failure_threshold {
                    entry.status = BreakerStatus::Open;
                    self.publish(endpoint, operation, BreakerStatus::Open);
                }
            }
            BreakerStatus::HalfOpen => {
                entry.status = BreakerStatus::Open;
                entry.half_open_successes = 0;
                self.publish(endpoint, operation, BreakerStatus::Open);
            }
            BreakerStatus::Open => {}
        }
    }

    fn publish(&self, endpoint: &str, operation: &str, status: BreakerStatus) {
        self.metrics
            .record_breaker_status(endpoint, operation, status_metric_value(status));
    }

    /// Read-only snapshot of every tracked breaker, for the worker's `health` CLI.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, String, BreakerStatus)> {
        self.entries
            .iter()
            .map(|entry| {
                let (endpoint, operation) = entry.key().clone();
                (endpoint, operation, entry.value().status)
            })
            .collect()
    }
}
