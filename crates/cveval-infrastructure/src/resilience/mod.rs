//! Circuit breaker + adaptive timeout (§4.5), combined into a single guard
//! used by every outbound provider call in `cveval-providers`.

mod breaker;
mod timeout;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use cveval_domain::error::{Error, Result};
use cveval_domain::ports::MetricsProvider;

pub use breaker::{BreakerConfig, CircuitBreakerRegistry};
pub use timeout::{AdaptiveTimeoutRegistry, TimeoutConfig};

/// Combined resilience policy for one provider: a circuit breaker and an
/// adaptive timeout, both keyed by `(endpoint, operation)`.
pub struct ResilienceGuard {
    breaker: CircuitBreakerRegistry,
    timeouts: AdaptiveTimeoutRegistry,
}

impl ResilienceGuard {
    /// Build a guard from its two configs, publishing breaker transitions through `metrics`.
    #[must_use]
    pub fn new(breaker_config: BreakerConfig, timeout_config: TimeoutConfig, metrics: Arc<dyn MetricsProvider>) -> Self {
        Self {
            breaker: CircuitBreakerRegistry::new(breaker_config, metrics),
            timeouts: AdaptiveTimeoutRegistry::new(timeout_config),
        }
    }

    /// Read-only snapshot of every tracked breaker, for the worker's `health` CLI.
    #[must_use]
    pub fn breaker_snapshot(&self) -> Vec<(String, String, cveval_domain::entities::BreakerStatus)> {
        self.breaker.snapshot()
    }

    /// Run `f` under the breaker and adaptive timeout for `(endpoint, operation)`.
    ///
    /// Short-circuits with `on_timeout()` if the breaker is open, or if `f`
    /// does not complete within the current adaptive timeout. `on_timeout`
    /// lets each provider raise the error variant proper to its own
    /// operation (`EmbedFailed`, `VectorSearchFailed`, ...) instead of this
    /// generic layer guessing one.
    pub async fn guard<F, Fut, T>(&self, endpoint: &str, operation: &str, on_timeout: impl FnOnce() -> Error, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.breaker.is_eligible(endpoint, operation) {
            return Err(Error::BreakerOpen {
                endpoint: endpoint.to_owned(),
                operation: operation.to_owned(),
            });
        }

        let budget = self.timeouts.current(endpoint, operation);
        let started_at = Instant::now();
        match tokio::time::timeout(budget, f()).await {
            Ok(Ok(value)) => {
                self.breaker.record_success(endpoint, operation);
                self.timeouts.on_success(endpoint, operation, started_at.elapsed());
                Ok(value)
            }
            Ok(Err(err)) => {
                self.breaker.record_failure(endpoint, operation);
                self.timeouts.on_failure(endpoint, operation);
                Err(err)
            }
            Err(_elapsed) => {
                self.breaker.record_failure(endpoint, operation);
                self.timeouts.on_timeout(endpoint, operation);
                Err(on_timeout())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use cveval_domain::ports::metrics::Labels;

    use super::*;

    #[derive(Default)]
    struct NoOpMetrics;
    impl MetricsProvider for NoOpMetrics {
        fn increment(&self, _name: &str, _labels: &Labels<'_>) {}
        fn gauge(&self, _name: &str, _value: f64, _labels: &Labels<'_>) {}
        fn histogram(&self, _name: &str, _value: f64, _labels: &Labels<'_>) {}
    }

    fn guard() -> ResilienceGuard {
        ResilienceGuard::new(
            BreakerConfig {
                failure_threshold: 2,
                cooldown: Duration::from_millis(10),
                success_threshold: 1,
            },
            TimeoutConfig {
                min: Duration::from_millis(5),
                max: Duration::from_millis(50),
                initial: Duration::from_millis(20),
            },
            Arc::new(NoOpMetrics),
        )
    }

    #[tokio::test]
    async fn successful_call_passes_value_through() {
        let guard = guard();
        let result = guard
            .guard("llm", "evaluate", || unreachable!("no timeout expected"), || async { Ok(42) })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn repeated_failures_open_the_breaker_and_short_circuit() {
        let guard = guard();
        let attempts = AtomicUsize::new(0);
        for _ in 0..2 {
            let _ = guard
                .guard("llm", "evaluate", || unreachable!(), || {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    async {
                        Err(Error::LlmTransport {
                            operation: "evaluate".to_owned(),
                            message: "boom".to_owned(),
                        })
                    }
                })
                .await;
        }
        let outcome = guard
            .guard("llm", "evaluate", || unreachable!(), || async { Ok(()) })
            .await;
        assert!(matches!(outcome, Err(Error::BreakerOpen { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_call_times_out_and_invokes_caller_supplied_error() {
        let guard = ResilienceGuard::new(
            BreakerConfig::default(),
            TimeoutConfig {
                min: Duration::from_millis(1),
                max: Duration::from_millis(50),
                initial: Duration::from_millis(5),
            },
            Arc::new(NoOpMetrics),
        );
        let outcome: Result<()> = guard
            .guard(
                "embed",
                "embed_batch",
                || Error::EmbedFailed {
                    message: "timed out".to_owned(),
                },
                || async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(())
                },
            )
            .await;
        assert!(matches!(outcome, Err(Error::EmbedFailed { .. })));
    }
}
