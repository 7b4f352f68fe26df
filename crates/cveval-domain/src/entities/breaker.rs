//! The `BreakerState` entity (§3, §4.5): process-scoped per-endpoint state.
//!
//! This module defines the pure state shape; the concurrency-safe registry
//! that owns a `BreakerState` per `(endpoint, operation)` key lives in
//! `cveval-infrastructure::resilience`, grounded on
//! `crates/mcb-infrastructure/src/config/types/infrastructure.rs`'s
//! `ResilienceConfig` field names.

use std::time::Instant;

/// Current circuit state for one endpoint/operation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStatus {
    /// Calls pass through normally.
    Closed,
    /// Calls are fast-failed without invoking the operation.
    Open,
    /// A limited number of trial calls are allowed through.
    HalfOpen,
}

/// Mutable breaker bookkeeping for one endpoint/operation pair.
#[derive(Debug, Clone)]
pub struct BreakerState {
    /// Current circuit status.
    pub status: BreakerStatus,
    /// Consecutive failure count since the last success (in `Closed`) or
    /// since entering `Open` (in `HalfOpen`, a single failure reopens).
    pub consecutive_failures: u32,
    /// Timestamp of the most recent failure, used to compute cooldown eligibility.
    pub last_failure_at: Option<Instant>,
    /// Successes observed so far while `HalfOpen`.
    pub half_open_successes: u32,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self {
            status: BreakerStatus::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
            half_open_successes: 0,
        }
    }
}
