//! Circuit breaker guarding the decision cache backend (C7).
//!
//! Three states: `Closed` (normal), `Open` (backend presumed down, calls
//! fail fast without touching it), `HalfOpen` (a bounded number of probe
//! calls are let through to test recovery). Configured by a consecutive
//! failure threshold, an open-state timeout, and a half-open success
//! threshold, per spec.md §4.7.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

/// The circuit breaker's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through; failures are counted.
    Closed,
    /// Calls fail fast without reaching the backend.
    Open,
    /// A bounded number of probe calls are allowed through.
    HalfOpen,
}

/// Tuning parameters for a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures in `Closed` state before tripping to `Open`.
    pub failure_threshold: u32,
    /// Seconds to remain `Open` before allowing a `HalfOpen` probe.
    pub open_state_timeout_seconds: u64,
    /// Consecutive successful probes in `HalfOpen` before returning to `Closed`.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_state_timeout_seconds: 30,
            half_open_success_threshold: 2,
        }
    }
}

/// Guards a single backend dependency (e.g. the Redis decision cache).
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: RwLock<CircuitState>,
    consecutive_failures: AtomicU32,
    half_open_successes: AtomicU32,
    opened_at_epoch_seconds: AtomicU64,
}

impl CircuitBreaker {
    /// Creates a breaker with the given configuration, starting `Closed`.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CircuitState::Closed),
            consecutive_failures: AtomicU32::new(0),
            half_open_successes: AtomicU32::new(0),
            opened_at_epoch_seconds: AtomicU64::new(0),
        }
    }

    /// Returns whether a call should be attempted. In `Open` state, flips
    /// to `HalfOpen` and allows the call through once the timeout elapses.
    pub async fn allow_call(&self) -> bool {
        let state = *self.state.read().await;
        match state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let opened_at = self.opened_at_epoch_seconds.load(Ordering::SeqCst);
                let now = Utc::now().timestamp().max(0) as u64;
                if now.saturating_sub(opened_at) >= self.config.open_state_timeout_seconds {
                    let mut state = self.state.write().await;
                    if *state == CircuitState::Open {
                        *state = CircuitState::HalfOpen;
                        self.half_open_successes.store(0, Ordering::SeqCst);
                    }
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Records a successful call.
    pub async fn record_success(&self) {
        let state = *self.state.read().await;
        match state {
            CircuitState::Closed => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
            }
            CircuitState::HalfOpen => {
                let successes = self.half_open_successes.fetch_add(1, Ordering::SeqCst) + 1;
                if successes >= self.config.half_open_success_threshold {
                    let mut state = self.state.write().await;
                    *state = CircuitState::Closed;
                    self.consecutive_failures.store(0, Ordering::SeqCst);
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Records a failed call, tripping the breaker open if the threshold
    /// is reached (or immediately on any `HalfOpen` probe failure).
    pub async fn record_failure(&self) {
        let state = *self.state.read().await;
        match state {
            CircuitState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                if failures >= self.config.failure_threshold {
                    self.trip_open().await;
                }
            }
            CircuitState::HalfOpen => {
                self.trip_open().await;
            }
            CircuitState::Open => {}
        }
    }

    async fn trip_open(&self) {
        let mut state = self.state.write().await;
        *state = CircuitState::Open;
        self.opened_at_epoch_seconds
            .store(Utc::now().timestamp().max(0) as u64, Ordering::SeqCst);
    }

    /// Returns the current state, for health reporting.
    pub async fn state(&self) -> CircuitState {
        *self.state.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

    fn breaker(failure_threshold: u32, half_open_success_threshold: u32) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold,
            open_state_timeout_seconds: 0,
            half_open_success_threshold,
        })
    }

    #[tokio::test]
    async fn trips_open_after_threshold_failures() {
        let breaker = breaker(3, 1);
        for _ in 0..2 {
            breaker.record_failure().await;
        }
        assert_eq!(breaker.state().await, CircuitState::Closed);
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn success_resets_consecutive_failure_count() {
        let breaker = breaker(3, 1);
        breaker.record_failure().await;
        breaker.record_failure().await;
        breaker.record_success().await;
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_closes_after_success_threshold() {
        let breaker = breaker(1, 2);
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Open);
        assert!(breaker.allow_call().await);
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);
        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_failure_reopens_immediately() {
        let breaker = breaker(1, 2);
        breaker.record_failure().await;
        assert!(breaker.allow_call().await);
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Open);
    }
}
