//! Consecutive-failure circuit breaker guarding the cache tiers.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_RECOVERY_TIMEOUT_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    /// One trial call is in flight.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        })
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    /// Time since the last failure before a trial call is admitted.
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: Duration::from_secs(DEFAULT_RECOVERY_TIMEOUT_SECS),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub total_failures: u64,
    pub total_successes: u64,
    /// Calls rejected without running.
    pub short_circuited: u64,
    pub times_opened: u64,
    pub millis_since_last_failure: Option<u64>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    total_failures: u64,
    total_successes: u64,
    short_circuited: u64,
    times_opened: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure: None,
            total_failures: 0,
            total_successes: 0,
            short_circuited: 0,
            times_opened: 0,
        }
    }
}

/// Opens after `failure_threshold` consecutive failures; admits a single trial
/// call once `recovery_timeout` has passed since the last failure.
///
/// Callers that get `true` from [`CircuitBreaker::try_acquire`] must report the
/// outcome with [`record_success`](CircuitBreaker::record_success) or
/// [`record_failure`](CircuitBreaker::record_failure).
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BreakerState::new()),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Returns `true` if the caller may run the guarded operation.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let recovered = inner
                    .last_failure
                    .is_none_or(|at| at.elapsed() >= self.config.recovery_timeout);
                if recovered {
                    inner.state = CircuitState::HalfOpen;
                    debug!("Circuit half-open, admitting trial call");
                    true
                } else {
                    inner.short_circuited += 1;
                    false
                }
            }
            CircuitState::HalfOpen => {
                inner.short_circuited += 1;
                false
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.total_successes += 1;
        inner.consecutive_failures = 0;
        if inner.state != CircuitState::Closed {
            info!(previous = %inner.state, "Circuit closed");
            inner.state = CircuitState::Closed;
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.total_failures += 1;
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.last_failure = Some(Instant::now());

        let should_open = inner.state == CircuitState::HalfOpen
            || inner.consecutive_failures >= self.config.failure_threshold;
        if should_open && inner.state != CircuitState::Open {
            inner.state = CircuitState::Open;
            inner.times_opened += 1;
            warn!(
                consecutive_failures = inner.consecutive_failures,
                recovery_timeout_ms = self.config.recovery_timeout.as_millis() as u64,
                "Circuit opened"
            );
        }
    }

    /// Runs `f` if the circuit admits it and records the outcome.
    ///
    /// Returns `None` when the call was short-circuited.
    pub fn call<T, E, F>(&self, f: F) -> Option<Result<T, E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if !self.try_acquire() {
            return None;
        }
        let result = f();
        match result {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }
        Some(result)
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock();
        CircuitBreakerStats {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            total_failures: inner.total_failures,
            total_successes: inner.total_successes,
            short_circuited: inner.short_circuited,
            times_opened: inner.times_opened,
            millis_since_last_failure: inner
                .last_failure
                .map(|at| at.elapsed().as_millis() as u64),
        }
    }

    pub fn reset(&self) {
        *self.inner.lock() = BreakerState::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_breaker(recovery: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig::new(5, recovery))
    }

    fn fail(breaker: &CircuitBreaker, invoked: &Cell<u32>) -> Option<Result<(), &'static str>> {
        breaker.call(|| {
            invoked.set(invoked.get() + 1);
            Err("boom")
        })
    }

    #[test]
    fn test_default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.recovery_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_opens_after_threshold_and_short_circuits() {
        let breaker = fast_breaker(Duration::from_secs(60));
        let invoked = Cell::new(0);

        for _ in 0..5 {
            assert!(fail(&breaker, &invoked).is_some());
        }
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(invoked.get(), 5);

        // 6th and later calls never reach the operation.
        for _ in 0..3 {
            assert!(fail(&breaker, &invoked).is_none());
        }
        assert_eq!(invoked.get(), 5);
        assert_eq!(breaker.stats().short_circuited, 3);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let breaker = fast_breaker(Duration::from_secs(60));
        let invoked = Cell::new(0);

        for _ in 0..4 {
            fail(&breaker, &invoked);
        }
        assert_eq!(breaker.consecutive_failures(), 4);

        let ok: Option<Result<u8, &str>> = breaker.call(|| Ok(1));
        assert!(matches!(ok, Some(Ok(1))));
        assert_eq!(breaker.consecutive_failures(), 0);

        for _ in 0..4 {
            fail(&breaker, &invoked);
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_admits_exactly_one_trial() {
        let breaker = fast_breaker(Duration::from_millis(20));
        let invoked = Cell::new(0);
        for _ in 0..5 {
            fail(&breaker, &invoked);
        }
        assert!(!breaker.try_acquire());

        std::thread::sleep(Duration::from_millis(40));

        assert!(breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(!breaker.try_acquire());
        assert!(!breaker.try_acquire());

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire());
    }

    #[test]
    fn test_failed_trial_reopens_with_fresh_timestamp() {
        let breaker = fast_breaker(Duration::from_millis(30));
        let invoked = Cell::new(0);
        for _ in 0..5 {
            fail(&breaker, &invoked);
        }
        std::thread::sleep(Duration::from_millis(50));

        assert!(fail(&breaker, &invoked).is_some());
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.stats().times_opened, 2);

        // The refreshed timestamp restarts the cooldown.
        assert!(!breaker.try_acquire());
        std::thread::sleep(Duration::from_millis(50));
        assert!(breaker.try_acquire());
    }

    #[test]
    fn test_reset() {
        let breaker = fast_breaker(Duration::from_secs(60));
        let invoked = Cell::new(0);
        for _ in 0..5 {
            fail(&breaker, &invoked);
        }
        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.stats().total_failures, 0);
    }
}
