//! # Circuit Breaker
//!
//! Count-based circuit breaker guarding one kind of upstream operation.
//!
//! # States
//!
//! ```text
//! Closed ──(failure rate ≥ threshold over window)──> Open
//! Open ──(open duration elapsed, next call)──> HalfOpen (one trial call)
//! HalfOpen ──(trial succeeds)──> Closed
//! HalfOpen ──(trial fails)──> Open
//! ```
//!
//! The breaker is shared process-wide by every concurrent caller of the
//! operation it guards. State lives behind a short-held lock that is never
//! held across an `.await`.
//!
//! # Examples
//!
//! ```
//! use similar_products::application::services::circuit_breaker::{
//!     CircuitBreaker, CircuitBreakerConfig, CircuitState,
//! };
//!
//! let breaker = CircuitBreaker::new("product-details", CircuitBreakerConfig::default());
//! assert_eq!(breaker.state(), CircuitState::Closed);
//! ```

use crate::application::services::retry::Retryable;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tokio::time::{Duration, Instant};

/// Default failure rate, in percent, that opens the circuit.
const DEFAULT_FAILURE_RATE_THRESHOLD: f64 = 50.0;

/// Default number of outcomes kept in the sliding window.
const DEFAULT_SLIDING_WINDOW_SIZE: usize = 20;

/// Default number of outcomes required before the rate is evaluated.
const DEFAULT_MINIMUM_NUMBER_OF_CALLS: usize = 10;

/// Default time the circuit stays open, in milliseconds.
const DEFAULT_OPEN_DURATION_MS: u64 = 10_000;

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failure rate in percent at or above which the circuit opens.
    pub failure_rate_threshold: f64,
    /// Number of most recent outcomes considered.
    pub sliding_window_size: usize,
    /// Outcomes required in the window before the rate is evaluated,
    /// capped at `sliding_window_size`.
    pub minimum_number_of_calls: usize,
    /// How long the circuit stays open before admitting a trial call.
    pub open_duration_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: DEFAULT_FAILURE_RATE_THRESHOLD,
            sliding_window_size: DEFAULT_SLIDING_WINDOW_SIZE,
            minimum_number_of_calls: DEFAULT_MINIMUM_NUMBER_OF_CALLS,
            open_duration_ms: DEFAULT_OPEN_DURATION_MS,
        }
    }
}

impl CircuitBreakerConfig {
    /// Sets the failure rate threshold in percent.
    #[must_use]
    pub fn with_failure_rate_threshold(mut self, percent: f64) -> Self {
        self.failure_rate_threshold = percent;
        self
    }

    /// Sets the sliding window size.
    #[must_use]
    pub fn with_sliding_window_size(mut self, size: usize) -> Self {
        self.sliding_window_size = size;
        self
    }

    /// Sets the minimum number of calls before evaluation.
    #[must_use]
    pub fn with_minimum_number_of_calls(mut self, calls: usize) -> Self {
        self.minimum_number_of_calls = calls;
        self
    }

    /// Sets the open duration.
    #[must_use]
    pub fn with_open_duration(mut self, open_duration_ms: u64) -> Self {
        self.open_duration_ms = open_duration_ms;
        self
    }

    /// Returns the open duration.
    #[must_use]
    pub fn open_duration(&self) -> Duration {
        Duration::from_millis(self.open_duration_ms)
    }
}

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Calls pass through.
    Closed,
    /// Calls fail fast.
    Open,
    /// One trial call decides whether to close again.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Error returned by a guarded call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitBreakerError<E> {
    /// The call was rejected without reaching upstream.
    #[error("circuit breaker '{name}' is open")]
    Open {
        /// Name of the breaker that rejected the call.
        name: String,
    },

    /// The call ran and failed.
    #[error("{0}")]
    Inner(E),
}

impl<E: Retryable> Retryable for CircuitBreakerError<E> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Open { .. } => false,
            Self::Inner(error) => error.is_retryable(),
        }
    }
}

/// Result type for guarded calls.
pub type CircuitBreakerResult<T, E> = Result<T, CircuitBreakerError<E>>;

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    /// `true` marks a failure.
    outcomes: VecDeque<bool>,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

impl BreakerState {
    fn failure_rate(&self) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        let failures = self.outcomes.iter().filter(|failed| **failed).count();
        Some(failures as f64 * 100.0 / self.outcomes.len() as f64)
    }
}

/// Count-based circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Creates a closed circuit breaker.
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                outcomes: VecDeque::with_capacity(config.sliding_window_size),
                opened_at: None,
                trial_in_flight: false,
            }),
            config,
        }
    }

    /// Returns the breaker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Returns the current state.
    ///
    /// An open circuit whose open duration has elapsed still reports `Open`
    /// until the next call is admitted as the trial.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.state.lock().state
    }

    /// Returns the failure rate over the current window, in percent.
    #[must_use]
    pub fn failure_rate(&self) -> Option<f64> {
        self.state.lock().failure_rate()
    }

    /// Runs `operation` through the breaker.
    ///
    /// `is_failure` decides whether an error counts against upstream health.
    /// Errors for which it returns `false` are recorded as successes.
    ///
    /// # Errors
    ///
    /// Returns `CircuitBreakerError::Open` without polling `operation` if the
    /// circuit rejects the call, or `CircuitBreakerError::Inner` with the
    /// operation's own error.
    pub async fn call<T, E, Fut>(
        &self,
        operation: Fut,
        is_failure: impl Fn(&E) -> bool,
    ) -> CircuitBreakerResult<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = self.try_acquire::<E>()?;
        let result = operation.await;
        let failed = match &result {
            Ok(_) => false,
            Err(error) => is_failure(error),
        };
        permit.record(failed);
        result.map_err(CircuitBreakerError::Inner)
    }

    fn try_acquire<E>(&self) -> CircuitBreakerResult<Permit<'_>, E> {
        let mut state = self.state.lock();
        match state.state {
            CircuitState::Closed => Ok(Permit::new(self, false)),
            CircuitState::Open => {
                let elapsed = state
                    .opened_at
                    .is_none_or(|opened_at| opened_at.elapsed() >= self.config.open_duration());
                if elapsed {
                    state.state = CircuitState::HalfOpen;
                    state.trial_in_flight = true;
                    tracing::info!(breaker = %self.name, "circuit breaker half-open, admitting trial call");
                    Ok(Permit::new(self, true))
                } else {
                    Err(self.rejected())
                }
            }
            CircuitState::HalfOpen if !state.trial_in_flight => {
                state.trial_in_flight = true;
                Ok(Permit::new(self, true))
            }
            CircuitState::HalfOpen => Err(self.rejected()),
        }
    }

    fn rejected<E>(&self) -> CircuitBreakerError<E> {
        tracing::debug!(breaker = %self.name, "circuit breaker rejected call");
        CircuitBreakerError::Open {
            name: self.name.clone(),
        }
    }

    fn on_outcome(&self, trial: bool, failed: bool) {
        let mut state = self.state.lock();

        if trial {
            state.trial_in_flight = false;
            if failed {
                self.open(&mut state, None);
            } else {
                state.state = CircuitState::Closed;
                state.outcomes.clear();
                state.opened_at = None;
                tracing::info!(breaker = %self.name, "circuit breaker closed after successful trial");
            }
            return;
        }

        // Calls admitted before the circuit opened may finish afterwards.
        if state.state != CircuitState::Closed {
            return;
        }

        let window = self.config.sliding_window_size.max(1);
        state.outcomes.push_back(failed);
        while state.outcomes.len() > window {
            state.outcomes.pop_front();
        }

        // A full window is always enough to evaluate.
        let required = self.config.minimum_number_of_calls.clamp(1, window);
        if state.outcomes.len() >= required {
            let rate = state.failure_rate();
            if rate.is_some_and(|rate| rate >= self.config.failure_rate_threshold) {
                self.open(&mut state, rate);
            }
        }
    }

    fn open(&self, state: &mut BreakerState, failure_rate: Option<f64>) {
        state.state = CircuitState::Open;
        state.opened_at = Some(Instant::now());
        state.outcomes.clear();
        tracing::warn!(
            breaker = %self.name,
            failure_rate = failure_rate.unwrap_or(100.0),
            open_duration_ms = self.config.open_duration_ms,
            "circuit breaker opened"
        );
    }

    fn release_trial(&self) {
        let mut state = self.state.lock();
        state.trial_in_flight = false;
    }
}

/// Admission to run one call. Records exactly one outcome.
///
/// Dropping an unrecorded trial permit frees the half-open slot so a
/// cancelled trial cannot wedge the breaker.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    recorded: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            recorded: false,
        }
    }

    fn record(mut self, failed: bool) {
        self.recorded = true;
        self.breaker.on_outcome(self.trial, failed);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.recorded {
            self.breaker.release_trial();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum TestError {
        Down,
        Missing,
    }

    fn is_failure(error: &TestError) -> bool {
        matches!(error, TestError::Down)
    }

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig::default()
                .with_sliding_window_size(4)
                .with_minimum_number_of_calls(4)
                .with_failure_rate_threshold(50.0)
                .with_open_duration(1000),
        )
    }

    async fn succeed(breaker: &CircuitBreaker) -> CircuitBreakerResult<u32, TestError> {
        breaker.call(async { Ok(1) }, is_failure).await
    }

    async fn fail(breaker: &CircuitBreaker) -> CircuitBreakerResult<u32, TestError> {
        breaker.call(async { Err(TestError::Down) }, is_failure).await
    }

    #[tokio::test]
    async fn stays_closed_below_minimum_calls() {
        let breaker = breaker();
        for _ in 0..3 {
            let _ = fail(&breaker).await;
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_rate(), Some(100.0));
    }

    #[tokio::test]
    async fn opens_when_rate_reaches_threshold() {
        let breaker = breaker();
        let _ = succeed(&breaker).await;
        let _ = succeed(&breaker).await;
        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Closed);
        let _ = fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn full_window_opens_when_minimum_exceeds_window() {
        let breaker = CircuitBreaker::new(
            "small-window",
            CircuitBreakerConfig::default()
                .with_sliding_window_size(5)
                .with_minimum_number_of_calls(10),
        );
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }
        assert_eq!(breaker.state(), CircuitState::Closed);

        let _ = fail(&breaker).await;

        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn open_circuit_fails_fast_without_running_operation() {
        let breaker = breaker();
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }

        let mut ran = false;
        let result: CircuitBreakerResult<u32, TestError> = breaker
            .call(
                async {
                    ran = true;
                    Ok(1)
                },
                is_failure,
            )
            .await;

        assert!(matches!(result, Err(CircuitBreakerError::Open { ref name }) if name == "test"));
        assert!(!ran);
    }

    #[tokio::test]
    async fn semantic_errors_do_not_open_the_circuit() {
        let breaker = breaker();
        for _ in 0..10 {
            let result: CircuitBreakerResult<u32, TestError> =
                breaker.call(async { Err(TestError::Missing) }, is_failure).await;
            assert_eq!(result, Err(CircuitBreakerError::Inner(TestError::Missing)));
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_rate(), Some(0.0));
    }

    #[tokio::test]
    async fn window_slides_over_old_outcomes() {
        let breaker = breaker();
        let _ = fail(&breaker).await;
        for _ in 0..4 {
            let _ = succeed(&breaker).await;
        }
        assert_eq!(breaker.failure_rate(), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_trial_success_closes() {
        let breaker = breaker();
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }
        assert!(succeed(&breaker).await.is_err());

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert_eq!(succeed(&breaker).await.unwrap(), 1);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.failure_rate(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_trial_failure_reopens() {
        let breaker = breaker();
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert_eq!(fail(&breaker).await, Err(CircuitBreakerError::Inner(TestError::Down)));
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(matches!(
            succeed(&breaker).await,
            Err(CircuitBreakerError::Open { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn only_one_trial_is_admitted() {
        let breaker = breaker();
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }
        tokio::time::advance(Duration::from_millis(1001)).await;

        let trial = breaker.call(
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, TestError>(1)
            },
            is_failure,
        );
        let concurrent = async {
            tokio::task::yield_now().await;
            succeed(&breaker).await
        };

        let (trial, concurrent) = tokio::join!(trial, concurrent);
        assert_eq!(trial.unwrap(), 1);
        assert!(matches!(concurrent, Err(CircuitBreakerError::Open { .. })));
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_trial_releases_half_open_slot() {
        let breaker = breaker();
        for _ in 0..4 {
            let _ = fail(&breaker).await;
        }
        tokio::time::advance(Duration::from_millis(1001)).await;

        let pending = breaker.call(std::future::pending::<Result<u32, TestError>>(), is_failure);
        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        assert_eq!(succeed(&breaker).await.unwrap(), 1);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn open_error_is_not_retryable() {
        struct Transient;
        impl Retryable for Transient {
            fn is_retryable(&self) -> bool {
                true
            }
        }

        let open: CircuitBreakerError<Transient> = CircuitBreakerError::Open {
            name: "x".to_string(),
        };
        assert!(!open.is_retryable());
        assert!(CircuitBreakerError::Inner(Transient).is_retryable());
    }

    #[test]
    fn config_defaults() {
        let config = CircuitBreakerConfig::default();
        assert!((config.failure_rate_threshold - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.sliding_window_size, 20);
        assert_eq!(config.minimum_number_of_calls, 10);
        assert_eq!(config.open_duration(), Duration::from_secs(10));
    }
}
