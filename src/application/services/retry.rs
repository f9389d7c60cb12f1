//! # Retry
//!
//! Bounded retry with exponential backoff for transient failures.
//!
//! Only errors that report themselves as [`Retryable`] are retried. Anything
//! else is returned after the first attempt.
//!
//! # Examples
//!
//! ```
//! use similar_products::application::services::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default()
//!     .with_max_attempts(3)
//!     .with_initial_backoff(100)
//!     .with_max_backoff(250);
//!
//! assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
//! assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
//! assert_eq!(policy.backoff_for(3), Duration::from_millis(250));
//! ```

use crate::domain::errors::ProductError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Default total number of attempts.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry, in milliseconds.
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;

/// Default upper bound on any single delay, in milliseconds.
const DEFAULT_MAX_BACKOFF_MS: u64 = 1_000;

/// Default backoff growth factor.
const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Errors that know whether another attempt may succeed.
pub trait Retryable {
    /// Returns true if the failure is transient.
    fn is_retryable(&self) -> bool;
}

impl Retryable for ProductError {
    fn is_retryable(&self) -> bool {
        ProductError::is_retryable(self)
    }
}

/// Retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Growth factor applied per retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Sets the total number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the initial backoff.
    #[must_use]
    pub fn with_initial_backoff(mut self, backoff_ms: u64) -> Self {
        self.initial_backoff_ms = backoff_ms;
        self
    }

    /// Sets the maximum backoff.
    #[must_use]
    pub fn with_max_backoff(mut self, backoff_ms: u64) -> Self {
        self.max_backoff_ms = backoff_ms;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Returns the delay after the given failed attempt (1-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay = self.initial_backoff_ms as f64 * self.multiplier.max(1.0).powi(exponent);
        let capped = delay.min(self.max_backoff_ms as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Error returned when a retried operation gives up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a transient error.
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Operation name.
        operation: String,
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last_error: E,
    },

    /// An attempt failed with an error that is not worth retrying.
    #[error("{operation} failed with non-retryable error: {error}")]
    NonRetryable {
        /// Operation name.
        operation: String,
        /// Attempts made.
        attempts: u32,
        /// The error.
        error: E,
    },
}

impl<E> RetryError<E> {
    /// Returns the number of attempts made.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::NonRetryable { attempts, .. } => *attempts,
        }
    }

    /// Returns the error of the last attempt.
    #[must_use]
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last_error, .. } => last_error,
            Self::NonRetryable { error, .. } => error,
        }
    }
}

/// Result type for retried operations.
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Runs `attempt` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up.
///
/// # Errors
///
/// Returns `RetryError::NonRetryable` on the first non-transient failure,
/// or `RetryError::Exhausted` with the last error once attempts run out.
pub async fn execute_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        match attempt().await {
            Ok(value) => {
                if attempts > 1 {
                    tracing::debug!(operation, attempts, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if !error.is_retryable() => {
                return Err(RetryError::NonRetryable {
                    operation: operation.to_string(),
                    attempts,
                    error,
                });
            }
            Err(error) if attempts >= max_attempts => {
                tracing::warn!(operation, attempts, error = %error, "retries exhausted");
                return Err(RetryError::Exhausted {
                    operation: operation.to_string(),
                    attempts,
                    last_error: error,
                });
            }
            Err(error) => {
                let delay = policy.backoff_for(attempts);
                tracing::warn!(
                    operation,
                    attempt = attempts,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
