//! Retry and polling with exponential backoff.
//!
//! Only reads are retried: the Redis aggregate and the history tables are
//! updated asynchronously after an event is published, so the suite polls them
//! until they catch up. Business calls are never retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use wallet_e2e_core::retry::{RetryPolicy, poll_until};
//!
//! let aggregate = poll_until(
//!     &RetryPolicy::default(),
//!     || redis.get_aggregate(wallet_uuid),
//!     |a| a.last_seq_number >= sequence,
//! )
//! .await?;
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// How often and how long to repeat a read.
///
/// The default suits projections that lag a published event by a few hundred
/// milliseconds: 40 retries starting at 50ms, growing by half each time, never
/// more than 1s apart.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Pause before the first retry
    pub initial_delay: Duration,
    /// Longest pause between two attempts
    pub max_delay: Duration,
    /// Growth factor applied to the pause after each retry
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(Duration::from_millis(50), Duration::from_secs(1), 41)
    }
}

impl RetryPolicy {
    /// Backoff growing by 1.5x from `initial` up to `cap`, for `attempts`
    /// reads in total.
    #[must_use]
    pub const fn exponential(initial: Duration, cap: Duration, attempts: usize) -> Self {
        Self {
            max_retries: attempts.saturating_sub(1),
            initial_delay: initial,
            max_delay: cap,
            multiplier: 1.5,
        }
    }

    /// Constant-interval polling: `attempts` tries, `interval` apart.
    #[must_use]
    pub const fn fixed(interval: Duration, attempts: usize) -> Self {
        Self {
            max_retries: attempts.saturating_sub(1),
            initial_delay: interval,
            max_delay: interval,
            multiplier: 1.0,
        }
    }

    /// Same policy with a different growth factor.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Pause after failed attempt number `attempt` (0-based).
    ///
    /// `initial_delay * multiplier ^ attempt`, capped at `max_delay`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.multiplier.powi(exponent);
        if nanos.is_finite() && nanos < self.max_delay.as_nanos() as f64 {
            Duration::from_nanos(nanos as u64)
        } else {
            self.max_delay
        }
    }

    /// Upper bound on the time spent sleeping across all retries.
    #[must_use]
    pub fn total_budget(&self) -> Duration {
        (0..self.max_retries).map(|a| self.delay_for_attempt(a)).sum()
    }
}

/// Retry an async operation on every error.
///
/// # Errors
///
/// Returns the last error once `policy.max_retries` retries are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    retry_with_predicate(policy, operation, |_| true).await
}

/// Retry an async operation while `is_retryable` accepts the error.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last error once retries are
/// exhausted.
pub async fn retry_with_predicate<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(retries = attempt, "Read recovered");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            tracing::warn!(error = %err, "Giving up on non-retryable error");
            return Err(err);
        }
        if attempt >= policy.max_retries {
            tracing::warn!(retries = attempt, error = %err, "Retries exhausted");
            return Err(err);
        }

        let delay = policy.delay_for_attempt(attempt);
        tracing::debug!(retry = attempt + 1, ?delay, error = %err, "Retrying read");
        sleep(delay).await;
        attempt += 1;
    }
}

/// Why [`poll_until`] gave up.
#[derive(Error, Debug)]
pub enum PollError<T, E> {
    /// The read kept succeeding but never satisfied the condition
    #[error("Condition not met after {attempts} attempts (last value: {last:?})")]
    ConditionNotMet {
        /// Reads performed
        attempts: usize,
        /// Value of the final read
        last: T,
    },

    /// The final read failed
    #[error("Read failed after {attempts} attempts: {error}")]
    Failed {
        /// Reads performed
        attempts: usize,
        /// Error of the final read
        error: E,
    },
}

/// Repeat a read until its value satisfies `condition`.
///
/// Read errors are treated as "not there yet" and retried with the same
/// backoff as unsatisfied values.
///
/// # Errors
///
/// Returns [`PollError::ConditionNotMet`] or [`PollError::Failed`] depending on
/// the outcome of the final read.
pub async fn poll_until<F, Fut, T, E, C>(
    policy: &RetryPolicy,
    mut read: F,
    condition: C,
) -> Result<T, PollError<T, E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    C: Fn(&T) -> bool,
{
    let mut attempt = 0;

    loop {
        let outcome = read().await;
        let attempts = attempt + 1;
        match outcome {
            Ok(value) if condition(&value) => {
                tracing::debug!(attempts, "Poll condition met");
                return Ok(value);
            }
            Ok(value) if attempt >= policy.max_retries => {
                return Err(PollError::ConditionNotMet {
                    attempts,
                    last: value,
                });
            }
            Err(error) if attempt >= policy.max_retries => {
                return Err(PollError::Failed { attempts, error });
            }
            Ok(_) => tracing::trace!(attempts, "Poll condition not met yet"),
            Err(error) => tracing::debug!(attempts, error = %error, "Poll read failed"),
        }

        sleep(policy.delay_for_attempt(attempt)).await;
        attempt += 1;
    }
}
