/*!
 * Retry policy for calls to unreliable external collaborators.
 *
 * Every judge or rewriter call goes through `RetryPolicy::execute`. The caller
 * injects a classifier that splits failures into retryable (rate limits,
 * transient network trouble) and fatal (authentication, unparseable
 * responses). Retryable failures are retried with exponential backoff up to
 * `max_attempts`; fatal failures are surfaced immediately and unchanged.
 *
 * The policy is a plain value with no interior state, so one policy can be
 * shared by any number of concurrent sessions.
 */

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a failed attempt should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Transient failure, another attempt may succeed
    Retryable,
    /// Permanent failure, retrying would fail the same way
    Fatal,
}

/// Outcome of a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The operation returned a value
    Succeeded,
    /// The operation failed with a retryable error
    Retryable,
    /// The operation failed with a fatal error
    Fatal,
}

/// Transient record of one attempt, handed to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based attempt number
    pub attempt_number: u32,
    /// Wait that preceded this attempt (zero for the first)
    pub delay_before_attempt: Duration,
    /// What happened
    pub outcome: AttemptOutcome,
}

/// All attempts were spent on retryable failures
#[derive(Error, Debug, Clone, PartialEq)]
#[error("gave up after {attempts} attempts: {last_error}")]
pub struct ExhaustedError<E: std::fmt::Display> {
    /// Number of times the operation was invoked
    pub attempts: u32,
    /// The error returned by the final attempt
    pub last_error: E,
}

/// Failure surfaced by `RetryPolicy::execute`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetryError<E: std::fmt::Display> {
    /// A fatal error, passed through without retrying
    #[error("{0}")]
    Fatal(E),

    /// Retryable errors until every attempt was spent
    #[error("{0}")]
    Exhausted(ExhaustedError<E>),
}

impl<E: std::fmt::Display> RetryError<E> {
    /// The underlying collaborator error, whichever way the policy gave up
    pub fn last_error(&self) -> &E {
        match self {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted(exhausted) => &exhausted.last_error,
        }
    }

    /// Number of times the operation ran before giving up
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::Fatal(_) => None,
            RetryError::Exhausted(exhausted) => Some(exhausted.attempts),
        }
    }
}

/// Exponential backoff policy
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of invocations of the operation (at least 1)
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub base_delay: Duration,
    /// Growth factor applied to the wait for each further attempt
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default multiplier of 2
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Default::default()
        }
    }

    /// Set the backoff multiplier.
    pub fn with_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Wait before `attempt` (1-based): zero for the first attempt, then
    /// `base_delay * multiplier^(attempt - 2)`, saturating at `Duration::MAX`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 || self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Every wait the policy can insert, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (2..=self.max_attempts.max(1))
            .map(|attempt| self.delay_before(attempt))
            .collect()
    }

    /// Sum of all waits when every attempt fails retryably.
    pub fn total_delay(&self) -> Duration {
        self.schedule()
            .into_iter()
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Run `operation` under this policy.
    pub async fn execute<T, E, F, Fut, C>(
        &self,
        operation: F,
        classify: C,
    ) -> Result<T, RetryError<E>>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> ErrorClass,
    {
        self.execute_observed(operation, classify, |_| {}).await
    }

    /// Run `operation` under this policy, reporting every attempt to `observer`.
    pub async fn execute_observed<T, E, F, Fut, C, O>(
        &self,
        mut operation: F,
        classify: C,
        mut observer: O,
    ) -> Result<T, RetryError<E>>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> ErrorClass,
        O: FnMut(&RetryAttempt),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match operation().await {
                Ok(value) => {
                    observer(&RetryAttempt {
                        attempt_number: attempt,
                        delay_before_attempt: delay,
                        outcome: AttemptOutcome::Succeeded,
                    });
                    if attempt > 1 {
                        debug!("Succeeded on attempt {}/{}", attempt, max_attempts);
                    }
                    return Ok(value);
                }
                Err(error) => match classify(&error) {
                    ErrorClass::Fatal => {
                        observer(&RetryAttempt {
                            attempt_number: attempt,
                            delay_before_attempt: delay,
                            outcome: AttemptOutcome::Fatal,
                        });
                        return Err(RetryError::Fatal(error));
                    }
                    ErrorClass::Retryable => {
                        observer(&RetryAttempt {
                            attempt_number: attempt,
                            delay_before_attempt: delay,
                            outcome: AttemptOutcome::Retryable,
                        });
                        if attempt >= max_attempts {
                            return Err(RetryError::Exhausted(ExhaustedError {
                                attempts: attempt,
                                last_error: error,
                            }));
                        }
                        warn!(
                            "Attempt {}/{} failed: {}. Retrying in {:?}",
                            attempt,
                            max_attempts,
                            error,
                            self.delay_before(attempt + 1)
                        );
                        attempt += 1;
                    }
                },
            }
        }
    }
}
