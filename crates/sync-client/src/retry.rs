use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Classifies failures the retry policy may absorb.
///
/// Transport and timeout failures are transient; application-level
/// rejections are not and must surface immediately.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("{operation} failed after {attempts} attempts: {last}")]
    Exhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        last: E,
    },
    #[error("{operation} failed with non-retryable error: {error}")]
    Permanent {
        operation: &'static str,
        #[source]
        error: E,
    },
}

impl<E> RetryError<E> {
    pub fn last_error(&self) -> &E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Permanent { error, .. } => error,
        }
    }

    pub fn into_last_error(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Permanent { error, .. } => error,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Exponential backoff without jitter: the delay before retry `n` (0-based)
/// is `base_delay * multiplier^n`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: 3,
        }
    }
}

impl RetryPolicy {
    pub fn next_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        match Duration::try_from_secs_f64(secs) {
            Ok(delay) => delay.min(self.max_delay),
            Err(_) => self.max_delay,
        }
    }

    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub async fn execute<T, E, F, Fut>(
        &self,
        operation: &'static str,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        self.execute_if(operation, E::is_retryable, op).await
    }

    pub async fn execute_if<T, E, F, Fut, P>(
        &self,
        operation: &'static str,
        is_retryable: P,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let budget = self.attempt_budget();
        let mut attempt = 1u32;
        loop {
            debug!(operation, attempt, max_attempts = budget, "executing operation");
            let err = match op().await {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };

            if !is_retryable(&err) {
                return Err(RetryError::Permanent {
                    operation,
                    error: err,
                });
            }

            if attempt >= budget {
                error!(
                    operation,
                    attempts = attempt,
                    error = %err,
                    "all retry attempts failed"
                );
                return Err(RetryError::Exhausted {
                    operation,
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.next_delay(attempt.saturating_sub(1));
            warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transport call failed, retrying"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}
