//! Bounded retry shared by every schema-validated generation step.

use crate::error::PipelineError;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Attempt cap, inter-attempt delay and elapsed-time cap for one retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
            max_elapsed: Duration::from_secs(300),
        }
    }
}

/// Successful value plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub attempts: u32,
    pub used_fallback: bool,
}

/// Only structured output that failed validation is worth asking again for;
/// backend and transport errors propagate immediately.
pub fn is_retryable(error: &PipelineError) -> bool {
    error.is_schema_validation()
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt or elapsed cap is reached. The last error is returned.
    pub async fn retry<T, F, Fut, P>(
        &self,
        label: &str,
        operation: F,
        retryable: P,
    ) -> Result<RetryOutcome<T>, PipelineError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
        P: Fn(&PipelineError) -> bool,
    {
        let (result, attempts) = self.run(label, operation, &retryable).await;
        result.map(|value| RetryOutcome {
            value,
            attempts,
            used_fallback: false,
        })
    }

    /// Like [`RetryPolicy::retry`], but once retryable failures exhaust the
    /// policy the value from `fallback` is returned instead of the error.
    /// Non-retryable errors still propagate.
    pub async fn retry_or_fallback<T, F, Fut, P, D>(
        &self,
        label: &str,
        operation: F,
        retryable: P,
        fallback: D,
    ) -> Result<RetryOutcome<T>, PipelineError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
        P: Fn(&PipelineError) -> bool,
        D: FnOnce() -> T,
    {
        let (result, attempts) = self.run(label, operation, &retryable).await;
        match result {
            Ok(value) => Ok(RetryOutcome {
                value,
                attempts,
                used_fallback: false,
            }),
            Err(err) if retryable(&err) => {
                warn!(
                    operation = label,
                    attempts,
                    error = %err,
                    "Retries exhausted, using fallback"
                );
                Ok(RetryOutcome {
                    value: fallback(),
                    attempts,
                    used_fallback: true,
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn run<T, F, Fut, P>(
        &self,
        label: &str,
        mut operation: F,
        retryable: &P,
    ) -> (Result<T, PipelineError>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
        P: Fn(&PipelineError) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let start = Instant::now();
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    debug!(operation = label, attempt, "Attempt succeeded");
                    return (Ok(value), attempt);
                }
                Err(err) => {
                    if !retryable(&err) {
                        return (Err(err), attempt);
                    }
                    let out_of_time = start.elapsed() >= self.max_elapsed;
                    if attempt >= max_attempts || out_of_time {
                        warn!(
                            operation = label,
                            attempt,
                            max_attempts,
                            elapsed_ms = start.elapsed().as_millis(),
                            error = %err,
                            "Attempt failed, no retries left"
                        );
                        return (Err(err), attempt);
                    }
                    warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Attempt failed validation, retrying"
                    );
                    if !self.delay.is_zero() {
                        sleep(self.delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
