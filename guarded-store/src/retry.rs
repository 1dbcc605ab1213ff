//! Bounded retry for transient store timeouts.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::GuardConfig;
use crate::errors::GuardError;
use crate::types::OperationDescriptor;

/// Fixed-backoff retry policy applied around every guarded operation.
///
/// Only `GuardError::TransientTimeout` is retried. Any other error, and the
/// timeout from the final attempt, is returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(config.max_attempts, config.retry_backoff)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Run `attempt` until it succeeds, fails with a non-transient error, or
    /// the attempt budget is spent.
    pub async fn run<T, F, Fut>(
        &self,
        descriptor: &OperationDescriptor,
        mut attempt: F,
    ) -> Result<T, GuardError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GuardError>>,
    {
        let budget = if descriptor.retryable {
            self.max_attempts
        } else {
            1
        };

        let mut attempt_no = 1;
        loop {
            match attempt().await {
                Ok(value) => {
                    if attempt_no > 1 {
                        info!(
                            operation = descriptor.name,
                            attempt = attempt_no,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt_no < budget => {
                    warn!(
                        operation = descriptor.name,
                        attempt = attempt_no,
                        max_attempts = budget,
                        delay_ms = self.backoff.as_millis() as u64,
                        error = %e,
                        "Transient timeout, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt_no += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        error!(
                            operation = descriptor.name,
                            attempts = attempt_no,
                            error = %e,
                            "Operation timed out on every attempt"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default())
    }
}
