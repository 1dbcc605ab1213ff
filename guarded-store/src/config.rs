//! Configuration types for the GuardedDocumentStore.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::GuardError;

/// Default number of attempts per operation.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts after a transient timeout.
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Default maximum number of documents in one bulk request.
const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Configuration for the GuardedDocumentStore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Total attempts per operation, including the first.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub retry_backoff: Duration,
    /// Maximum number of documents allowed in a single bulk operation.
    /// Set to None to disable the limit (not recommended for production).
    pub max_batch_size: Option<usize>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            max_batch_size: Some(DEFAULT_MAX_BATCH_SIZE),
        }
    }
}

impl GuardConfig {
    /// Create a config with no batch size limit (use with caution).
    pub fn unlimited_batches() -> Self {
        Self {
            max_batch_size: None,
            ..Self::default()
        }
    }

    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GUARD_MAX_ATTEMPTS`: attempts per operation (default: 3)
    /// - `GUARD_RETRY_BACKOFF_MS`: pause between attempts (default: 2000)
    /// - `GUARD_MAX_BATCH_SIZE`: bulk size limit, `0` disables it (default: 1000)
    pub fn from_env() -> Result<Self, GuardError> {
        let mut config = Self::default();

        if let Some(max_attempts) = read_var::<u32>("GUARD_MAX_ATTEMPTS")? {
            if max_attempts == 0 {
                return Err(GuardError::validation(
                    "GUARD_MAX_ATTEMPTS must be at least 1",
                ));
            }
            config.max_attempts = max_attempts;
        }
        if let Some(backoff_ms) = read_var::<u64>("GUARD_RETRY_BACKOFF_MS")? {
            config.retry_backoff = Duration::from_millis(backoff_ms);
        }
        if let Some(max_batch_size) = read_var::<usize>("GUARD_MAX_BATCH_SIZE")? {
            config.max_batch_size = (max_batch_size > 0).then_some(max_batch_size);
        }

        Ok(config)
    }
}

fn read_var<T: FromStr>(name: &str) -> Result<Option<T>, GuardError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| GuardError::validation(format!("{} has invalid value '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}
