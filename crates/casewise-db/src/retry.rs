//! Bounded retry for transient database errors.
//!
//! A write can collide with another connection holding the database lock
//! (`SQLITE_BUSY`, "database is locked"), and a remote libSQL connection can
//! drop mid-request. Both clear up on their own, so queries issued through
//! [`crate::CasewiseDb::execute_with`] and [`crate::CasewiseDb::query_with`]
//! are retried with capped exponential backoff. Constraint violations and
//! SQL errors are never retried.

use std::future::Future;
use std::time::Duration;

use casewise_config::DatabaseConfig;

/// Configuration for retry behavior on transient errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl From<&DatabaseConfig> for RetryConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Detect transient errors by message.
///
/// The predicate is intentionally narrow to avoid retrying genuine SQL or
/// constraint errors.
#[must_use]
pub fn is_transient_message(msg: &str) -> bool {
    let msg = msg.to_ascii_lowercase();
    msg.contains("database is locked")
        || msg.contains("database table is locked")
        || msg.contains("sqlite_busy")
        || msg.contains("connection reset")
        || msg.contains("broken pipe")
}

/// Detect transient libSQL errors.
#[must_use]
pub fn is_transient_error(e: &libsql::Error) -> bool {
    is_transient_message(&e.to_string())
}

/// Run `op` until it succeeds, fails with a non-transient error, or
/// `max_attempts` is reached.
///
/// # Errors
///
/// Returns the last error produced by `op`.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_attempts && is_transient(&e) => {
                let delay = config.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "transient database error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
