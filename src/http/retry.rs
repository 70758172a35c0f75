//! Retry policy
//!
//! Wraps one network operation, classifies its failures, and retries the
//! transient ones with exponential backoff. Permanent failures return after a
//! single attempt; exhausting the attempts returns the last failure as is.

use crate::error::{Error, ErrorClass, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// HTTP statuses worth another attempt (any other 5xx is retried too)
pub const DEFAULT_RETRY_STATUSES: [u16; 7] = [423, 425, 429, 500, 502, 503, 507];

/// API error codes signalling throttling
pub const DEFAULT_RETRY_ERRORS: [&str; 2] = ["query_limit_exceeded", "operation_time_limit"];

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry
    pub backoff_factor: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// HTTP statuses treated as transient
    pub retry_statuses: Vec<u16>,
    /// Lowercase API error codes treated as rate limiting
    pub retry_errors: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(300),
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            retry_errors: DEFAULT_RETRY_ERRORS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl RetryPolicy {
    /// Set total attempts
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set backoff parameters
    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, factor: f64, max: Duration) -> Self {
        self.initial_delay = initial;
        self.backoff_factor = factor;
        self.max_delay = max;
        self
    }

    /// Retry immediately, without sleeping between attempts
    #[must_use]
    pub fn without_delay(self) -> Self {
        self.with_backoff(Duration::ZERO, 1.0, Duration::ZERO)
    }

    /// Classify a failure
    pub fn classify(&self, error: &Error) -> ErrorClass {
        match error {
            Error::Timeout { .. } | Error::Transport { .. } => ErrorClass::TransientNetwork,
            Error::Http(e) if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() => {
                ErrorClass::TransientNetwork
            }
            Error::Http(e) => e
                .status()
                .map_or(ErrorClass::PermanentRequest, |s| self.classify_status(s.as_u16())),
            Error::RateLimited { .. } => ErrorClass::RateLimited,
            Error::HttpStatus { status, .. } => self.classify_status(*status),
            Error::Api { code, status, .. } => {
                if self.retry_errors.iter().any(|c| c.eq_ignore_ascii_case(code)) {
                    ErrorClass::RateLimited
                } else {
                    status.map_or(ErrorClass::PermanentRequest, |s| self.classify_status(s))
                }
            }
            Error::BatchItem { .. } | Error::BatchSkipped { .. } => ErrorClass::PartialBatchItem,
            _ => ErrorClass::PermanentRequest,
        }
    }

    fn classify_status(&self, status: u16) -> ErrorClass {
        if status == 429 {
            ErrorClass::RateLimited
        } else if self.retry_statuses.contains(&status) || (500..600).contains(&status) {
            ErrorClass::TransientNetwork
        } else {
            ErrorClass::PermanentRequest
        }
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(retry.min(64) as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        Duration::try_from_secs_f64(delay)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delay before retrying after `error`, honouring an advertised reset window
    pub fn delay_after(&self, retry: u32, error: &Error) -> Duration {
        let delay = self.delay_for(retry);
        match error {
            Error::RateLimited {
                retry_after_seconds,
            } => delay.max(Duration::from_secs(*retry_after_seconds)),
            _ => delay,
        }
    }

    /// Run `operation` until it succeeds, fails permanently, or runs out of attempts
    pub async fn run<T, F, Fut>(&self, name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            attempt += 1;

            let class = self.classify(&error);
            if !class.is_transient() {
                return Err(error);
            }
            if attempt >= max_attempts {
                warn!("{name} failed after {attempt} attempts: {error}");
                return Err(error);
            }

            let delay = self.delay_after(attempt - 1, &error);
            warn!(
                "{} failed ({:?}), attempt {}/{}, retrying in {:?}: {}",
                name, class, attempt, max_attempts, delay, error
            );
            tokio::time::sleep(delay).await;
        }
    }
}
