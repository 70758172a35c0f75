//! HTTP module
//!
//! Transport, retry policy, and rate limiting for API calls.
//!
//! # Features
//!
//! - **Transport**: one JSON POST per API method, behind the `Transport` trait
//! - **Retry Policy**: classifies failures and retries transient ones with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod rate_limit;
mod retry;
mod transport;

pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::{RetryPolicy, DEFAULT_RETRY_ERRORS, DEFAULT_RETRY_STATUSES};
pub use transport::{normalize_webhook, HttpTransport, HttpTransportConfig, Transport};
