// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # b24api
//!
//! Client for the Bitrix24 REST API with batched, lazily streamed list
//! gathering.
//!
//! ## Features
//!
//! - **Single calls** through any [`Transport`], retried per [`RetryPolicy`](http::RetryPolicy)
//! - **Batches** of any length, chunked into envelopes of at most 50 calls
//! - **List strategies**: sequential, batched with count, batched without
//!   count, and reference-batched without count
//! - **Lazy streams**: nothing is sent until the stream is polled, and
//!   dropping it stops all further requests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use b24api::{ApiClient, Request, Settings};
//! use futures::TryStreamExt;
//!
//! #[tokio::main]
//! async fn main() -> b24api::Result<()> {
//!     let client = ApiClient::from_settings(&Settings::from_env()?)?;
//!
//!     let profile = client.call(&Request::new("profile")).await?;
//!
//!     let mut deals = client.list_batched_no_count(
//!         Request::new("crm.deal.list").param("select", serde_json::json!(["ID", "TITLE"])),
//!     );
//!     while let Some(deal) = deals.try_next().await? {
//!         println!("{deal}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          ApiClient                              │
//! │  call()  batch()  list_*()  reference_batched_no_count()        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────┬───────────────────────────┐
//! │  Pagination  │       Batching       │        Transport          │
//! ├──────────────┼──────────────────────┼───────────────────────────┤
//! │ Sequential   │ BatchChunker         │ HttpTransport (reqwest)   │
//! │ Batched      │ Envelope / cmd keys  │ RetryPolicy               │
//! │ No count     │ Result re-ordering   │ Rate limit (governor)     │
//! │ Reference    │                      │                           │
//! └──────────────┴──────────────────────┴───────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Requests and batch envelopes
pub mod request;

/// Response parsing
pub mod response;

/// HTTP transport with retry and rate limiting
pub mod http;

/// Lazy batch chunking
pub mod batch;

/// Call executor and client configuration
pub mod client;

/// List gathering strategies
pub mod pagination;

/// Settings loading
pub mod config;

/// Command-line interface
pub mod cli;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{ApiClient, ClientConfig, ListStrategy};
pub use config::Settings;
pub use error::{Error, ErrorClass, Result};
pub use http::{HttpTransport, HttpTransportConfig, RetryPolicy, Transport};
pub use request::{BatchRequest, Request};
pub use response::{ApiResponse, CallResult};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
