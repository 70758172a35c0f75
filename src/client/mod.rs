//! Client module
//!
//! Executes single calls and batch envelopes through the retry policy and
//! exposes the list-gathering strategies.
//!
//! # Overview
//!
//! - `ApiClient` - cheap to clone; every lazy stream owns a clone
//! - `ClientConfig` - page size, batch size, grouping, retry policy
//! - `ListStrategy` - selects one of the single-filter list strategies

mod config;
mod executor;

pub use config::{ClientConfig, ClientConfigBuilder, ListStrategy};
pub use executor::ApiClient;
