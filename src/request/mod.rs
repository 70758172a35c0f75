//! Request module
//!
//! API calls as plain values.
//!
//! # Overview
//!
//! - `Request` - one method call with its parameters
//! - `BatchRequest` - an ordered group of calls that fits one `batch` envelope
//! - `build_query` - PHP-style query flattening used inside batch commands

mod query;
mod types;

pub use query::build_query;
pub use types::{command_key, BatchRequest, Request};

#[cfg(test)]
mod tests;
