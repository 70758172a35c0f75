//! Response module
//!
//! Parsing of single-call and batch responses.
//!
//! # Overview
//!
//! - `ApiResponse` - `result` plus the paging fields of one call
//! - `BatchResult` - the `result` object of a `batch` call
//! - `CallResult` - one call's outcome inside a batch, success or API error
//! - `normalize_list` - turns any list-method `result` into a plain item list

mod normalize;
mod types;

pub use normalize::normalize_list;
pub use types::{ApiResponse, BatchResult, CallResult, ErrorResponse, ResponseTime};

#[cfg(test)]
mod tests;
