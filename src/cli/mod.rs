//! CLI module
//!
//! Command-line interface over [`ApiClient`](crate::ApiClient).
//!
//! # Commands
//!
//! - `call` - Call one method
//! - `batch` - Run JSON-lines requests through batch envelopes
//! - `list` - Gather a whole list with a chosen strategy
//! - `reference` - Gather one list per filter update

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, StrategyArg};
pub use runner::Runner;
