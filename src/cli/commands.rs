//! CLI commands and argument parsing

use crate::client::ListStrategy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bitrix24 REST API client
#[derive(Parser, Debug)]
#[command(name = "b24api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML); defaults to BITRIX24_API_* environment variables
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Webhook URL, overriding the one from settings
    #[arg(short, long, global = true)]
    pub webhook: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Call one method and print its result
    Call {
        /// Method name, e.g. `crm.deal.get`
        method: String,

        /// Parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,
    },

    /// Run requests through batch envelopes
    Batch {
        /// JSON lines of `{"method": ..., "parameters": ...}` (stdin if omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print every item of a list method
    List {
        /// Method name, e.g. `crm.deal.list`
        method: String,

        /// Parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,

        /// Gathering strategy
        #[arg(short, long, default_value = "batched")]
        strategy: StrategyArg,
    },

    /// Print one list per filter update
    Reference {
        /// Method name, e.g. `crm.timeline.comment.list`
        method: String,

        /// JSON lines of filter updates, one per reference
        #[arg(long)]
        updates: PathBuf,

        /// Parameters shared by every reference, as a JSON object
        #[arg(short, long)]
        params: Option<String>,
    },
}

/// List strategy selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    /// One call per page
    Sequential,
    /// Counted first page, rest in batches
    Batched,
    /// Last-page probe instead of a count
    NoCount,
}

impl From<StrategyArg> for ListStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => ListStrategy::Sequential,
            StrategyArg::Batched => ListStrategy::Batched,
            StrategyArg::NoCount => ListStrategy::BatchedNoCount,
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one value per line)
    Json,
    /// Human-readable output
    Pretty,
}
