//! Client configuration

use crate::error::{Error, Result};
use crate::http::RetryPolicy;
use crate::types::{DEFAULT_LIST_SIZE, MAX_BATCH_SIZE};
use serde::{Deserialize, Serialize};

/// Knobs of the call executor and the list strategies
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Page size assumed when a response does not report `next`
    pub list_size: usize,
    /// Calls per batch envelope
    pub batch_size: usize,
    /// References probed per batch; defaults to half the batch size
    pub reference_group_size: Option<usize>,
    /// Ask the server to stop a batch at its first failing call
    pub halt: bool,
    /// Retry policy wrapped around every exchange
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            list_size: DEFAULT_LIST_SIZE,
            batch_size: MAX_BATCH_SIZE,
            reference_group_size: None,
            halt: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// References probed together: each needs a first-page and a last-page
    /// probe, and all of them share one envelope
    pub fn group_size(&self) -> usize {
        self.reference_group_size
            .unwrap_or(self.batch_size / 2)
            .max(1)
    }

    /// Check sizes against the API limits
    pub fn validate(&self) -> Result<()> {
        if self.list_size == 0 {
            return Err(Error::invalid_value("list_size", "must be positive"));
        }
        // a reference's two probes must fit one envelope
        if self.batch_size < 2 || self.batch_size > MAX_BATCH_SIZE {
            return Err(Error::invalid_value(
                "batch_size",
                format!("must be between 2 and {MAX_BATCH_SIZE}"),
            ));
        }
        self.check_group_size(self.group_size())?;
        if self.retry.max_attempts == 0 {
            return Err(Error::invalid_value("retry_tries", "must be at least 1"));
        }
        Ok(())
    }

    pub(crate) fn check_group_size(&self, group: usize) -> Result<()> {
        if group == 0 || group * 2 > self.batch_size {
            return Err(Error::invalid_value(
                "reference_group_size",
                format!(
                    "{group} references need {} probes, a batch holds {}",
                    group * 2,
                    self.batch_size
                ),
            ));
        }
        Ok(())
    }
}

/// Builder for client config
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the fallback page size
    #[must_use]
    pub fn list_size(mut self, size: usize) -> Self {
        self.config.list_size = size;
        self
    }

    /// Set calls per batch envelope
    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set references per probe batch
    #[must_use]
    pub fn reference_group_size(mut self, size: usize) -> Self {
        self.config.reference_group_size = Some(size);
        self
    }

    /// Set the batch `halt` flag
    #[must_use]
    pub fn halt(mut self, halt: bool) -> Self {
        self.config.halt = halt;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// List strategies that gather one filter context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStrategy {
    /// One call per page until a short page
    Sequential,
    /// Counted first page, remaining pages in batches
    #[default]
    Batched,
    /// First page plus a last-page probe, middle pages in batches
    BatchedNoCount,
}
