//! Batch chunking
//!
//! Splits a lazily produced sequence of requests into envelopes of at most
//! [`MAX_BATCH_SIZE`] calls. Only the chunk being built is held in memory,
//! so an unbounded generator of requests can be fed to
//! [`ApiClient::batch`](crate::ApiClient::batch).

use crate::error::{Error, Result};
use crate::request::{BatchRequest, Request};
use crate::types::MAX_BATCH_SIZE;
use std::iter::Fuse;

/// Iterator adaptor grouping requests into batch envelopes
#[derive(Debug)]
pub struct BatchChunker<I: Iterator<Item = Request>> {
    requests: Fuse<I>,
    chunk_size: usize,
}

impl<I: Iterator<Item = Request>> BatchChunker<I> {
    /// Chunk `requests` into groups of `chunk_size`
    pub fn new<R>(requests: R, chunk_size: usize) -> Result<Self>
    where
        R: IntoIterator<Item = Request, IntoIter = I>,
    {
        if chunk_size == 0 || chunk_size > MAX_BATCH_SIZE {
            return Err(Error::invalid_value(
                "batch_size",
                format!("must be between 1 and {MAX_BATCH_SIZE}, got {chunk_size}"),
            ));
        }

        Ok(Self {
            requests: requests.into_iter().fuse(),
            chunk_size,
        })
    }

    /// Calls per full chunk
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl<I: Iterator<Item = Request>> Iterator for BatchChunker<I> {
    type Item = BatchRequest;

    fn next(&mut self) -> Option<BatchRequest> {
        let chunk: Vec<Request> = self.requests.by_ref().take(self.chunk_size).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(BatchRequest::from_chunk(chunk))
        }
    }
}
