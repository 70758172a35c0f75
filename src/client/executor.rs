//! Call executor
//!
//! Every exchange goes through the retry policy. A batch envelope is retried
//! as a whole only when the exchange itself fails; a call that fails inside a
//! delivered batch is reported inline and never resent, since its siblings may
//! already have been applied.

use super::config::{ClientConfig, ListStrategy};
use crate::batch::BatchChunker;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::http::{HttpTransport, Transport};
use crate::pagination::strategies;
use crate::request::{BatchRequest, Request};
use crate::response::{ApiResponse, BatchResult, CallResult};
use crate::types::{
    CallResultStream, ItemStream, JsonObject, JsonValue, KeyedItemStream, ResponseStream,
    BATCH_METHOD,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

/// API client: single calls, batches, and list gathering
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
}

impl ApiClient {
    /// Create a client over any transport
    pub fn new(transport: impl Transport + 'static, config: ClientConfig) -> Result<Self> {
        Self::with_transport(Arc::new(transport), config)
    }

    /// Create a client over a shared transport
    pub fn with_transport(transport: Arc<dyn Transport>, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            config: Arc::new(config),
        })
    }

    /// Create an HTTP client from settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let transport = HttpTransport::new(settings.transport_config())?;
        Self::new(transport, settings.client_config())
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send(&self, method: &str, parameters: &JsonValue) -> Result<ApiResponse> {
        let body = self.transport.send(method, parameters).await?;
        ApiResponse::from_value(body)
    }

    /// Call any method and return its `result`
    pub async fn call(&self, request: &Request) -> Result<JsonValue> {
        Ok(self.call_response(request).await?.result)
    }

    /// Call any method and return the full response
    pub async fn call_response(&self, request: &Request) -> Result<ApiResponse> {
        let parameters = JsonValue::Object(request.parameters().clone());
        self.config
            .retry
            .run(request.method(), || self.send(request.method(), &parameters))
            .await
    }

    /// Send one envelope; outcomes come back in submission order
    pub async fn execute_batch(&self, batch: &BatchRequest) -> Result<Vec<CallResult>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Sending batch of {} calls", batch.len());
        let envelope = batch.envelope(self.config.halt);
        let response = self
            .config
            .retry
            .run(BATCH_METHOD, || self.send(BATCH_METHOD, &envelope))
            .await?;

        BatchResult::from_value(response.result)?.into_call_results(batch.keys())
    }

    /// Run any number of calls through batch envelopes
    ///
    /// Requests are pulled lazily, one envelope's worth at a time. An
    /// exchange that still fails after retries ends the stream; envelopes
    /// after it are never sent.
    pub fn batch<I>(&self, requests: I) -> CallResultStream
    where
        I: IntoIterator<Item = Request>,
        I::IntoIter: Send + 'static,
    {
        let chunks = match BatchChunker::new(requests, self.config.batch_size) {
            Ok(chunks) => chunks,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };

        stream::try_unfold((self.clone(), chunks), |(client, mut chunks)| async move {
            let Some(chunk) = chunks.next() else {
                return Ok(None);
            };
            let results = client.execute_batch(&chunk).await?;
            let results = stream::iter(results.into_iter().map(Ok::<CallResult, Error>));
            Ok::<_, Error>(Some((results, (client, chunks))))
        })
        .try_flatten()
        .boxed()
    }

    /// Like [`batch`](Self::batch), but a failed call ends the stream
    pub fn batch_responses<I>(&self, requests: I) -> ResponseStream
    where
        I: IntoIterator<Item = Request>,
        I::IntoIter: Send + 'static,
    {
        self.batch(requests)
            .and_then(|result| async move { result.into_response() })
            .boxed()
    }

    /// Gather a list with the chosen strategy
    pub fn list(&self, request: Request, strategy: ListStrategy) -> ItemStream {
        match strategy {
            ListStrategy::Sequential => self.list_sequential(request),
            ListStrategy::Batched => self.list_batched(request),
            ListStrategy::BatchedNoCount => self.list_batched_no_count(request),
        }
    }

    /// One call per page, stopping at the first short page
    pub fn list_sequential(&self, request: Request) -> ItemStream {
        strategies::sequential(self.clone(), request)
    }

    /// Counted first page, then every other page through batches
    pub fn list_batched(&self, request: Request) -> ItemStream {
        strategies::batched(self.clone(), request)
    }

    /// First page and a `start=-1` last-page probe, middle pages through batches
    pub fn list_batched_no_count(&self, request: Request) -> ItemStream {
        strategies::batched_no_count(self.clone(), request)
    }

    /// Gather one list per filter update, probing many references per batch
    pub fn reference_batched_no_count<I>(&self, template: Request, filter_updates: I) -> ItemStream
    where
        I: IntoIterator<Item = JsonObject>,
        I::IntoIter: Send + 'static,
    {
        let keyed = filter_updates.into_iter().map(|update| ((), update));
        strategies::reference_batched_no_count(self.clone(), template, keyed)
            .map_ok(|((), item)| item)
            .boxed()
    }

    /// Like [`reference_batched_no_count`](Self::reference_batched_no_count),
    /// tagging every item with its reference key
    pub fn reference_batched_no_count_keyed<K, I>(
        &self,
        template: Request,
        filter_updates: I,
    ) -> KeyedItemStream<K>
    where
        K: Clone + Send + 'static,
        I: IntoIterator<Item = (K, JsonObject)>,
        I::IntoIter: Send + 'static,
    {
        strategies::reference_batched_no_count(self.clone(), template, filter_updates)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
