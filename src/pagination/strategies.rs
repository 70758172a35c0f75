//! List gathering strategies
//!
//! Each strategy turns one list request into a lazy stream of items in
//! ascending offset order. They differ only in how many round trips they
//! spend learning the list's size.

use super::types::{page_offsets, page_size_of, NoCountPlan, Page};
use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::request::{BatchRequest, Request};
use crate::response::{ApiResponse, CallResult};
use crate::types::{
    ItemStream, JsonObject, JsonValue, KeyedItemStream, ResponseStream, LAST_PAGE_START,
};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use tracing::debug;

fn items_stream(items: Vec<JsonValue>) -> impl Stream<Item = Result<JsonValue>> + Send {
    stream::iter(items.into_iter().map(Ok))
}

fn response_items(responses: ResponseStream) -> impl Stream<Item = Result<JsonValue>> + Send {
    responses
        .and_then(|response| async move { response.into_items().map(items_stream) })
        .try_flatten()
}

/// Read a `start=-1` response; the page is only usable with its offset
fn last_page(method: &str, probe: ApiResponse) -> Result<Page> {
    let Some(start) = probe.start else {
        return Err(Error::pagination(
            method,
            "last-page response does not report its start offset",
        ));
    };
    Page::from_response(probe, start)
}

// ============================================================================
// Sequential
// ============================================================================

struct Cursor {
    client: ApiClient,
    request: Request,
    offset: u64,
    page_size: Option<usize>,
    done: bool,
}

/// One call per page until a short page
pub(crate) fn sequential(client: ApiClient, request: Request) -> ItemStream {
    let cursor = Cursor {
        client,
        request,
        offset: 0,
        page_size: None,
        done: false,
    };

    stream::try_unfold(cursor, |mut cursor| async move {
        if cursor.done {
            return Ok(None);
        }

        let offset = cursor.offset;
        let response = cursor
            .client
            .call_response(&cursor.request.with_start(offset as i64))
            .await?;
        let fallback = cursor.client.config().list_size;
        let page_size = *cursor
            .page_size
            .get_or_insert_with(|| page_size_of(&response, offset, fallback));
        let page = Page::from_response(response, offset)?;

        debug!(
            "{}: page at {} holds {} items",
            cursor.request.method(),
            offset,
            page.len()
        );
        if page.is_short(page_size) {
            cursor.done = true;
        } else {
            cursor.offset += page_size as u64;
        }

        Ok::<_, Error>(Some((items_stream(page.items), cursor)))
    })
    .try_flatten()
    .boxed()
}

// ============================================================================
// Batched, counted
// ============================================================================

/// Counted first page, every later page through batches
pub(crate) fn batched(client: ApiClient, request: Request) -> ItemStream {
    stream::once(async move {
        let head = client.call_response(&request.with_start(0)).await?;
        let page_size = page_size_of(&head, 0, client.config().list_size);
        let first = Page::from_response(head, 0)?;
        let Some(total) = first.total else {
            return Err(Error::pagination(
                request.method(),
                "response does not report a total",
            ));
        };

        debug!(
            "{}: {} items in pages of {}",
            request.method(),
            total,
            page_size
        );
        let tail = page_offsets(page_size as u64, total, page_size)
            .map(move |offset| request.with_start(offset as i64));
        let rest = response_items(client.batch_responses(tail));

        Ok::<_, Error>(items_stream(first.items).chain(rest))
    })
    .try_flatten()
    .boxed()
}

// ============================================================================
// Batched, uncounted
// ============================================================================

/// First page and a last-page probe, middle pages through batches
pub(crate) fn batched_no_count(client: ApiClient, request: Request) -> ItemStream {
    stream::once(async move {
        let head = client.call_response(&request.with_start(0)).await?;
        let page_size = page_size_of(&head, 0, client.config().list_size);
        let first = Page::from_response(head, 0)?;
        let first_len = first.len();
        let rest = stream::once(no_count_rest(client, request, first_len, page_size)).try_flatten();

        Ok::<_, Error>(items_stream(first.items).chain(rest))
    })
    .try_flatten()
    .boxed()
}

async fn no_count_rest(
    client: ApiClient,
    request: Request,
    first_len: usize,
    page_size: usize,
) -> Result<impl Stream<Item = Result<JsonValue>> + Send> {
    let probe = client
        .call_response(&request.with_start(LAST_PAGE_START))
        .await?;
    let last = last_page(request.method(), probe)?;
    let plan = NoCountPlan::new(request.method(), first_len, &last, page_size)?;

    debug!(
        "{}: {} items, {} middle pages",
        request.method(),
        plan.total,
        plan.middle_page_count()
    );
    let middle = plan
        .middle_offsets()
        .map(move |offset| request.with_start(offset as i64));
    let last_items = if plan.last_is_first() {
        Vec::new()
    } else {
        last.items
    };

    Ok(response_items(client.batch_responses(middle)).chain(items_stream(last_items)))
}

// ============================================================================
// Reference-batched, uncounted
// ============================================================================

/// One uncounted list per filter update, probed a group at a time
pub(crate) fn reference_batched_no_count<K, I>(
    client: ApiClient,
    template: Request,
    filter_updates: I,
) -> KeyedItemStream<K>
where
    K: Clone + Send + 'static,
    I: IntoIterator<Item = (K, JsonObject)>,
    I::IntoIter: Send + 'static,
{
    let group_size = client.config().group_size();
    if let Err(e) = client.config().check_group_size(group_size) {
        return stream::once(async move { Err(e) }).boxed();
    }

    let references = filter_updates.into_iter().fuse();
    stream::try_unfold(
        (client, template, references),
        move |(client, template, mut references)| async move {
            let group: Vec<(K, JsonObject)> = references.by_ref().take(group_size).collect();
            if group.is_empty() {
                return Ok(None);
            }

            let items = gather_group(&client, &template, group).await?;
            let items = stream::iter(items.into_iter().map(Ok::<(K, JsonValue), Error>));
            Ok::<_, Error>(Some((items, (client, template, references))))
        },
    )
    .try_flatten()
    .boxed()
}

/// Probe a group in one batch, fetch all its middle pages, and lay the items
/// out reference by reference
async fn gather_group<K: Clone>(
    client: &ApiClient,
    template: &Request,
    group: Vec<(K, JsonObject)>,
) -> Result<Vec<(K, JsonValue)>> {
    let mut requests = Vec::with_capacity(group.len());
    let mut probes = Vec::with_capacity(group.len() * 2);
    for (_, update) in &group {
        let request = template.with_filter(update)?;
        probes.push(request.with_start(0));
        probes.push(request.with_start(LAST_PAGE_START));
        requests.push(request);
    }

    let probes = BatchRequest::new(probes)?;
    let mut results = client
        .execute_batch(&probes)
        .await?
        .into_iter()
        .map(CallResult::into_response);

    let fallback = client.config().list_size;
    let mut layouts = Vec::with_capacity(requests.len());
    let mut middle = Vec::new();
    for request in &requests {
        let (Some(first), Some(last)) = (results.next(), results.next()) else {
            return Err(Error::malformed("probe batch returned fewer results than calls"));
        };
        let (first, last) = (first?, last?);

        let page_size = page_size_of(&first, 0, fallback);
        let first = Page::from_response(first, 0)?;
        let last = last_page(request.method(), last)?;
        let plan = NoCountPlan::new(request.method(), first.len(), &last, page_size)?;

        middle.extend(
            plan.middle_offsets()
                .map(|offset| request.with_start(offset as i64)),
        );
        layouts.push((first, last, plan));
    }

    debug!(
        "{}: {} references probed, {} middle pages",
        template.method(),
        requests.len(),
        middle.len()
    );
    let mut middle_pages = client
        .batch_responses(middle)
        .try_collect::<Vec<_>>()
        .await?
        .into_iter();

    let mut items = Vec::new();
    for ((key, _), (first, last, plan)) in group.into_iter().zip(layouts) {
        items.extend(first.items.into_iter().map(|item| (key.clone(), item)));
        for response in middle_pages.by_ref().take(plan.middle_page_count()) {
            items.extend(
                response
                    .into_items()?
                    .into_iter()
                    .map(|item| (key.clone(), item)),
            );
        }
        if !plan.last_is_first() {
            items.extend(last.items.into_iter().map(|item| (key.clone(), item)));
        }
    }

    Ok(items)
}
