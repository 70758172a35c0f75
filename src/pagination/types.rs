//! Page model and offset planning
//!
//! Pages are addressed by their starting offset. A counting list call reports
//! `total`; a `start=-1` probe instead reports the offset of the final page,
//! which together with that page's length gives the same number without a
//! counting pass.

use crate::error::{Error, Result};
use crate::response::ApiResponse;
use crate::types::JsonValue;
use std::iter::StepBy;
use std::ops::Range;

/// One fetched slice of a list
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Items in list order
    pub items: Vec<JsonValue>,
    /// Offset of the first item
    pub start_offset: u64,
    /// Total item count, when the response reported one
    pub total: Option<u64>,
}

impl Page {
    /// Build a page from a list response fetched at `start_offset`
    pub fn from_response(response: ApiResponse, start_offset: u64) -> Result<Self> {
        let total = response.total;
        Ok(Self {
            items: response.into_items()?,
            start_offset,
            total,
        })
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the page has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// A page holding fewer items than a full page is the last one
    pub fn is_short(&self, page_size: usize) -> bool {
        self.items.len() < page_size
    }

    /// Offset just past the last item
    pub fn end_offset(&self) -> u64 {
        self.start_offset + self.items.len() as u64
    }
}

/// Page size implied by a response fetched at `start`
///
/// `next` points at the following page; without it (last page) the
/// configured size is assumed.
pub fn page_size_of(response: &ApiResponse, start: u64, fallback: usize) -> usize {
    response
        .next
        .and_then(|next| next.checked_sub(start))
        .filter(|&size| size > 0)
        .map_or(fallback, |size| size as usize)
}

/// Offsets of full pages in `[from, to)`
pub fn page_offsets(from: u64, to: u64, page_size: usize) -> StepBy<Range<u64>> {
    (from..to).step_by(page_size.max(1))
}

/// Layout of an uncounted list, derived from its first page and a
/// last-page probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoCountPlan {
    /// Items per full page
    pub page_size: usize,
    /// Offset of the final page
    pub last_start: u64,
    /// Total item count
    pub total: u64,
}

impl NoCountPlan {
    /// Check the probe results against each other and derive the layout
    pub fn new(method: &str, first_len: usize, last: &Page, page_size: usize) -> Result<Self> {
        let page_size = page_size.max(1);
        let last_start = last.start_offset;

        if last_start % page_size as u64 != 0 {
            return Err(Error::pagination(
                method,
                format!("last page starts at {last_start}, not a multiple of page size {page_size}"),
            ));
        }
        if first_len < page_size && last_start > 0 {
            return Err(Error::pagination(
                method,
                format!("first page holds {first_len} items but the last page starts at {last_start}"),
            ));
        }

        Ok(Self {
            page_size,
            last_start,
            total: last.end_offset(),
        })
    }

    /// Offsets strictly between the first and the last page
    pub fn middle_offsets(&self) -> StepBy<Range<u64>> {
        page_offsets(self.page_size as u64, self.last_start, self.page_size)
    }

    /// Number of pages between the first and the last page
    pub fn middle_page_count(&self) -> usize {
        (self.last_start / self.page_size as u64).saturating_sub(1) as usize
    }

    /// Whether the last page is the first page
    pub fn last_is_first(&self) -> bool {
        self.last_start == 0
    }
}
