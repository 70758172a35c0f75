//! Pagination module
//!
//! Supports: Sequential, Batched (counted), Batched without count,
//! Reference-batched without count
//!
//! # Overview
//!
//! List methods return one page per call, addressed by a `start` offset.
//! The strategies here gather a whole list as a lazy item stream and differ
//! in how they learn its size:
//!
//! - **Sequential** walks pages one call at a time until a short page.
//! - **Batched** reads `total` from the first page and fetches the rest
//!   through batch envelopes.
//! - **Batched without count** asks for the last page directly with
//!   `start=-1` and derives the size from its offset.
//! - **Reference-batched without count** does the same for many filter
//!   contexts at once, probing a whole group of references per envelope.
//!
//! Every strategy yields the same items in the same order for the same list.

pub(crate) mod strategies;
mod types;

pub use types::{page_offsets, page_size_of, NoCountPlan, Page};
