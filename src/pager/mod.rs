//! Lazy pagination over a Graph-style listing endpoint
//!
//! # Overview
//!
//! [`Pager`] is a pull-based, forward-only cursor: each call to
//! [`Pager::next_item`] either returns the next item or `None` once the
//! collection is exhausted. A network request is issued only when the
//! buffered page runs out and the service reported a next link — no
//! look-ahead, no prefetch.

mod types;

pub use types::{Page, PageFetcher, PageFields};

use crate::error::Result;
use futures::Stream;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Lazy cursor over one or more remote pages
pub struct Pager {
    fetcher: Arc<dyn PageFetcher>,
    fields: PageFields,
    /// Endpoint of the next page to fetch; `None` once the last page is seen
    endpoint: Option<String>,
    /// Remaining items of the current page
    buffer: VecDeque<Value>,
    pages_fetched: u64,
}

impl Pager {
    /// Create a pager starting at the given endpoint
    pub fn new(fetcher: Arc<dyn PageFetcher>, start_endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            fields: PageFields::default(),
            endpoint: Some(start_endpoint.into()),
            buffer: VecDeque::new(),
            pages_fetched: 0,
        }
    }

    /// Override the page field names
    #[must_use]
    pub fn with_fields(mut self, fields: PageFields) -> Self {
        self.fields = fields;
        self
    }

    /// Whether the sequence has ended (no buffered items, no next link)
    pub fn is_exhausted(&self) -> bool {
        self.buffer.is_empty() && self.endpoint.is_none()
    }

    /// Number of pages fetched so far
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Pull the next item, fetching the next page only when needed.
    ///
    /// Returns `Ok(None)` once the collection is exhausted; further calls
    /// keep returning `Ok(None)` without touching the network. Zero-item
    /// pages are skipped, each costing exactly one request.
    pub async fn next_item(&mut self) -> Result<Option<Value>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }

            let Some(endpoint) = self.endpoint.take() else {
                return Ok(None);
            };

            debug!("Retrieving next page: {endpoint}");
            let body = self.fetcher.fetch_page(&endpoint).await?;
            let page = Page::parse(&body, &self.fields);
            self.pages_fetched += 1;

            self.buffer = page.items.into();
            self.endpoint = page.next_link;
        }
    }

    /// Adapt the pager into a `futures::Stream` of items
    pub fn into_stream(self) -> impl Stream<Item = Result<Value>> {
        futures::stream::try_unfold(self, |mut pager| async move {
            let item = pager.next_item().await?;
            Ok(item.map(|item| (item, pager)))
        })
    }
}

impl std::fmt::Debug for Pager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("endpoint", &self.endpoint)
            .field("buffered", &self.buffer.len())
            .field("pages_fetched", &self.pages_fetched)
            .finish_non_exhaustive()
    }
}
