//! Page shape and the fetch seam

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Default field holding the item list (Graph convention)
pub const DEFAULT_ITEMS_FIELD: &str = "value";

/// Default field holding the next-page link (Graph convention)
pub const DEFAULT_NEXT_LINK_FIELD: &str = "@odata.nextLink";

/// Field names a listing endpoint uses for its items and next link
#[derive(Debug, Clone)]
pub struct PageFields {
    /// Field holding the list of items
    pub items_field: String,
    /// Field holding the next-page link
    pub next_link_field: String,
}

impl Default for PageFields {
    fn default() -> Self {
        Self {
            items_field: DEFAULT_ITEMS_FIELD.to_string(),
            next_link_field: DEFAULT_NEXT_LINK_FIELD.to_string(),
        }
    }
}

impl PageFields {
    /// Create field names for a non-Graph listing shape
    pub fn new(items_field: impl Into<String>, next_link_field: impl Into<String>) -> Self {
        Self {
            items_field: items_field.into(),
            next_link_field: next_link_field.into(),
        }
    }
}

/// One parsed page of a listing response
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Items of this page, in the order the service returned them
    pub items: Vec<Value>,
    /// Where to fetch the next page; absent on the last page
    pub next_link: Option<String>,
}

impl Page {
    /// Parse a response body leniently.
    ///
    /// A missing or non-array items field yields an empty page, never an
    /// error. An absent, null, or empty next link terminates the sequence.
    pub fn parse(body: &Value, fields: &PageFields) -> Self {
        let items = body
            .get(&fields.items_field)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let next_link = body
            .get(&fields.next_link_field)
            .and_then(Value::as_str)
            .filter(|link| !link.is_empty())
            .map(ToString::to_string);

        Self { items, next_link }
    }

    /// Whether this page carried no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Seam between the pager and the authenticated session.
///
/// `endpoint` may be a path relative to the API base or the absolute URL the
/// previous page's next link pointed at.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Issue one authenticated GET and parse the JSON body
    async fn fetch_page(&self, endpoint: &str) -> Result<Value>;
}
