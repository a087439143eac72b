//! Pagination types for list endpoints.
//!
//! The ledger query surface paginates with an explicit limit/offset pair
//! rather than page numbers; the limit is clamped server-side regardless
//! of what the client requests.

use serde::{Deserialize, Serialize};

/// Default number of items per page.
pub const DEFAULT_LIMIT: u64 = 50;
/// Hard server-side cap on `limit`, applied regardless of client input.
pub const MAX_LIMIT: u64 = 1000;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: u64,
}

impl PageRequest {
    /// Create a page request, clamping `limit` into `1..=MAX_LIMIT`.
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T: Serialize> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total number of items matching the query.
    pub total: u64,
    /// The limit that was applied.
    pub limit: u64,
    /// The offset that was applied.
    pub offset: u64,
    /// Whether more items exist past this page.
    pub has_next: bool,
}

impl<T: Serialize> PageResponse<T> {
    /// Create a new paginated response.
    pub fn new(items: Vec<T>, page: &PageRequest, total: u64) -> Self {
        Self {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
            has_next: page.offset + page.limit < total,
        }
    }
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}
