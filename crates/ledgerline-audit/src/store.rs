//! Storage abstraction for the audit ledger.
//!
//! The write path and every read surface (listing, verification, stats,
//! export) go through [`AuditStore`], so the subsystem can run against
//! PostgreSQL in production and the in-memory store in tests. The trait
//! deliberately has no update or delete operations — the ledger is
//! append-only by construction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use ledgerline_core::result::AppResult;
use ledgerline_core::types::pagination::{PageRequest, PageResponse};
use ledgerline_entity::audit::{AuditEvent, AuditStats, NewAuditEvent};

/// Filter criteria for ledger queries.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Exact actor match.
    pub actor: Option<String>,
    /// Exact action match.
    pub action: Option<String>,
    /// Exact resource match.
    pub resource: Option<String>,
    /// Inclusive lower timestamp bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    pub end: Option<DateTime<Utc>>,
}

/// An event that has been redacted, chained, and hashed — ready to
/// persist exactly as-is.
#[derive(Debug, Clone)]
pub struct SealedEvent {
    /// The redacted event fields.
    pub event: NewAuditEvent,
    /// Hash of the predecessor, or [`crate::GENESIS_HASH`].
    pub previous_hash: String,
    /// This event's own chain hash.
    pub hash: String,
}

/// Append-only ledger storage.
#[async_trait]
pub trait AuditStore: Send + Sync + 'static {
    /// Hash of the most recently inserted event, or `None` on an empty
    /// ledger.
    async fn last_hash(&self) -> AppResult<Option<String>>;

    /// Append a sealed event, assigning `id` and `seq`.
    async fn insert(&self, sealed: &SealedEvent) -> AppResult<AuditEvent>;

    /// Look up a single event by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AuditEvent>>;

    /// Filtered, paginated listing, newest first.
    async fn search(
        &self,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditEvent>>;

    /// Matching events in insertion (`seq`) order, reading at most
    /// `max_rows`. This is the order the verifier replays and the order
    /// exports are written in.
    async fn range_ordered(
        &self,
        filter: &EventFilter,
        max_rows: u64,
    ) -> AppResult<Vec<AuditEvent>>;

    /// Aggregate statistics for events at or after `since`, reading at
    /// most the first `max_rows` events of the window in `seq` order.
    async fn stats(
        &self,
        since: DateTime<Utc>,
        window_days: u32,
        max_rows: u64,
    ) -> AppResult<AuditStats>;
}
