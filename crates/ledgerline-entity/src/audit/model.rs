//! Audit event entity model.
//!
//! `AuditEvent` is the ledger entry: immutable once written, linked to its
//! predecessor through `previous_hash`, and attested by `hash`. There is
//! no update or delete path for these rows — correcting history means
//! appending a new event that references the old one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Actor recorded when no authenticated principal was resolved.
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// Method sentinel for events logged outside the HTTP lifecycle.
pub const MANUAL_METHOD: &str = "MANUAL";

/// Path sentinel for events logged outside the HTTP lifecycle.
pub const MANUAL_PATH: &str = "/manual";

/// An immutable, hash-chained audit ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Unique event identifier, assigned at persistence time.
    pub id: Uuid,
    /// Monotonic insertion sequence. This, not the timestamp, is the
    /// authoritative order for chain verification.
    pub seq: i64,
    /// Wall-clock time of recording.
    pub timestamp: DateTime<Utc>,
    /// Correlates all events and logs belonging to one inbound request.
    pub request_id: Uuid,
    /// Resolved principal identifier, or `"anonymous"`.
    pub actor: String,
    /// Short symbolic name: `"{METHOD}_{RESOURCE}"` for auto-instrumented
    /// events, or a caller-supplied string for manual events.
    pub action: String,
    /// The logical entity type affected.
    pub resource: String,
    /// The entity instance affected, when the path named one.
    pub resource_id: Option<String>,
    /// Originating HTTP verb, or `"MANUAL"`.
    pub method: String,
    /// Originating request path, or `"/manual"`.
    pub path: String,
    /// Client network origin.
    pub ip_address: Option<String>,
    /// Client agent string.
    pub user_agent: Option<String>,
    /// Redacted request payload.
    pub request_body: Option<serde_json::Value>,
    /// Redacted free-form event metadata.
    pub metadata: Option<serde_json::Value>,
    /// Response outcome code; `None` for manual events.
    pub response_status: Option<i32>,
    /// Hash of the immediately preceding event, or `"GENESIS"` for the
    /// first event ever written.
    pub previous_hash: String,
    /// SHA-256 digest over this event's canonical fields, including
    /// `previous_hash`.
    pub hash: String,
}

/// The unhashed write-path input for a new audit event.
///
/// Everything the caller knows before the writer assigns the chain link:
/// `id` and `seq` come from the store, `previous_hash` and `hash` from the
/// hash-chain engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditEvent {
    /// Wall-clock time of recording.
    pub timestamp: DateTime<Utc>,
    /// Request correlation id.
    pub request_id: Uuid,
    /// Resolved principal identifier, or `"anonymous"`.
    pub actor: String,
    /// Short symbolic action name.
    pub action: String,
    /// Logical entity type affected.
    pub resource: String,
    /// Entity instance affected.
    pub resource_id: Option<String>,
    /// Originating HTTP verb, or `"MANUAL"`.
    pub method: String,
    /// Originating request path, or `"/manual"`.
    pub path: String,
    /// Client network origin.
    pub ip_address: Option<String>,
    /// Client agent string.
    pub user_agent: Option<String>,
    /// Request payload; redacted by the writer before hashing.
    pub request_body: Option<serde_json::Value>,
    /// Free-form metadata; redacted by the writer before hashing.
    pub metadata: Option<serde_json::Value>,
    /// Response outcome code; `None` for manual events.
    pub response_status: Option<i32>,
}

impl From<&AuditEvent> for NewAuditEvent {
    /// Project a stored event back onto its hashable fields, dropping the
    /// store-assigned `id`/`seq` and the chain link columns. Used by the
    /// verifier to recompute hashes from stored rows.
    fn from(event: &AuditEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            request_id: event.request_id,
            actor: event.actor.clone(),
            action: event.action.clone(),
            resource: event.resource.clone(),
            resource_id: event.resource_id.clone(),
            method: event.method.clone(),
            path: event.path.clone(),
            ip_address: event.ip_address.clone(),
            user_agent: event.user_agent.clone(),
            request_body: event.request_body.clone(),
            metadata: event.metadata.clone(),
            response_status: event.response_status,
        }
    }
}
