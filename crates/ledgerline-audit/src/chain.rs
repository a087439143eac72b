//! Hash-chain primitives: event hashing and recomputation.
//!
//! Every event commits to a canonical JSON rendering of its fields plus
//! the hash of its predecessor, fed through SHA-256. The canonical form
//! is deterministic across processes and platforms:
//!
//!   1. Keys are lexically sorted (serde_json's default map is a BTreeMap;
//!      the `preserve_order` feature must stay off).
//!   2. Timestamps are rendered RFC 3339 UTC with exactly microsecond
//!      precision, matching what PostgreSQL's `timestamptz` round-trips.
//!   3. Absent optional fields are committed as JSON `null` rather than
//!      omitted.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};

use ledgerline_entity::audit::{AuditEvent, NewAuditEvent};

/// Sentinel `previous_hash` of the first event ever written.
pub const GENESIS_HASH: &str = "GENESIS";

/// Compute the SHA-256 chain hash for an event about to be written.
///
/// Deterministic: identical field values and identical `previous_hash`
/// always yield the identical digest, independent of map iteration order,
/// process, or platform.
///
/// Returns a lowercase 64-character hex string.
pub fn compute_hash(event: &NewAuditEvent, previous_hash: &str) -> String {
    let canonical = json!({
        "action": event.action,
        "actor": event.actor,
        "ipAddress": event.ip_address,
        "metadata": event.metadata,
        "method": event.method,
        "path": event.path,
        "previousHash": previous_hash,
        "requestBody": event.request_body,
        "requestId": event.request_id,
        "resource": event.resource,
        "resourceId": event.resource_id,
        "responseStatus": event.response_status,
        "timestamp": canonical_timestamp(&event.timestamp),
        "userAgent": event.user_agent,
    });

    // Serializing a `serde_json::Value` cannot fail: all keys are strings
    // and JSON numbers are already finite.
    let bytes = serde_json::to_vec(&canonical)
        .expect("canonical event JSON must always be serializable");

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

/// Recompute the chain hash of a stored event against `previous_hash`.
///
/// Applies [`compute_hash`] to the stored row's hashable fields; the
/// store-assigned `id` and `seq` never participate in the digest.
pub fn recompute_hash(event: &AuditEvent, previous_hash: &str) -> String {
    compute_hash(&NewAuditEvent::from(event), previous_hash)
}

/// Render a timestamp in the canonical form committed to by the hash.
pub(crate) fn canonical_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn sample_event() -> NewAuditEvent {
        NewAuditEvent {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            request_id: Uuid::nil(),
            actor: "alice".to_string(),
            action: "POST_VEHICLES".to_string(),
            resource: "vehicles".to_string(),
            resource_id: Some("v-42".to_string()),
            method: "POST".to_string(),
            path: "/api/vehicles".to_string(),
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: Some("test-agent".to_string()),
            request_body: Some(json!({ "plate": "ABC-123" })),
            metadata: Some(json!({ "elapsed_ms": 12 })),
            response_status: Some(201),
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let event = sample_event();
        let first = compute_hash(&event, GENESIS_HASH);
        let second = compute_hash(&event, GENESIS_HASH);
        assert_eq!(first, second);
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = compute_hash(&sample_event(), GENESIS_HASH);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash.to_lowercase());
    }

    #[test]
    fn test_previous_hash_changes_digest() {
        let event = sample_event();
        let genesis = compute_hash(&event, GENESIS_HASH);
        let chained = compute_hash(&event, &genesis);
        assert_ne!(genesis, chained);
    }

    #[test]
    fn test_field_change_changes_digest() {
        let event = sample_event();
        let baseline = compute_hash(&event, GENESIS_HASH);

        let mut altered = event.clone();
        altered.action = "DELETE_VEHICLES".to_string();
        assert_ne!(baseline, compute_hash(&altered, GENESIS_HASH));

        let mut altered = event;
        altered.response_status = None;
        assert_ne!(baseline, compute_hash(&altered, GENESIS_HASH));
    }

    #[test]
    fn test_timestamp_canonicalized_to_microseconds() {
        let mut event = sample_event();
        let base = compute_hash(&event, GENESIS_HASH);

        // Sub-microsecond precision is truncated away by the canonical
        // rendering, matching what the database round-trips.
        event.timestamp += chrono::Duration::nanoseconds(500);
        assert_eq!(base, compute_hash(&event, GENESIS_HASH));

        event.timestamp += chrono::Duration::microseconds(1);
        assert_ne!(base, compute_hash(&event, GENESIS_HASH));
    }
}
