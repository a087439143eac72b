//! Integrity verification of the hash chain.
//!
//! Replays a contiguous run of events in insertion order, recomputing
//! each event's hash against the running predecessor hash and comparing
//! it to what was stored. Any mismatch — in the recomputed digest or in
//! the stored linkage — marks that event broken. The walk never stops at
//! the first break, so a report localizes every corrupted entry.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use ledgerline_core::result::AppResult;
use ledgerline_entity::audit::{AuditEvent, BrokenChain, VerificationReport};

use crate::chain::{GENESIS_HASH, recompute_hash};
use crate::store::{AuditStore, EventFilter};

/// Verify a run of events already sorted by `seq` ascending.
///
/// The expected predecessor of the first event is [`GENESIS_HASH`] when
/// it is the first event of the whole ledger (`seq == 1`); for a run
/// starting mid-ledger the first event's own stored `previous_hash`
/// seeds the walk, so a partial range can still be checked for internal
/// consistency.
///
/// The running predecessor always advances with the *stored* hash, so a
/// single tampered event breaks exactly one link rather than cascading
/// through everything after it.
pub fn verify_events(events: &[AuditEvent]) -> VerificationReport {
    let mut broken_chains = Vec::new();

    let mut expected_prev = match events.first() {
        Some(first) if first.seq == 1 => GENESIS_HASH.to_string(),
        Some(first) => first.previous_hash.clone(),
        None => {
            return VerificationReport {
                is_valid: true,
                broken_chains,
                total_events: 0,
            };
        }
    };

    for event in events {
        let recomputed = recompute_hash(event, &expected_prev);
        if recomputed != event.hash || event.previous_hash != expected_prev {
            broken_chains.push(BrokenChain {
                event_id: event.id,
                expected_hash: recomputed,
                actual_hash: event.hash.clone(),
            });
        }
        expected_prev = event.hash.clone();
    }

    VerificationReport {
        is_valid: broken_chains.is_empty(),
        total_events: events.len() as u64,
        broken_chains,
    }
}

/// Load the events in `[start, end]` from the store and verify them.
///
/// `max_rows` caps how much of the ledger one verification pass reads.
pub async fn verify_range(
    store: &Arc<dyn AuditStore>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    max_rows: u64,
) -> AppResult<VerificationReport> {
    let filter = EventFilter {
        start,
        end,
        ..EventFilter::default()
    };
    let events = store.range_ordered(&filter, max_rows).await?;
    Ok(verify_events(&events))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use ledgerline_entity::audit::NewAuditEvent;

    use crate::memory::MemoryAuditStore;
    use crate::writer::AuditWriter;

    use super::*;

    fn sample_event(action: &str) -> NewAuditEvent {
        NewAuditEvent {
            timestamp: Utc::now(),
            request_id: Uuid::new_v4(),
            actor: "alice".to_string(),
            action: action.to_string(),
            resource: "vehicles".to_string(),
            resource_id: Some("v-1".to_string()),
            method: "POST".to_string(),
            path: "/api/vehicles".to_string(),
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: None,
            request_body: Some(json!({ "plate": "ABC-123" })),
            metadata: None,
            response_status: Some(201),
        }
    }

    async fn seeded_store(n: usize) -> (Arc<MemoryAuditStore>, Vec<AuditEvent>) {
        let store = Arc::new(MemoryAuditStore::new());
        let writer = AuditWriter::new(store.clone());
        let mut written = Vec::with_capacity(n);
        for i in 0..n {
            written.push(writer.write(sample_event(&format!("ACTION_{i}"))).await.unwrap());
        }
        (store, written)
    }

    #[tokio::test]
    async fn test_empty_ledger_is_valid() {
        let report = verify_events(&[]);
        assert!(report.is_valid);
        assert_eq!(report.total_events, 0);
        assert!(report.broken_chains.is_empty());
    }

    #[tokio::test]
    async fn test_untampered_chain_is_valid() {
        let (_, events) = seeded_store(5).await;
        let report = verify_events(&events);
        assert!(report.is_valid);
        assert_eq!(report.total_events, 5);
    }

    #[tokio::test]
    async fn test_tampered_field_breaks_exactly_one_link() {
        let (store, events) = seeded_store(3).await;
        let victim = events[1].id;
        assert!(store.tamper(victim, |e| e.action = "FORGED".to_string()));

        let store: Arc<dyn AuditStore> = store;
        let report = verify_range(&store, None, None, 100).await.unwrap();

        assert!(!report.is_valid);
        assert_eq!(report.total_events, 3);
        assert_eq!(report.broken_chains.len(), 1);
        assert_eq!(report.broken_chains[0].event_id, victim);
    }

    #[tokio::test]
    async fn test_tampered_linkage_is_detected() {
        let (store, events) = seeded_store(3).await;
        let victim = events[2].id;
        assert!(store.tamper(victim, |e| {
            e.previous_hash = "0".repeat(64);
        }));

        let store: Arc<dyn AuditStore> = store;
        let report = verify_range(&store, None, None, 100).await.unwrap();

        assert!(!report.is_valid);
        assert_eq!(report.broken_chains.len(), 1);
        assert_eq!(report.broken_chains[0].event_id, victim);
    }

    #[tokio::test]
    async fn test_mid_ledger_range_seeds_from_stored_linkage() {
        let (_, events) = seeded_store(5).await;
        // A slice starting past seq 1 is internally consistent.
        let report = verify_events(&events[2..]);
        assert!(report.is_valid);
        assert_eq!(report.total_events, 3);
    }

    #[tokio::test]
    async fn test_multiple_tampered_events_all_reported() {
        let (store, events) = seeded_store(4).await;
        store.tamper(events[0].id, |e| e.actor = "mallory".to_string());
        store.tamper(events[3].id, |e| e.response_status = Some(500));

        let store: Arc<dyn AuditStore> = store;
        let report = verify_range(&store, None, None, 100).await.unwrap();

        assert_eq!(report.broken_chains.len(), 2);
        let ids: Vec<Uuid> = report.broken_chains.iter().map(|b| b.event_id).collect();
        assert!(ids.contains(&events[0].id));
        assert!(ids.contains(&events[3].id));
    }
}
