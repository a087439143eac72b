//! In-memory implementation of [`AuditStore`].
//!
//! `MemoryAuditStore` keeps the ledger in a `Vec` behind a `Mutex`. It is
//! the reference implementation used by unit and integration tests, and
//! by corruption drills: [`MemoryAuditStore::tamper`] mutates a stored
//! event in place, bypassing the writer, exactly the way the integrity
//! verifier is meant to catch.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use ledgerline_core::result::AppResult;
use ledgerline_core::types::pagination::{PageRequest, PageResponse};
use ledgerline_entity::audit::{AuditEvent, AuditStats, CountByDay, CountByKey};

use crate::store::{AuditStore, EventFilter, SealedEvent};

/// An in-memory, append-only ledger.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events stored.
    pub fn len(&self) -> usize {
        self.events.lock().expect("audit store lock poisoned").len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutate a stored event in place, bypassing the writer.
    ///
    /// Exists for corruption drills and tamper-detection tests; there is
    /// deliberately no such operation on the production store.
    pub fn tamper<F>(&self, id: Uuid, mutate: F) -> bool
    where
        F: FnOnce(&mut AuditEvent),
    {
        let mut events = self.events.lock().expect("audit store lock poisoned");
        match events.iter_mut().find(|e| e.id == id) {
            Some(event) => {
                mutate(event);
                true
            }
            None => false,
        }
    }

    fn matches(event: &AuditEvent, filter: &EventFilter) -> bool {
        if let Some(actor) = &filter.actor {
            if &event.actor != actor {
                return false;
            }
        }
        if let Some(action) = &filter.action {
            if &event.action != action {
                return false;
            }
        }
        if let Some(resource) = &filter.resource {
            if &event.resource != resource {
                return false;
            }
        }
        if let Some(start) = filter.start {
            if event.timestamp < start {
                return false;
            }
        }
        if let Some(end) = filter.end {
            if event.timestamp > end {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn last_hash(&self) -> AppResult<Option<String>> {
        let events = self.events.lock().expect("audit store lock poisoned");
        Ok(events.last().map(|e| e.hash.clone()))
    }

    async fn insert(&self, sealed: &SealedEvent) -> AppResult<AuditEvent> {
        let mut events = self.events.lock().expect("audit store lock poisoned");
        let event = AuditEvent {
            id: Uuid::new_v4(),
            seq: events.len() as i64 + 1,
            timestamp: sealed.event.timestamp,
            request_id: sealed.event.request_id,
            actor: sealed.event.actor.clone(),
            action: sealed.event.action.clone(),
            resource: sealed.event.resource.clone(),
            resource_id: sealed.event.resource_id.clone(),
            method: sealed.event.method.clone(),
            path: sealed.event.path.clone(),
            ip_address: sealed.event.ip_address.clone(),
            user_agent: sealed.event.user_agent.clone(),
            request_body: sealed.event.request_body.clone(),
            metadata: sealed.event.metadata.clone(),
            response_status: sealed.event.response_status,
            previous_hash: sealed.previous_hash.clone(),
            hash: sealed.hash.clone(),
        };
        events.push(event.clone());
        Ok(event)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AuditEvent>> {
        let events = self.events.lock().expect("audit store lock poisoned");
        Ok(events.iter().find(|e| e.id == id).cloned())
    }

    async fn search(
        &self,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditEvent>> {
        let events = self.events.lock().expect("audit store lock poisoned");
        let mut matching: Vec<AuditEvent> = events
            .iter()
            .filter(|e| Self::matches(e, filter))
            .cloned()
            .collect();
        // Newest first, matching the SQL `ORDER BY seq DESC`.
        matching.sort_by(|a, b| b.seq.cmp(&a.seq));

        let total = matching.len() as u64;
        let items: Vec<AuditEvent> = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();

        Ok(PageResponse::new(items, page, total))
    }

    async fn range_ordered(
        &self,
        filter: &EventFilter,
        max_rows: u64,
    ) -> AppResult<Vec<AuditEvent>> {
        let events = self.events.lock().expect("audit store lock poisoned");
        let mut matching: Vec<AuditEvent> = events
            .iter()
            .filter(|e| Self::matches(e, filter))
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.seq);
        matching.truncate(max_rows as usize);
        Ok(matching)
    }

    async fn stats(
        &self,
        since: DateTime<Utc>,
        window_days: u32,
        max_rows: u64,
    ) -> AppResult<AuditStats> {
        let events = self.events.lock().expect("audit store lock poisoned");
        let mut window: Vec<&AuditEvent> =
            events.iter().filter(|e| e.timestamp >= since).collect();
        window.sort_by_key(|e| e.seq);
        window.truncate(max_rows as usize);

        let mut by_actor: BTreeMap<String, i64> = BTreeMap::new();
        let mut by_action: BTreeMap<String, i64> = BTreeMap::new();
        let mut by_resource: BTreeMap<String, i64> = BTreeMap::new();
        let mut by_day: BTreeMap<chrono::NaiveDate, i64> = BTreeMap::new();
        let mut success_count = 0i64;
        let mut error_count = 0i64;

        for event in &window {
            *by_actor.entry(event.actor.clone()).or_default() += 1;
            *by_action.entry(event.action.clone()).or_default() += 1;
            *by_resource.entry(event.resource.clone()).or_default() += 1;
            *by_day.entry(event.timestamp.date_naive()).or_default() += 1;
            match event.response_status {
                Some(status) if status >= 400 => error_count += 1,
                _ => success_count += 1,
            }
        }

        Ok(AuditStats {
            window_days,
            total_events: window.len() as i64,
            by_actor: into_sorted_counts(by_actor),
            by_action: into_sorted_counts(by_action),
            by_resource: into_sorted_counts(by_resource),
            by_day: by_day
                .into_iter()
                .map(|(day, count)| CountByDay { day, count })
                .collect(),
            success_count,
            error_count,
        })
    }
}

/// Convert a grouped map into count-descending `CountByKey` rows,
/// matching the SQL `ORDER BY count DESC` used by the production store.
fn into_sorted_counts(map: BTreeMap<String, i64>) -> Vec<CountByKey> {
    let mut counts: Vec<CountByKey> = map
        .into_iter()
        .map(|(key, count)| CountByKey { key, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
