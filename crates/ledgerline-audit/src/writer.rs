//! Event writer and single-writer sink.
//!
//! [`AuditWriter::write`] performs the full write sequence for one event:
//! redact, fetch the predecessor hash, compute this event's hash, insert.
//! That sequence is not atomic, so two concurrent writers could compute
//! against the same predecessor and fork the chain. [`AuditSink`]
//! eliminates the race by funnelling every event through one queue
//! drained by a single task — the only code path that ever runs the
//! read-last+hash+insert sequence.
//!
//! Auditing is best-effort from the caller's perspective: submission
//! never blocks, and persistence failures are logged rather than
//! propagated to the business operation that triggered the write.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use ledgerline_core::result::AppResult;
use ledgerline_entity::audit::model::{MANUAL_METHOD, MANUAL_PATH};
use ledgerline_entity::audit::{AuditEvent, NewAuditEvent};

use crate::chain::{GENESIS_HASH, compute_hash};
use crate::context::RequestContext;
use crate::redact::redact_value;
use crate::store::{AuditStore, SealedEvent};

/// Assembles, seals, and persists audit events.
#[derive(Clone)]
pub struct AuditWriter {
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    /// Create a writer over the given store.
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Redact, chain, and persist one event.
    ///
    /// Callers that must not fork the chain go through [`AuditSink`]
    /// instead of calling this concurrently.
    pub async fn write(&self, mut event: NewAuditEvent) -> AppResult<AuditEvent> {
        event.request_body = event.request_body.as_ref().map(redact_value);
        event.metadata = event.metadata.as_ref().map(redact_value);

        let previous_hash = self
            .store
            .last_hash()
            .await?
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let hash = compute_hash(&event, &previous_hash);

        let written = self
            .store
            .insert(&SealedEvent {
                event,
                previous_hash,
                hash,
            })
            .await?;

        debug!(
            event_id = %written.id,
            seq = written.seq,
            action = %written.action,
            "audit event recorded"
        );
        Ok(written)
    }
}

/// Cheaply clonable handle that feeds events to the single drain task.
#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::Sender<NewAuditEvent>,
}

impl AuditSink {
    /// Spawn the drain task and return the submission handle.
    ///
    /// The drain task owns the entire write sequence, so store insertion
    /// order equals queue order and every event's `previous_hash` is the
    /// hash actually last inserted. The task runs until every handle is
    /// dropped, independent of any request's cancellation.
    pub fn spawn(store: Arc<dyn AuditStore>, queue_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<NewAuditEvent>(queue_capacity);
        let writer = AuditWriter::new(store);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = writer.write(event).await {
                    // A missed audit event must never fail the business
                    // operation; log for out-of-band alerting.
                    warn!(error = %e, "audit write failed, event dropped");
                }
            }
        });

        Self { tx }
    }

    /// Queue an event for persistence. Never blocks and never errors:
    /// a full or closed queue is logged and the event is dropped.
    pub fn submit(&self, event: NewAuditEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!(error = %e, "audit queue rejected event");
        }
    }

    /// Record a semantically named action outside the HTTP lifecycle
    /// (e.g. `"password_reset_requested"`).
    ///
    /// Uses the ambient [`RequestContext`]; with no active context this
    /// logs a warning and records nothing — it never fails the caller.
    pub fn log_event(
        &self,
        action: impl Into<String>,
        resource: impl Into<String>,
        resource_id: Option<String>,
        metadata: Option<serde_json::Value>,
    ) {
        let action = action.into();
        let Some(ctx) = RequestContext::current() else {
            warn!(%action, "audit event outside an active request context, skipping");
            return;
        };

        self.submit(NewAuditEvent {
            timestamp: Utc::now(),
            request_id: ctx.request_id,
            actor: ctx.actor,
            action,
            resource: resource.into(),
            resource_id,
            method: MANUAL_METHOD.to_string(),
            path: MANUAL_PATH.to_string(),
            ip_address: ctx.ip_address,
            user_agent: ctx.user_agent,
            request_body: None,
            metadata,
            response_status: None,
        });
    }
}
