//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use ledgerline_audit::store::AuditStore;
use ledgerline_audit::writer::AuditSink;
use ledgerline_core::config::AppConfig;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// The audit ledger store (PostgreSQL in production, in-memory in tests)
    pub store: Arc<dyn AuditStore>,
    /// Submission handle for the single-writer audit queue
    pub sink: AuditSink,
}

impl AppState {
    /// Assemble state from its parts, spawning the audit sink.
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn AuditStore>) -> Self {
        let sink = AuditSink::spawn(Arc::clone(&store), config.audit.queue_capacity);
        Self {
            config,
            store,
            sink,
        }
    }
}
