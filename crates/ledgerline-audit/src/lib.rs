//! # ledgerline-audit
//!
//! The tamper-evident audit subsystem: every mutating operation against
//! the host service is recorded as an append-only, hash-chained ledger
//! entry, and the recorded history can later be replayed to prove whether
//! it was altered.
//!
//! Write path: context → redactor → hash chain → store, serialized
//! through a single-writer queue so concurrent requests can never fork
//! the chain. The verifier and reporting surfaces read from the same
//! store independently of the write path.

pub mod chain;
pub mod context;
pub mod export;
pub mod memory;
pub mod redact;
pub mod store;
pub mod verify;
pub mod writer;

pub use chain::GENESIS_HASH;
pub use context::RequestContext;
pub use store::{AuditStore, EventFilter, SealedEvent};
pub use writer::{AuditSink, AuditWriter};
