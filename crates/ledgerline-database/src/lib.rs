//! # ledgerline-database
//!
//! PostgreSQL connection management and the concrete [`PgAuditStore`]
//! backing the audit ledger.
//!
//! [`PgAuditStore`]: repositories::audit::PgAuditStore

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::audit::PgAuditStore;
