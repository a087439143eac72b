//! Audit ledger entities.

pub mod model;
pub mod stats;
pub mod verify;

pub use model::{AuditEvent, NewAuditEvent};
pub use stats::{AuditStats, CountByDay, CountByKey};
pub use verify::{BrokenChain, VerificationReport};
