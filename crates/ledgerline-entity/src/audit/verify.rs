//! Chain verification report models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A point in the ledger where the recomputed hash diverged from the
/// stored hash — evidence of tampering or corruption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenChain {
    /// The event whose stored hash failed recomputation.
    pub event_id: Uuid,
    /// The hash recomputed from the stored fields and the running
    /// previous hash.
    pub expected_hash: String,
    /// The hash actually stored on the event.
    pub actual_hash: String,
}

/// Result of replaying a slice of the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// `true` when no broken links were found.
    pub is_valid: bool,
    /// Every divergence found; verification never stops at the first.
    pub broken_chains: Vec<BrokenChain>,
    /// Number of events examined.
    pub total_events: u64,
}
