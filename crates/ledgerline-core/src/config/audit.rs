//! Audit subsystem configuration.
//!
//! These are operator-tunable constants, not request inputs: the export
//! and verification row caps protect the database from unbounded scans,
//! and the body capture limit bounds per-event payload size.

use serde::{Deserialize, Serialize};

/// Audit subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Path prefix of the business API surface that is auto-instrumented.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Path prefixes that are never audited (health checks, the audit
    /// admin surface itself).
    #[serde(default = "default_skip_paths")]
    pub skip_paths: Vec<String>,
    /// Maximum number of rows a single export may return.
    #[serde(default = "default_max_export_rows")]
    pub max_export_rows: u64,
    /// Maximum number of rows a verification or statistics scan may read.
    #[serde(default = "default_max_range_rows")]
    pub max_range_rows: u64,
    /// Maximum number of request/response body bytes captured per event.
    #[serde(default = "default_body_capture_limit")]
    pub body_capture_limit_bytes: usize,
    /// Capacity of the single-writer event queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Default trailing window for aggregate statistics, in days.
    #[serde(default = "default_stats_days")]
    pub stats_default_days: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            skip_paths: default_skip_paths(),
            max_export_rows: default_max_export_rows(),
            max_range_rows: default_max_range_rows(),
            body_capture_limit_bytes: default_body_capture_limit(),
            queue_capacity: default_queue_capacity(),
            stats_default_days: default_stats_days(),
        }
    }
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_skip_paths() -> Vec<String> {
    vec!["/api/health".to_string(), "/api/audit".to_string()]
}

fn default_max_export_rows() -> u64 {
    50_000
}

fn default_max_range_rows() -> u64 {
    10_000
}

fn default_body_capture_limit() -> usize {
    16 * 1024
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_stats_days() -> u32 {
    7
}
