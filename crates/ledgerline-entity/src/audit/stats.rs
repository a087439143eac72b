//! Aggregate statistics models for the reporting API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Event count grouped by a string key (actor, action, or resource).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountByKey {
    /// The grouping key.
    pub key: String,
    /// Number of events for this key.
    pub count: i64,
}

/// Event count for a single calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountByDay {
    /// The UTC calendar day.
    pub day: NaiveDate,
    /// Number of events recorded on that day.
    pub count: i64,
}

/// Aggregate statistics over a trailing window of days.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    /// Length of the trailing window, in days.
    pub window_days: u32,
    /// Total events in the window.
    pub total_events: i64,
    /// Events grouped by actor.
    pub by_actor: Vec<CountByKey>,
    /// Events grouped by action.
    pub by_action: Vec<CountByKey>,
    /// Events grouped by resource.
    pub by_resource: Vec<CountByKey>,
    /// Events grouped by UTC day.
    pub by_day: Vec<CountByDay>,
    /// Events with `response_status < 400` (manual events count as
    /// successes — they have no status).
    pub success_count: i64,
    /// Events with `response_status >= 400`.
    pub error_count: i64,
}
