//! Request DTOs and query-string parsing.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use ledgerline_audit::store::EventFilter;
use ledgerline_core::error::AppError;
use ledgerline_core::result::AppResult;
use ledgerline_core::types::pagination::{DEFAULT_LIMIT, PageRequest};

/// Query parameters for `GET /api/audit/events`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    /// Exact actor filter.
    pub actor: Option<String>,
    /// Exact action filter.
    pub action: Option<String>,
    /// Exact resource filter.
    pub resource: Option<String>,
    /// Inclusive RFC 3339 lower bound.
    pub start_date: Option<String>,
    /// Inclusive RFC 3339 upper bound.
    pub end_date: Option<String>,
    /// Page size, clamped server-side.
    pub limit: Option<u64>,
    /// Items to skip.
    pub offset: Option<u64>,
}

impl ListEventsQuery {
    /// Build the store filter, rejecting malformed dates with a
    /// validation error.
    pub fn filter(&self) -> AppResult<EventFilter> {
        Ok(EventFilter {
            actor: self.actor.clone(),
            action: self.action.clone(),
            resource: self.resource.clone(),
            start: parse_date("startDate", self.start_date.as_deref())?,
            end: parse_date("endDate", self.end_date.as_deref())?,
        })
    }

    /// Build the clamped page request.
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.limit.unwrap_or(DEFAULT_LIMIT), self.offset.unwrap_or(0))
    }
}

/// Body for `POST /api/audit/verify`. Both bounds optional; an absent
/// body verifies the whole ledger (up to the configured row cap).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Inclusive RFC 3339 lower bound.
    pub start_date: Option<String>,
    /// Inclusive RFC 3339 upper bound.
    pub end_date: Option<String>,
}

impl VerifyRequest {
    /// Parse both bounds.
    pub fn bounds(&self) -> AppResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        Ok((
            parse_date("startDate", self.start_date.as_deref())?,
            parse_date("endDate", self.end_date.as_deref())?,
        ))
    }
}

/// Query parameters for `GET /api/audit/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    /// Trailing window in days; falls back to the configured default.
    pub days: Option<u32>,
}

/// Query parameters for `GET /api/audit/export`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    /// Exact actor filter.
    pub actor: Option<String>,
    /// Exact action filter.
    pub action: Option<String>,
    /// Exact resource filter.
    pub resource: Option<String>,
    /// Inclusive RFC 3339 lower bound.
    pub start_date: Option<String>,
    /// Inclusive RFC 3339 upper bound.
    pub end_date: Option<String>,
    /// `csv` (default) or `json`.
    pub format: Option<String>,
}

impl ExportQuery {
    /// Build the store filter, rejecting malformed dates.
    pub fn filter(&self) -> AppResult<EventFilter> {
        Ok(EventFilter {
            actor: self.actor.clone(),
            action: self.action.clone(),
            resource: self.resource.clone(),
            start: parse_date("startDate", self.start_date.as_deref())?,
            end: parse_date("endDate", self.end_date.as_deref())?,
        })
    }
}

/// Parse an optional RFC 3339 timestamp query parameter.
fn parse_date(name: &str, value: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    match value {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| {
                AppError::validation(format!(
                    "Invalid {name}: expected an RFC 3339 timestamp, got '{raw}'"
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_rfc3339() {
        let parsed = parse_date("startDate", Some("2024-05-01T00:00:00Z"))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-05-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        let err = parse_date("endDate", Some("yesterday")).unwrap_err();
        assert!(err.message.contains("endDate"));
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListEventsQuery::default();
        let page = query.page();
        assert_eq!(page.limit, DEFAULT_LIMIT);
        assert_eq!(page.offset, 0);
        assert!(query.filter().unwrap().actor.is_none());
    }

    #[test]
    fn test_list_query_limit_clamped() {
        let query = ListEventsQuery {
            limit: Some(1_000_000),
            ..ListEventsQuery::default()
        };
        assert_eq!(query.page().limit, 1000);
    }
}
