//! CSV rendering of audit events for external review.

use csv::WriterBuilder;

use ledgerline_core::error::{AppError, ErrorKind};
use ledgerline_core::result::AppResult;
use ledgerline_entity::audit::AuditEvent;

use crate::chain::canonical_timestamp;

/// Column order of the export, fixed so downstream tooling can rely on it.
pub const CSV_HEADER: [&str; 12] = [
    "ID",
    "Timestamp",
    "Request ID",
    "Actor",
    "Action",
    "Resource",
    "Resource ID",
    "Method",
    "Path",
    "IP Address",
    "Response Status",
    "Hash",
];

/// Render events as a CSV document, header row first.
///
/// Nested JSON fields (request body, metadata) are not exported; the
/// flat columns cover what reviewers filter on, and the full record
/// stays available through the JSON API.
pub fn to_csv(events: &[AuditEvent]) -> AppResult<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to write CSV header", e))?;

    for event in events {
        writer
            .write_record([
                event.id.to_string(),
                canonical_timestamp(&event.timestamp),
                event.request_id.to_string(),
                event.actor.clone(),
                event.action.clone(),
                event.resource.clone(),
                event.resource_id.clone().unwrap_or_default(),
                event.method.clone(),
                event.path.clone(),
                event.ip_address.clone().unwrap_or_default(),
                event
                    .response_status
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                event.hash.clone(),
            ])
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to write CSV row", e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to flush CSV buffer", e))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "CSV output was not valid UTF-8", e))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn sample_event(actor: &str, path: &str) -> AuditEvent {
        AuditEvent {
            id: Uuid::new_v4(),
            seq: 1,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            request_id: Uuid::new_v4(),
            actor: actor.to_string(),
            action: "GET_VEHICLES".to_string(),
            resource: "vehicles".to_string(),
            resource_id: Some("v-1".to_string()),
            method: "GET".to_string(),
            path: path.to_string(),
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: None,
            request_body: Some(json!({ "q": "x" })),
            metadata: None,
            response_status: Some(200),
            previous_hash: "GENESIS".to_string(),
            hash: "ab".repeat(32),
        }
    }

    #[test]
    fn test_header_row_and_column_order() {
        let csv = to_csv(&[]).unwrap();
        assert_eq!(
            csv.lines().next().unwrap(),
            "ID,Timestamp,Request ID,Actor,Action,Resource,Resource ID,Method,Path,IP Address,Response Status,Hash"
        );
    }

    #[test]
    fn test_rows_follow_header() {
        let event = sample_event("alice", "/api/vehicles");
        let csv = to_csv(&[event.clone()]).unwrap();
        let mut lines = csv.lines();
        lines.next();
        let row = lines.next().unwrap();
        assert!(row.starts_with(&event.id.to_string()));
        assert!(row.contains("2024-05-01T12:30:00.000000Z"));
        assert!(row.contains("alice"));
        assert!(row.ends_with(&event.hash));
    }

    #[test]
    fn test_special_characters_round_trip() {
        let mut event = sample_event("o'brien, \"admin\"", "/api/notes");
        event.resource_id = Some("line\nbreak".to_string());
        let csv = to_csv(&[event.clone()]).unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[3], "o'brien, \"admin\"");
        assert_eq!(&record[6], "line\nbreak");
    }

    #[test]
    fn test_optional_fields_render_empty() {
        let mut event = sample_event("alice", "/api/vehicles");
        event.resource_id = None;
        event.ip_address = None;
        event.response_status = None;
        let csv = to_csv(&[event]).unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[6], "");
        assert_eq!(&record[9], "");
        assert_eq!(&record[10], "");
    }
}
