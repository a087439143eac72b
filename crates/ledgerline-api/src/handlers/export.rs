//! Ledger export handler.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::Response;
use chrono::Utc;

use ledgerline_audit::export::to_csv;
use ledgerline_core::error::{AppError, ErrorKind};

use crate::dto::request::ExportQuery;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/audit/export
///
/// Streams the filtered ledger as a downloadable CSV (default) or raw
/// JSON array, capped at the configured maximum row count.
pub async fn export(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let filter = query.filter()?;
    let events = state
        .store
        .range_ordered(&filter, state.config.audit.max_export_rows)
        .await?;

    let date = Utc::now().format("%Y-%m-%d");
    let (content_type, filename, body) = match query.format.as_deref().unwrap_or("csv") {
        "csv" => (
            "text/csv; charset=utf-8",
            format!("audit-export-{date}.csv"),
            to_csv(&events)?,
        ),
        "json" => (
            "application/json",
            format!("audit-export-{date}.json"),
            serde_json::to_string(&events).map_err(AppError::from)?,
        ),
        other => {
            return Err(AppError::validation(format!(
                "Unsupported export format '{other}', expected 'csv' or 'json'"
            ))
            .into());
        }
    };

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(body))
        .map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to build export response", e).into()
        })
}
