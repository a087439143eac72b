//! Ledger listing and lookup handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use ledgerline_core::error::AppError;
use ledgerline_core::types::pagination::PageResponse;
use ledgerline_entity::audit::AuditEvent;

use crate::dto::request::ListEventsQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/audit/events
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> ApiResult<Json<ApiResponse<PageResponse<AuditEvent>>>> {
    let filter = query.filter()?;
    let page = query.page();
    let result = state.store.search(&filter, &page).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// GET /api/audit/events/{id}
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<AuditEvent>>> {
    let event = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Audit event {id} not found")))?;
    Ok(Json(ApiResponse::ok(event)))
}
