//! Aggregate statistics handler.

use axum::Json;
use axum::extract::{Query, State};
use chrono::{Duration, Utc};

use ledgerline_core::error::AppError;
use ledgerline_entity::audit::AuditStats;

use crate::dto::request::StatsQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Longest supported statistics window.
const MAX_WINDOW_DAYS: u32 = 365;

/// GET /api/audit/stats
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<ApiResponse<AuditStats>>> {
    let days = query.days.unwrap_or(state.config.audit.stats_default_days);
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(AppError::validation(format!(
            "days must be between 1 and {MAX_WINDOW_DAYS}"
        ))
        .into());
    }

    let since = Utc::now() - Duration::days(i64::from(days));
    let stats = state
        .store
        .stats(since, days, state.config.audit.max_range_rows)
        .await?;
    Ok(Json(ApiResponse::ok(stats)))
}
