//! Integrity verification handler.

use axum::Json;
use axum::extract::State;

use ledgerline_audit::verify::verify_range;
use ledgerline_entity::audit::VerificationReport;

use crate::dto::request::VerifyRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/audit/verify
///
/// An absent body verifies the whole ledger, up to the configured row cap.
pub async fn verify(
    State(state): State<AppState>,
    body: Option<Json<VerifyRequest>>,
) -> ApiResult<Json<ApiResponse<VerificationReport>>> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let (start, end) = request.bounds()?;

    let report = verify_range(
        &state.store,
        start,
        end,
        state.config.audit.max_range_rows,
    )
    .await?;

    Ok(Json(ApiResponse::ok(report)))
}
