//! Admin guard for the audit query surface.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use ledgerline_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Require the configured admin bearer token.
///
/// With no `server.admin_token` configured the surface is open; the
/// deployment is expected to guard it at the network layer instead.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = &state.config.server.admin_token else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => Err(AppError::unauthorized("Missing or invalid admin token").into()),
    }
}
