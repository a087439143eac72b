//! Auto-instrumentation interceptor.
//!
//! Records every mutating business-API call as an audit event without any
//! handler opting in. The middleware captures a size-capped copy of a
//! JSON request body, runs the inner service, captures the response
//! status plus a size-capped copy of a JSON response body, and submits
//! the assembled event to the sink. Capture is best-effort: oversized or
//! unsized bodies reach the handler (or the client) untouched and simply
//! go unrecorded, and submission is fire-and-forget — the response goes
//! back regardless of what happens to the event.

use axum::body::{Body, HttpBody, to_bytes};
use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use ledgerline_audit::context::RequestContext;
use ledgerline_core::config::AuditConfig;
use ledgerline_entity::audit::NewAuditEvent;

use crate::state::AppState;

/// Record qualifying requests in the audit ledger.
pub async fn audit_interceptor(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let config = &state.config.audit;
    if !qualifies(request.method(), request.uri().path(), config) {
        return next.run(request).await;
    }

    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    let Some((resource, resource_id)) = parse_resource(&path, &config.api_prefix) else {
        debug!(%path, "no resource segment after API prefix, not auditing");
        return next.run(request).await;
    };

    let (request, request_body) =
        capture_request_body(request, config.body_capture_limit_bytes).await;

    let response = next.run(request).await;
    let status = response.status();

    let (response, response_body) =
        capture_response_body(response, config.body_capture_limit_bytes).await;

    let Some(ctx) = RequestContext::current() else {
        warn!(%path, "no request context active, audit event skipped");
        return response;
    };

    let elapsed_ms = (Utc::now() - ctx.started_at).num_milliseconds();
    let mut metadata = Map::new();
    if let Some(query) = query {
        metadata.insert("query".to_string(), Value::String(query));
    }
    metadata.insert("elapsedMs".to_string(), Value::from(elapsed_ms));
    metadata.insert(
        "success".to_string(),
        Value::Bool(status.as_u16() < 400),
    );
    metadata.insert(
        "responseBody".to_string(),
        response_body.unwrap_or(Value::Null),
    );

    state.sink.submit(NewAuditEvent {
        timestamp: Utc::now(),
        request_id: ctx.request_id,
        actor: ctx.actor,
        action: format!("{}_{}", method, resource.to_uppercase()),
        resource,
        resource_id,
        method,
        path,
        ip_address: ctx.ip_address,
        user_agent: ctx.user_agent,
        request_body,
        metadata: Some(Value::Object(metadata)),
        response_status: Some(i32::from(status.as_u16())),
    });

    response
}

/// Whether a request is subject to auto-instrumentation: mutating verb,
/// under the API prefix, not on the skip list.
fn qualifies(method: &Method, path: &str, config: &AuditConfig) -> bool {
    let mutating = matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    );
    mutating
        && path.starts_with(&config.api_prefix)
        && !config.skip_paths.iter().any(|skip| path.starts_with(skip))
}

/// Derive `(resource, resource_id)` from the path segments after the API
/// prefix, skipping an optional `v<N>` version segment.
///
/// `/api/v1/vehicles/42/move` yields `("vehicles", Some("42"))`.
fn parse_resource(path: &str, api_prefix: &str) -> Option<(String, Option<String>)> {
    let rest = path.strip_prefix(api_prefix)?;
    let mut segments = rest.split('/').filter(|s| !s.is_empty()).peekable();

    if let Some(first) = segments.peek() {
        if is_version_segment(first) {
            segments.next();
        }
    }

    let resource = segments.next()?.to_string();
    let resource_id = segments.next().map(str::to_string);
    Some((resource, resource_id))
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse a body as JSON when it fits the capture cap.
fn capture_json(bytes: &[u8], cap: usize) -> Option<Value> {
    if bytes.is_empty() || bytes.len() > cap {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

/// Capture a size-capped JSON copy of the request body.
///
/// Only buffers when the body reports an exact size within the cap;
/// oversized or streaming bodies reach the handler untouched with no
/// body captured, so audit capture can never reject a request.
async fn capture_request_body(request: Request, cap: usize) -> (Request, Option<Value>) {
    let exact = request.body().size_hint().exact().map(|n| n as usize);
    match exact {
        Some(len) if len > 0 && len <= cap => {
            let (parts, body) = request.into_parts();
            match to_bytes(body, cap).await {
                Ok(bytes) => {
                    let captured = capture_json(&bytes, cap);
                    (Request::from_parts(parts, Body::from(bytes)), captured)
                }
                Err(e) => {
                    warn!(error = %e, "failed to buffer request body");
                    (Request::from_parts(parts, Body::empty()), None)
                }
            }
        }
        _ => (request, None),
    }
}

/// Capture a size-capped JSON copy of the response body.
///
/// Only buffers when the body reports an exact size within the cap
/// (which in-memory bodies like `Json` responses do); streaming or
/// oversized responses pass through untouched with no body captured, so
/// the client never sees an altered response.
async fn capture_response_body(response: Response, cap: usize) -> (Response, Option<Value>) {
    let exact = response.body().size_hint().exact().map(|n| n as usize);
    match exact {
        Some(len) if len > 0 && len <= cap => {
            let (parts, body) = response.into_parts();
            match to_bytes(body, cap).await {
                Ok(bytes) => {
                    let captured = capture_json(&bytes, cap);
                    (Response::from_parts(parts, Body::from(bytes)), captured)
                }
                Err(e) => {
                    warn!(error = %e, "failed to buffer response body");
                    (Response::from_parts(parts, Body::empty()), None)
                }
            }
        }
        _ => (response, None),
    }
}
