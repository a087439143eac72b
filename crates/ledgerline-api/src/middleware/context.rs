//! Request context middleware.
//!
//! Builds a [`RequestContext`] for every inbound request and runs the
//! rest of the stack inside its task-local scope, so the interceptor and
//! any manual `log_event` call executed for this request observe the
//! same request id, actor, and network origin.

use axum::extract::Request;
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use ledgerline_audit::context::RequestContext;

/// Header carrying the principal resolved by the upstream auth layer.
pub const ACTOR_HEADER: &str = "x-authenticated-user";

/// Wrap the request in an ambient [`RequestContext`] scope.
pub async fn request_context(request: Request, next: Next) -> Response {
    let headers = request.headers();
    let actor = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ip_address = client_ip(headers);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let ctx = match actor {
        Some(actor) => RequestContext::new(actor, ip_address, user_agent),
        None => RequestContext::anonymous(ip_address, user_agent),
    };

    ctx.scope(next.run(request)).await
}

/// Resolve the client IP, preferring proxy-set headers.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        // First entry is the originating client.
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
