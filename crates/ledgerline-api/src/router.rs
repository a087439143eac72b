//! Route definitions for the Ledgerline HTTP API.
//!
//! The audit query surface is mounted under `/api/audit` behind the admin
//! guard. Host applications embed their own business routes through
//! `build_router`'s second argument; those routes run inside the request
//! context scope and are auto-instrumented by the audit interceptor.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
///
/// `business_routes` are the host application's own `/api` routes; pass
/// `Router::new()` when running the audit service standalone.
pub fn build_router(state: AppState, business_routes: Router<AppState>) -> Router {
    let audit_routes = Router::new()
        .route("/events", get(handlers::events::list_events))
        .route("/events/{id}", get(handlers::events::get_event))
        .route("/verify", post(handlers::verify::verify))
        .route("/stats", get(handlers::stats::stats))
        .route("/export", get(handlers::export::export))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/audit", audit_routes)
        .merge(business_routes);

    // Outermost to innermost: logging, context scope, audit interceptor.
    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::audit::audit_interceptor,
        ))
        .layer(axum_middleware::from_fn(middleware::context::request_context))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::Json;
    use axum::body::Body;
    use axum::extract::Path;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use ledgerline_audit::memory::MemoryAuditStore;
    use ledgerline_audit::redact::REDACTED;
    use ledgerline_audit::store::{AuditStore, EventFilter};
    use ledgerline_core::config::AppConfig;

    use super::*;

    fn test_state(config: AppConfig) -> (AppState, Arc<MemoryAuditStore>) {
        let store = Arc::new(MemoryAuditStore::new());
        let state = AppState::new(Arc::new(config), store.clone());
        (state, store)
    }

    fn business_routes() -> Router<AppState> {
        async fn create_vehicle(Json(body): Json<Value>) -> Json<Value> {
            Json(json!({ "created": body["plate"] }))
        }
        async fn delete_vehicle(Path(id): Path<String>) -> Json<Value> {
            Json(json!({ "deleted": id }))
        }
        Router::new()
            .route("/vehicles", post(create_vehicle))
            .route("/vehicles/{id}", axum::routing::delete(delete_vehicle))
    }

    async fn wait_for_events(store: &MemoryAuditStore, n: usize) {
        for _ in 0..200 {
            if store.len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {n} audit events, store has {}", store.len());
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let (state, _) = test_state(AppConfig::default());
        let app = build_router(state, Router::new());

        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_admin_guard_rejects_without_token() {
        let mut config = AppConfig::default();
        config.server.admin_token = Some("s3cret".to_string());
        let (state, _) = test_state(config);
        let app = build_router(state, Router::new());

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/audit/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::get("/api/audit/events")
                    .header(header::AUTHORIZATION, "Bearer s3cret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_events_envelope() {
        let (state, _) = test_state(AppConfig::default());
        let app = build_router(state, Router::new());

        let response = app
            .oneshot(
                Request::get("/api/audit/events?limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["data"]["total"], 0);
        assert_eq!(body["data"]["hasNext"], false);
    }

    #[tokio::test]
    async fn test_invalid_date_is_bad_request() {
        let (state, _) = test_state(AppConfig::default());
        let app = build_router(state, Router::new());

        let response = app
            .oneshot(
                Request::get("/api/audit/events?startDate=yesterday")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("startDate")
        );
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let (state, _) = test_state(AppConfig::default());
        let app = build_router(state, Router::new());

        let response = app
            .oneshot(
                Request::get(format!(
                    "/api/audit/events/{}",
                    uuid::Uuid::new_v4()
                ))
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mutating_business_call_is_audited() {
        let (state, store) = test_state(AppConfig::default());
        let app = build_router(state, business_routes());

        let response = app
            .oneshot(
                Request::post("/api/vehicles")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-authenticated-user", "alice")
                    .header("x-forwarded-for", "203.0.113.7")
                    .body(Body::from(
                        r#"{"plate":"ABC-123","password":"hunter2"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        // The client sees the handler's response untouched.
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["created"], "ABC-123");

        wait_for_events(&store, 1).await;
        let events = store
            .range_ordered(&EventFilter::default(), 10)
            .await
            .unwrap();
        let event = &events[0];
        assert_eq!(event.action, "POST_VEHICLES");
        assert_eq!(event.resource, "vehicles");
        assert_eq!(event.actor, "alice");
        assert_eq!(event.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(event.response_status, Some(200));

        let captured = event.request_body.as_ref().unwrap();
        assert_eq!(captured["plate"], "ABC-123");
        assert_eq!(captured["password"], REDACTED);

        let metadata = event.metadata.as_ref().unwrap();
        assert_eq!(metadata["success"], true);
        assert_eq!(metadata["responseBody"]["created"], "ABC-123");
    }

    #[tokio::test]
    async fn test_oversized_request_body_is_not_rejected() {
        let (state, store) = test_state(AppConfig::default());
        let cap = state.config.audit.body_capture_limit_bytes;
        let app = build_router(state, business_routes());

        // Well past the capture cap but still valid JSON.
        let padding = "x".repeat(cap + 1024);
        let payload = format!(r#"{{"plate":"BIG-1","padding":"{padding}"}}"#);

        let response = app
            .oneshot(
                Request::post("/api/vehicles")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();

        // The business operation runs; auditing never turns a large
        // payload into an error.
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["created"], "BIG-1");

        wait_for_events(&store, 1).await;
        let events = store
            .range_ordered(&EventFilter::default(), 10)
            .await
            .unwrap();
        let event = &events[0];
        assert_eq!(event.action, "POST_VEHICLES");
        // The oversized payload itself goes unrecorded.
        assert!(event.request_body.is_none());
        assert_eq!(event.metadata.as_ref().unwrap()["success"], true);
    }

    #[tokio::test]
    async fn test_delete_captures_resource_id() {
        let (state, store) = test_state(AppConfig::default());
        let app = build_router(state, business_routes());

        let response = app
            .oneshot(
                Request::delete("/api/vehicles/v-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        wait_for_events(&store, 1).await;
        let events = store
            .range_ordered(&EventFilter::default(), 10)
            .await
            .unwrap();
        let event = &events[0];
        assert_eq!(event.action, "DELETE_VEHICLES");
        assert_eq!(event.resource_id.as_deref(), Some("v-42"));
        assert_eq!(event.actor, "anonymous");
    }

    #[tokio::test]
    async fn test_reads_and_audit_surface_are_not_audited() {
        let (state, store) = test_state(AppConfig::default());
        let app = build_router(state, business_routes());

        let requests = [
            Request::get("/api/health").body(Body::empty()).unwrap(),
            Request::post("/api/audit/verify")
                .body(Body::empty())
                .unwrap(),
            Request::get("/api/audit/events")
                .body(Body::empty())
                .unwrap(),
        ];
        for request in requests {
            app.clone().oneshot(request).await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_verify_endpoint_reports_valid_ledger() {
        let (state, store) = test_state(AppConfig::default());
        let app = build_router(state, business_routes());

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/vehicles")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"plate":"X"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        wait_for_events(&store, 1).await;

        let response = app
            .oneshot(
                Request::post("/api/audit/verify")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["data"]["isValid"], true);
        assert_eq!(body["data"]["totalEvents"], 1);
    }

    #[tokio::test]
    async fn test_export_sets_attachment_headers() {
        let (state, _) = test_state(AppConfig::default());
        let app = build_router(state, Router::new());

        let response = app
            .oneshot(
                Request::get("/api/audit/export")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/csv"));
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"audit-export-"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("ID,Timestamp,Request ID,"));
    }
}
