//! Application builder — wires router, middleware, and state into an
//! Axum app and runs it.

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;

use ledgerline_core::config::AppConfig;
use ledgerline_core::error::AppError;
use ledgerline_database::repositories::audit::PgAuditStore;

use ledgerline_audit::store::AuditStore;

use crate::router::build_router;
use crate::state::AppState;

/// Runs the Ledgerline server with the given configuration and pool.
///
/// Standalone deployments serve only the audit surface; embedding hosts
/// call [`build_router`] directly with their own business routes.
pub async fn run_server(config: AppConfig, db_pool: PgPool) -> Result<(), AppError> {
    tracing::info!("Starting Ledgerline server...");

    let store: Arc<dyn AuditStore> = Arc::new(PgAuditStore::new(db_pool));
    let state = AppState::new(Arc::new(config.clone()), store);

    let app = build_router(state, Router::new());
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Ledgerline server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
