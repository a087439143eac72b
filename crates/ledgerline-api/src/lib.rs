//! # ledgerline-api
//!
//! HTTP layer for the audit ledger: router, middleware (request context,
//! auto-instrumentation interceptor, admin guard, request logging),
//! handlers, and DTOs.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;
