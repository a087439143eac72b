//! Axum middleware stack.

pub mod audit;
pub mod auth;
pub mod context;
pub mod logging;
