//! HTTP request handlers.

pub mod events;
pub mod export;
pub mod health;
pub mod stats;
pub mod verify;
