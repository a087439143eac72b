//! Concrete repository implementations.

pub mod audit;
