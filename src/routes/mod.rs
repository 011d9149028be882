//! HTTP route handlers.
//!
//! - `health`: liveness endpoint and API welcome route
//! - `materials`: study-material upload, listing and deletion

pub mod health;
pub mod materials;
