//! Middleware components for HTTP request processing.
//!
//! Cross-cutting concerns layered onto the router: bearer-token authentication,
//! client IP extraction, fixed-window rate limiting and security headers.

pub mod auth;
pub mod ip;
pub mod rate_limit;
pub mod security_headers;

pub use rate_limit::RateLimiter;
