//! # General Route Handlers
//!
//! The root and health check endpoints. Both are unauthenticated.

/// The handler for the root (`/`) endpoint.
pub async fn root() -> &'static str {
    "shopadmin server is running."
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check() -> &'static str {
    "OK"
}
