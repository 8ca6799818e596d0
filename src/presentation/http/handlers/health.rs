//! Health Handler

/// Liveness probe for container orchestrators.
pub async fn health_check() -> &'static str {
    "ok"
}
