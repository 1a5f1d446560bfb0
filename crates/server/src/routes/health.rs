use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
}

/// Liveness probe.
pub async fn health() -> Json<Health> {
    Json(Health { status: "healthy", service: "pagefront" })
}
