use axum::Json;
use serde_json::{json, Value};

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[utoipa::path(
    get,
    path = "/api",
    responses((status = 200, description = "API metadata"))
)]
pub async fn api_info() -> Json<Value> {
    Json(json!({
        "name": "soiree",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/api/docs",
    }))
}
