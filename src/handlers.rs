pub mod auth;
pub mod inventory;
pub mod locations;
pub mod production;
pub mod sessions;
pub mod snapshots;

use axum::Json;
use serde_json::{json, Value};

// GET /api/health (pública)
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Servidor no ar"))
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
