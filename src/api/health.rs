use axum::{response::IntoResponse, Json};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "success": true, "status": "ok", "message": "Millet marketplace API is running" }))
}
