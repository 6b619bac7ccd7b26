pub mod admin;
pub mod docs;
pub mod health;
pub mod send;
pub mod testing;
pub mod twilio;
pub mod upload;
pub mod webhooks;

use axum::{
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use serde_json::json;

/// JSON 404 listing the main endpoints
pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "path": uri.path(),
            "method": method.as_str(),
            "available_endpoints": {
                "health": "GET /health",
                "webhook": "POST /webhook/gupshup",
                "send_complaint": "POST /send-gupshup",
                "admin_stats": "GET /admin/stats/messages",
                "admin_dashboard": "GET /admin/dashboard",
            },
        })),
    )
}
