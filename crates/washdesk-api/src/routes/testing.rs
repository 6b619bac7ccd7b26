use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Echo a webhook body back, for wiring up tunnels in development
#[utoipa::path(
    post,
    path = "/test/webhook",
    request_body(content = Object, content_type = "application/json"),
    responses(
        (status = 200, description = "Echoed body"),
        (status = 404, description = "Disabled in production")
    ),
    tag = "testing"
)]
pub async fn echo_webhook(State(state): State<Arc<AppState>>, Json(body): Json<Value>) -> ApiResult<Json<Value>> {
    if state.config.is_production() {
        return Err(ApiError::NotFound("endpoint not available in production".to_string()));
    }

    tracing::debug!(body = %body, "test webhook received");
    Ok(Json(json!({
        "received": true,
        "timestamp": Utc::now(),
        "body": body,
    })))
}
