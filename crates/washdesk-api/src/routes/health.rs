use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthFeatures {
    pub webhooks: bool,
    pub auto_responses: bool,
    pub database: bool,
    pub database_backend: String,
    pub gupshup_configured: bool,
    pub twilio_configured: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub version: String,
    pub features: HealthFeatures,
}

/// Health check endpoint
///
/// Reports the service version and which integrations are live
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let database = match state.store.ping().await {
        Ok(()) => state.store.backend() != "memory",
        Err(e) => {
            tracing::warn!(error = %e, "store ping failed");
            false
        }
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        service: "washdesk".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: HealthFeatures {
            webhooks: true,
            auto_responses: state.config.assistant.auto_responses,
            database,
            database_backend: state.store.backend().to_string(),
            gupshup_configured: state.gupshup.is_some(),
            twilio_configured: state.twilio.is_some(),
        },
    }))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GupshupStatusFeatures {
    pub webhooks_enabled: bool,
    pub ai_responses: bool,
    pub database_connected: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GupshupStatus {
    pub configured: bool,
    pub app_name: String,
    pub source_number: Option<String>,
    pub target_number: Option<String>,
    pub has_api_key: bool,
    pub features: GupshupStatusFeatures,
}

/// Replace a trailing run of four digits with `****`
pub fn mask_number(number: &str) -> String {
    let digits = number.chars().rev().take_while(char::is_ascii_digit).count();
    if digits < 4 {
        return number.to_string();
    }
    let keep = number.len() - 4;
    format!("{}****", &number[..keep])
}

/// Gupshup configuration summary, numbers masked
#[utoipa::path(
    get,
    path = "/gupshup-status",
    responses(
        (status = 200, description = "Gupshup configuration summary", body = GupshupStatus)
    ),
    tag = "health"
)]
pub async fn gupshup_status(State(state): State<Arc<AppState>>) -> Json<GupshupStatus> {
    let gupshup = &state.config.gupshup;
    let masked = |number: &str| (!number.is_empty()).then(|| mask_number(number));

    Json(GupshupStatus {
        configured: state.config.gupshup_configured(),
        app_name: gupshup.app_name.clone(),
        source_number: masked(&gupshup.source_number),
        target_number: masked(&gupshup.target_number),
        has_api_key: state.config.secrets.gupshup_api_key.is_some(),
        features: GupshupStatusFeatures {
            webhooks_enabled: true,
            ai_responses: state.config.assistant.auto_responses,
            database_connected: state.store.backend() != "memory" && state.store.ping().await.is_ok(),
        },
    })
}
