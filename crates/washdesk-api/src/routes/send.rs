use axum::{extract::State, Json};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;
use washdesk_providers::{ProviderKind, TwilioMessage};
use washdesk_types::{Attachments, ComplaintForm};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[schema(value_type = Object)]
    pub form_data: ComplaintForm,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub archivos: Attachments,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Relay a complaint to the support number through Gupshup
#[utoipa::path(
    post,
    path = "/send-gupshup",
    request_body = RelayRequest,
    responses(
        (status = 200, description = "Complaint relayed", body = RelayResponse),
        (status = 400, description = "Invalid complaint"),
        (status = 429, description = "Rate limited"),
        (status = 500, description = "Gupshup not configured or failed")
    ),
    tag = "relay"
)]
pub async fn send_gupshup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RelayRequest>,
) -> ApiResult<Json<RelayResponse>> {
    let errors = req.form_data.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    let client = state.gupshup.as_ref().ok_or(ApiError::ProviderNotConfigured("Gupshup"))?;

    let form = req.form_data.sanitized();
    tracing::info!(
        problem_kind = %form.problem_kind,
        attachments = req.archivos.len(),
        "relaying complaint via gupshup"
    );

    let message = form.render_message(
        &req.archivos,
        ProviderKind::Gupshup.display_name(),
        Local::now().fixed_offset(),
    );
    let receipt = client
        .send_text(&state.config.gupshup.target_number, &form.name, &message)
        .await?;

    Ok(Json(RelayResponse {
        success: true,
        message: "Complaint sent via Gupshup".to_string(),
        message_id: receipt.message_id.unwrap_or_else(|| "gupshup-success".to_string()),
        timestamp: Utc::now(),
        data: receipt.raw,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WhatsAppSendResponse {
    pub success: bool,
    pub message: String,
    pub sid: Option<String>,
    pub status: Option<String>,
}

/// Send a prepared WhatsApp message through Twilio
#[utoipa::path(
    post,
    path = "/send-whatsapp",
    request_body(content = Object, description = "`to`, optional `from`, `body`, optional `mediaUrls`"),
    responses(
        (status = 200, description = "Message accepted by Twilio", body = WhatsAppSendResponse),
        (status = 400, description = "Missing recipient or content"),
        (status = 500, description = "Twilio not configured or failed")
    ),
    tag = "relay"
)]
pub async fn send_whatsapp(
    State(state): State<Arc<AppState>>,
    Json(mut message): Json<TwilioMessage>,
) -> ApiResult<Json<WhatsAppSendResponse>> {
    if message.to.trim().is_empty() {
        message.to = state.config.twilio.target_number.clone();
    }
    if message.body.trim().is_empty() && message.media_urls.is_empty() {
        return Err(ApiError::BadRequest("body or mediaUrls is required".to_string()));
    }
    let client = state.twilio.as_ref().ok_or(ApiError::ProviderNotConfigured("Twilio"))?;

    tracing::info!(
        to = %message.to,
        media = message.media_urls.len(),
        "sending whatsapp message via twilio"
    );
    let receipt = client.send(&message).await?;

    Ok(Json(WhatsAppSendResponse {
        success: true,
        message: "Message sent".to_string(),
        sid: receipt.message_id,
        status: receipt.status,
    }))
}
