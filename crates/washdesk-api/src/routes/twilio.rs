use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use washdesk_providers::TwilioAccount;
use washdesk_types::TwilioInbound;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const TWIML_REPLY: &str =
    "Gracias por tu mensaje. Un representante se pondrá en contacto contigo pronto.";

fn twiml(message: &str) -> String {
    let escaped = message
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escaped
    )
}

/// Inbound WhatsApp message from Twilio, answered with TwiML
///
/// The message is stored so it shows in conversations and stats. The TwiML
/// reply counts as the automatic response.
#[utoipa::path(
    post,
    path = "/webhook",
    request_body(content = String, description = "Twilio form fields", content_type = "application/x-www-form-urlencoded"),
    responses((status = 200, description = "TwiML reply", content_type = "text/xml")),
    tag = "webhooks"
)]
pub async fn twilio_webhook(State(state): State<Arc<AppState>>, Form(inbound): Form<TwilioInbound>) -> Response {
    tracing::info!(
        from = %inbound.from,
        message_sid = %inbound.message_sid,
        "twilio message received"
    );

    match inbound.into_inbound(chrono::Utc::now()) {
        Ok(message) => {
            if let Err(e) = store(&state, message).await {
                tracing::error!(error = %e, "could not store twilio message");
            }
        }
        Err(e) => tracing::warn!(error = %e, "twilio webhook without a usable message"),
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        twiml(TWIML_REPLY),
    )
        .into_response()
}

async fn store(state: &AppState, message: washdesk_types::InboundMessage) -> washdesk_persist::Result<()> {
    let message_id = message.message_id.clone();
    if state.store.exists(&message_id).await? {
        tracing::info!(message_id = %message_id, "duplicate twilio message ignored");
        return Ok(());
    }
    state.store.save_message(message).await?;
    state.store.mark_processed(&message_id, None).await?;
    state.store.mark_auto_response_sent(&message_id).await
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TwilioStatus {
    pub status: String,
    #[schema(value_type = Object)]
    pub account: TwilioAccount,
}

/// Twilio account lookup
#[utoipa::path(
    get,
    path = "/twilio-status",
    responses(
        (status = 200, description = "Account reachable", body = TwilioStatus),
        (status = 500, description = "Twilio not configured or unreachable")
    ),
    tag = "health"
)]
pub async fn twilio_status(State(state): State<Arc<AppState>>) -> ApiResult<Json<TwilioStatus>> {
    let client = state.twilio.as_ref().ok_or(ApiError::ProviderNotConfigured("Twilio"))?;
    let account = client.fetch_account().await?;

    Ok(Json(TwilioStatus {
        status: "OK".to_string(),
        account,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twiml_escapes_markup() {
        assert_eq!(
            twiml("a < b & c"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>a &lt; b &amp; c</Message></Response>"
        );
    }
}
