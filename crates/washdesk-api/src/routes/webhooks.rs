//! Gupshup webhooks. Once the request passes validation the provider always
//! gets a 200, even when processing fails, so it does not retry.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use washdesk_assistant::ProcessOutcome;
use washdesk_types::GupshupEnvelope;

use crate::error::WebhookError;
use crate::middleware::client_ip::client_ip;
use crate::middleware::webhook::check_message_structure;
use crate::state::AppState;

fn validate(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: &[u8],
) -> Result<Map<String, Value>, WebhookError> {
    let ip = client_ip(headers, peer.map(|ConnectInfo(addr)| addr));
    let payload = state.validator.validate(method, headers, body, &ip)?;

    tracing::info!(
        client_ip = %ip,
        webhook_type = payload.get("type").and_then(serde_json::Value::as_str).unwrap_or(""),
        app = payload.get("app").and_then(serde_json::Value::as_str).unwrap_or(""),
        content_length = body.len(),
        "webhook received"
    );
    Ok(payload)
}

fn received(status: &str, extra: Value) -> Response {
    let mut body = json!({ "status": status, "timestamp": Utc::now() });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    (StatusCode::OK, Json(body)).into_response()
}

fn failed(error: impl std::fmt::Display) -> Response {
    received("error", json!({ "error": error.to_string() }))
}

/// Inbound WhatsApp messages
#[utoipa::path(
    post,
    path = "/webhook/gupshup",
    request_body(content = Object, description = "Gupshup message webhook", content_type = "application/json"),
    responses(
        (status = 200, description = "Received, duplicate, or failed after validation"),
        (status = 400, description = "Malformed webhook"),
        (status = 401, description = "Bad token or signature"),
        (status = 405, description = "Not a POST"),
        (status = 429, description = "Rate limited")
    ),
    tag = "webhooks"
)]
pub async fn gupshup_message(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Response {
    let payload = match validate(&state, &method, &headers, peer, &body) {
        Ok(payload) => payload,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = check_message_structure(&payload) {
        return e.into_response();
    }
    if !payload.get("payload").is_some_and(|p| !p.is_null()) {
        return WebhookError::InvalidPayload("webhook has no payload".to_string()).into_response();
    }

    let message = match GupshupEnvelope::from_value(&Value::Object(payload))
        .and_then(|envelope| envelope.into_inbound(&state.config.gupshup.source_number, Utc::now()))
    {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(error = %e, "could not extract message from webhook");
            return failed(e);
        }
    };

    tracing::info!(
        message_id = %message.message_id,
        from = %message.from_number,
        kind = message.kind.as_str(),
        "message extracted"
    );

    match state.responder.process(message).await {
        Ok(ProcessOutcome::Duplicate { message_id }) => received(
            "duplicate",
            json!({ "message": "Message already processed", "messageId": message_id }),
        ),
        Ok(ProcessOutcome::Processed(report)) => received(
            "received",
            json!({
                "messageId": report.message_id,
                "processed": true,
                "intent": report.intent,
                "escalated": report.escalated,
                "autoResponseSent": report.auto_response_sent,
            }),
        ),
        Err(e) => {
            tracing::error!("Webhook processing failed: {:#}", e);
            failed(e)
        }
    }
}

/// Delivery status events (sent, delivered, read, failed)
#[utoipa::path(
    post,
    path = "/webhook/gupshup/events",
    request_body(content = Object, content_type = "application/json"),
    responses((status = 200, description = "Event logged")),
    tag = "webhooks"
)]
pub async fn gupshup_events(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Response {
    let payload = match validate(&state, &method, &headers, peer, &body) {
        Ok(payload) => payload,
        Err(e) => return e.into_response(),
    };

    if let Some(event) = payload.get("payload") {
        tracing::info!(
            message_id = event.get("id").and_then(serde_json::Value::as_str).unwrap_or(""),
            event = event.get("type").and_then(serde_json::Value::as_str).unwrap_or(""),
            "message status event"
        );
    }
    received("event_received", json!({}))
}

/// User events (opt-in, opt-out, ...)
#[utoipa::path(
    post,
    path = "/webhook/gupshup/users",
    request_body(content = Object, content_type = "application/json"),
    responses((status = 200, description = "Event logged")),
    tag = "webhooks"
)]
pub async fn gupshup_users(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Response {
    let payload = match validate(&state, &method, &headers, peer, &body) {
        Ok(payload) => payload,
        Err(e) => return e.into_response(),
    };

    tracing::info!(
        event = payload
            .get("payload")
            .and_then(|p| p.get("type"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or(""),
        "user event"
    );
    received("user_event_received", json!({}))
}
