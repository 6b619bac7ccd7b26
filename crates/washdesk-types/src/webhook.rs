//! Provider webhook payloads and their mapping onto [`InboundMessage`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::message::{InboundMessage, MessageKind};

const DEFAULT_SENDER_NAME: &str = "Usuario";
const DEFAULT_COUNTRY_CODE: &str = "56";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("webhook has no payload")]
    MissingPayload,

    #[error("webhook payload has no message id")]
    MissingMessageId,

    #[error("webhook payload has no sender")]
    MissingSender,

    #[error("malformed webhook payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Top-level Gupshup webhook envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GupshupEnvelope {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct GupshupPayload {
    id: Option<String>,
    source: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    payload: Option<GupshupContent>,
    text: Option<String>,
    url: Option<String>,
    caption: Option<String>,
    name: Option<String>,
    sender: Option<GupshupSender>,
    context: Option<GupshupContext>,
    #[serde(rename = "gsId")]
    gs_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GupshupContent {
    text: Option<String>,
    url: Option<String>,
    caption: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GupshupSender {
    phone: Option<String>,
    name: Option<String>,
    country_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GupshupContext {
    id: Option<String>,
    #[serde(rename = "gsId")]
    gs_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Millisecond epoch timestamps arrive as numbers or numeric strings.
pub fn timestamp_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl GupshupEnvelope {
    pub fn from_value(value: &Value) -> Result<Self, ExtractError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Map the envelope onto an [`InboundMessage`] addressed to `to_number`.
    pub fn into_inbound(
        self,
        to_number: &str,
        received_at: DateTime<Utc>,
    ) -> Result<InboundMessage, ExtractError> {
        let raw_payload = self.payload.ok_or(ExtractError::MissingPayload)?;
        let payload: GupshupPayload = serde_json::from_value(raw_payload.clone())?;

        let message_id = non_empty(payload.id).ok_or(ExtractError::MissingMessageId)?;
        let sender = payload.sender.unwrap_or_default();
        let content = payload.payload.unwrap_or_default();
        let context = payload.context.unwrap_or_default();

        let source = non_empty(payload.source);
        let from_number = source
            .clone()
            .or_else(|| non_empty(sender.phone.clone()))
            .ok_or(ExtractError::MissingSender)?;
        let sender_phone = non_empty(sender.phone).unwrap_or_else(|| from_number.clone());

        let timestamp = self
            .timestamp
            .as_ref()
            .and_then(timestamp_millis)
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or(received_at);

        let conversation_id = non_empty(context.id)
            .unwrap_or_else(|| format!("conv_{}", from_number));

        Ok(InboundMessage {
            message_id,
            from_number,
            to_number: to_number.to_string(),
            kind: non_empty(payload.kind)
                .map(MessageKind::from)
                .unwrap_or(MessageKind::Text),
            content: non_empty(content.text)
                .or_else(|| non_empty(payload.text))
                .unwrap_or_default(),
            media_url: non_empty(content.url).or_else(|| non_empty(payload.url)),
            caption: non_empty(content.caption)
                .or_else(|| non_empty(payload.caption))
                .unwrap_or_default(),
            sender_name: non_empty(sender.name)
                .or_else(|| non_empty(payload.name))
                .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
            sender_phone,
            country_code: non_empty(sender.country_code)
                .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string()),
            conversation_id,
            session_id: non_empty(context.gs_id).or_else(|| non_empty(payload.gs_id)),
            timestamp,
            received_at,
            metadata: json!({
                "app": self.app,
                "version": self.version,
                "webhook_type": self.event_type,
                "raw_payload": raw_payload,
            }),
        })
    }
}

/// Form fields Twilio posts to the inbound WhatsApp webhook.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TwilioInbound {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub message_sid: String,
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub num_media: Option<String>,
    #[serde(default, rename = "MediaUrl0")]
    pub media_url0: Option<String>,
}

impl TwilioInbound {
    pub fn into_inbound(self, received_at: DateTime<Utc>) -> Result<InboundMessage, ExtractError> {
        if self.message_sid.is_empty() {
            return Err(ExtractError::MissingMessageId);
        }
        let from_number = self.from.trim_start_matches("whatsapp:").to_string();
        if from_number.is_empty() {
            return Err(ExtractError::MissingSender);
        }

        let has_media = self
            .num_media
            .as_deref()
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(0)
            > 0;

        Ok(InboundMessage {
            message_id: self.message_sid.clone(),
            to_number: self.to.trim_start_matches("whatsapp:").to_string(),
            kind: if has_media { MessageKind::Image } else { MessageKind::Text },
            content: self.body.clone(),
            media_url: self.media_url0.clone(),
            caption: String::new(),
            sender_name: non_empty(self.profile_name.clone())
                .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
            sender_phone: from_number.clone(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            conversation_id: format!("conv_{}", from_number),
            session_id: None,
            timestamp: received_at,
            received_at,
            metadata: json!({ "provider": "twilio", "message_sid": self.message_sid }),
            from_number,
        })
    }
}
