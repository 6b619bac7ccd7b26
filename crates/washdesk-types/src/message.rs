use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intent::Intent;

/// Content type of a WhatsApp message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    Text,
    Image,
    Other(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Other(kind) => kind,
        }
    }
}

impl From<String> for MessageKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => MessageKind::Text,
            "image" => MessageKind::Image,
            _ => MessageKind::Other(value),
        }
    }
}

impl From<&str> for MessageKind {
    fn from(value: &str) -> Self {
        MessageKind::from(value.to_string())
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A message as extracted from a provider webhook, before storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: String,
    pub from_number: String,
    pub to_number: String,
    pub kind: MessageKind,
    pub content: String,
    pub media_url: Option<String>,
    pub caption: String,
    pub sender_name: String,
    pub sender_phone: String,
    pub country_code: String,
    pub conversation_id: String,
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

/// A persisted message row, keyed by the provider message ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub message_id: String,
    pub from_number: String,
    pub to_number: String,
    pub kind: MessageKind,
    pub content: String,
    pub media_url: Option<String>,
    pub caption: String,
    pub sender_name: String,
    pub conversation_id: String,
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub processed: bool,
    pub auto_response_sent: bool,
    pub intent: Option<Intent>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredMessage {
    /// Build a fresh, unprocessed row from an inbound message.
    pub fn from_inbound(id: impl Into<String>, message: InboundMessage, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            message_id: message.message_id,
            from_number: message.from_number,
            to_number: message.to_number,
            kind: message.kind,
            content: message.content,
            media_url: message.media_url,
            caption: message.caption,
            sender_name: message.sender_name,
            conversation_id: message.conversation_id,
            session_id: message.session_id,
            timestamp: message.timestamp,
            received_at: message.received_at,
            processed: false,
            auto_response_sent: false,
            intent: None,
            metadata: message.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}
