use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use washdesk_types::{InboundMessage, Intent, MessageKind, StoredMessage};

/// MongoDB document for the `messages` collection
///
/// Timestamps are stored as native BSON dates so range filters and the TTL
/// sweep can compare them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessageDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub message_id: String,
    pub from_number: String,
    pub to_number: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub sender_name: String,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub auto_response_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl MongoMessageDoc {
    pub fn from_inbound(message: InboundMessage, now: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new(),
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

impl From<MongoMessageDoc> for StoredMessage {
    fn from(doc: MongoMessageDoc) -> Self {
        Self {
            id: doc.id.to_hex(),
            message_id: doc.message_id,
            from_number: doc.from_number,
            to_number: doc.to_number,
            kind: doc.kind,
            content: doc.content,
            media_url: doc.media_url,
            caption: doc.caption,
            sender_name: doc.sender_name,
            conversation_id: doc.conversation_id,
            session_id: doc.session_id,
            timestamp: doc.timestamp,
            received_at: doc.received_at,
            processed: doc.processed,
            auto_response_sent: doc.auto_response_sent,
            intent: doc.intent,
            metadata: doc.metadata,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}
