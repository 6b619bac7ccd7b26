use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use washdesk_types::{DailyStats, MessageKind, StoredMessage};

/// Row shape of the `messages` table
#[derive(Debug, FromRow)]
pub struct PgMessageRow {
    pub id: i64,
    pub provider_message_id: String,
    pub from_number: String,
    pub to_number: String,
    pub message_type: String,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub caption: Option<String>,
    pub sender_name: Option<String>,
    pub conversation_id: String,
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub processed: bool,
    pub auto_response_sent: bool,
    pub intent_detected: Option<String>,
    pub metadata: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct PgDailyStatsRow {
    pub date: NaiveDate,
    pub total_messages: i64,
    pub text_messages: i64,
    pub image_messages: i64,
    pub processed_messages: i64,
    pub auto_responses: i64,
    pub unique_users: i64,
    pub unique_conversations: i64,
}

impl From<PgMessageRow> for StoredMessage {
    fn from(row: PgMessageRow) -> Self {
        Self {
            id: row.id.to_string(),
            message_id: row.provider_message_id,
            from_number: row.from_number,
            to_number: row.to_number,
            kind: MessageKind::from(row.message_type),
            content: row.content.unwrap_or_default(),
            media_url: row.media_url,
            caption: row.caption.unwrap_or_default(),
            sender_name: row.sender_name.unwrap_or_default(),
            conversation_id: row.conversation_id,
            session_id: row.session_id,
            timestamp: row.timestamp,
            received_at: row.received_at,
            processed: row.processed,
            auto_response_sent: row.auto_response_sent,
            // Labels written by older builds are dropped rather than failing the read
            intent: row.intent_detected.and_then(|label| label.parse().ok()),
            metadata: row.metadata.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<PgDailyStatsRow> for DailyStats {
    fn from(row: PgDailyStatsRow) -> Self {
        Self {
            date: row.date,
            total_messages: row.total_messages,
            text_messages: row.text_messages,
            image_messages: row.image_messages,
            processed_messages: row.processed_messages,
            auto_responses: row.auto_responses,
            unique_users: row.unique_users,
            unique_conversations: row.unique_conversations,
        }
    }
}
