use async_trait::async_trait;
use washdesk_types::{DailyStats, InboundMessage, Intent, StoredMessage};

use crate::error::Result;

/// Trait for message log persistence
///
/// Implementations provide backend-specific storage for inbound messages.
/// Rows are keyed by the provider message ID; every write is an independent
/// single-row statement.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a message, or only bump `updated_at` if the ID is already known
    async fn save_message(&self, message: InboundMessage) -> Result<StoredMessage>;

    /// Whether a message with this provider ID has been stored
    async fn exists(&self, message_id: &str) -> Result<bool>;

    async fn get_message(&self, message_id: &str) -> Result<Option<StoredMessage>>;

    /// Latest `limit` messages of a conversation, oldest first
    async fn get_conversation(&self, conversation_id: &str, limit: i64) -> Result<Vec<StoredMessage>>;

    /// Flag a message as processed, recording the detected intent if any
    async fn mark_processed(&self, message_id: &str, intent: Option<Intent>) -> Result<()>;

    async fn mark_auto_response_sent(&self, message_id: &str) -> Result<()>;

    /// Per-day counts over the last `days` days, newest first
    async fn get_stats(&self, days: i64) -> Result<Vec<DailyStats>>;

    /// Oldest unprocessed messages first
    async fn get_unprocessed(&self, limit: i64) -> Result<Vec<StoredMessage>>;

    /// Messages sent by a phone number, newest first
    async fn get_by_phone(&self, phone: &str, limit: i64) -> Result<Vec<StoredMessage>>;

    /// Delete messages older than `days` days, returning how many were removed
    async fn purge_older_than(&self, days: i64) -> Result<u64>;

    /// Cheap connectivity check for health endpoints
    async fn ping(&self) -> Result<()>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}
