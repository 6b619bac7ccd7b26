use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use washdesk_types::{DailyStats, InboundMessage, Intent, StoredMessage};

use crate::error::{PersistError, Result};
use crate::store::MessageStore;

/// Process-local message store
///
/// Used when no database is configured and in tests. Contents are lost on
/// restart.
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: RwLock<HashMap<String, StoredMessage>>,
    next_id: AtomicU64,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    async fn update<F>(&self, message_id: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut StoredMessage) + Send,
    {
        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(message_id)
            .ok_or_else(|| PersistError::MessageNotFound(message_id.to_string()))?;
        apply(message);
        message.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn save_message(&self, message: InboundMessage) -> Result<StoredMessage> {
        let mut messages = self.messages.write().await;
        let now = Utc::now();

        if let Some(existing) = messages.get_mut(&message.message_id) {
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = StoredMessage::from_inbound(id.to_string(), message, now);
        messages.insert(stored.message_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn exists(&self, message_id: &str) -> Result<bool> {
        Ok(self.messages.read().await.contains_key(message_id))
    }

    async fn get_message(&self, message_id: &str) -> Result<Option<StoredMessage>> {
        Ok(self.messages.read().await.get(message_id).cloned())
    }

    async fn get_conversation(&self, conversation_id: &str, limit: i64) -> Result<Vec<StoredMessage>> {
        let messages = self.messages.read().await;
        let mut conversation: Vec<StoredMessage> = messages
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();

        conversation.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        conversation.truncate(limit.max(0) as usize);
        conversation.reverse();
        Ok(conversation)
    }

    async fn mark_processed(&self, message_id: &str, intent: Option<Intent>) -> Result<()> {
        self.update(message_id, |message| {
            message.processed = true;
            if intent.is_some() {
                message.intent = intent;
            }
        })
        .await
    }

    async fn mark_auto_response_sent(&self, message_id: &str) -> Result<()> {
        self.update(message_id, |message| message.auto_response_sent = true).await
    }

    async fn get_stats(&self, days: i64) -> Result<Vec<DailyStats>> {
        let since = Utc::now() - Duration::days(days);
        let messages = self.messages.read().await;
        Ok(DailyStats::from_messages(messages.values(), since))
    }

    async fn get_unprocessed(&self, limit: i64) -> Result<Vec<StoredMessage>> {
        let messages = self.messages.read().await;
        let mut pending: Vec<StoredMessage> = messages.values().filter(|m| !m.processed).cloned().collect();
        pending.sort_by_key(|m| m.timestamp);
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }

    async fn get_by_phone(&self, phone: &str, limit: i64) -> Result<Vec<StoredMessage>> {
        let messages = self.messages.read().await;
        let mut sent: Vec<StoredMessage> = messages.values().filter(|m| m.from_number == phone).cloned().collect();
        sent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sent.truncate(limit.max(0) as usize);
        Ok(sent)
    }

    async fn purge_older_than(&self, days: i64) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(days);
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|_, m| m.timestamp >= cutoff);
        Ok((before - messages.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
