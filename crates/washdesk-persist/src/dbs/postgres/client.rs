use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use washdesk_types::{DailyStats, InboundMessage, Intent, StoredMessage};

use super::models::{PgDailyStatsRow, PgMessageRow};
use super::schema::{DAILY_STATS, SCHEMA, UPSERT_MESSAGE};
use crate::error::{PersistError, Result};
use crate::store::MessageStore;

pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// Connect to PostgreSQL and make sure the schema exists
    pub async fn connect(database_url: &str, max_connections: u32, connect_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .idle_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("messages table and indexes verified");
        Ok(())
    }
}

/// `make_interval` takes an int4 day count
fn interval_days(days: i64) -> i32 {
    days.clamp(0, i32::MAX as i64) as i32
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn save_message(&self, message: InboundMessage) -> Result<StoredMessage> {
        let row: PgMessageRow = sqlx::query_as(UPSERT_MESSAGE)
            .bind(&message.message_id)
            .bind(&message.from_number)
            .bind(&message.to_number)
            .bind(message.kind.as_str())
            .bind(&message.content)
            .bind(&message.media_url)
            .bind(&message.caption)
            .bind(&message.sender_name)
            .bind(&message.conversation_id)
            .bind(&message.session_id)
            .bind(message.timestamp)
            .bind(message.received_at)
            .bind(Json(&message.metadata))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn exists(&self, message_id: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM messages WHERE provider_message_id = $1")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn get_message(&self, message_id: &str) -> Result<Option<StoredMessage>> {
        let row: Option<PgMessageRow> = sqlx::query_as("SELECT * FROM messages WHERE provider_message_id = $1")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn get_conversation(&self, conversation_id: &str, limit: i64) -> Result<Vec<StoredMessage>> {
        let rows: Vec<PgMessageRow> = sqlx::query_as(
            "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY timestamp DESC, id DESC LIMIT $2",
        )
        .bind(conversation_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        // Oldest first for display and context building
        Ok(rows.into_iter().rev().map(Into::into).collect())
    }

    async fn mark_processed(&self, message_id: &str, intent: Option<Intent>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE messages
            SET processed = TRUE,
                intent_detected = COALESCE($2, intent_detected),
                updated_at = NOW()
            WHERE provider_message_id = $1
            "#,
        )
        .bind(message_id)
        .bind(intent.map(|i| i.as_str()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_auto_response_sent(&self, message_id: &str) -> Result<()> {
        sqlx::query("UPDATE messages SET auto_response_sent = TRUE, updated_at = NOW() WHERE provider_message_id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_stats(&self, days: i64) -> Result<Vec<DailyStats>> {
        let rows: Vec<PgDailyStatsRow> = sqlx::query_as(DAILY_STATS)
            .bind(interval_days(days))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_unprocessed(&self, limit: i64) -> Result<Vec<StoredMessage>> {
        let rows: Vec<PgMessageRow> =
            sqlx::query_as("SELECT * FROM messages WHERE processed = FALSE ORDER BY timestamp ASC LIMIT $1")
                .bind(limit.max(0))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_by_phone(&self, phone: &str, limit: i64) -> Result<Vec<StoredMessage>> {
        let rows: Vec<PgMessageRow> =
            sqlx::query_as("SELECT * FROM messages WHERE from_number = $1 ORDER BY timestamp DESC LIMIT $2")
                .bind(phone)
                .bind(limit.max(0))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn purge_older_than(&self, days: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE timestamp < NOW() - make_interval(days => $1)")
            .bind(interval_days(days))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
