use async_trait::async_trait;
use bson::{doc, Document};
use chrono::{Duration, Utc};
use futures::TryStreamExt;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use washdesk_types::{DailyStats, InboundMessage, Intent, StoredMessage};

use super::models::MongoMessageDoc;
use crate::error::{PersistError, Result};
use crate::store::MessageStore;

pub struct MongoMessageStore {
    client: Client,
    database: String,
    collection: Collection<MongoMessageDoc>,
}

fn bson_date(at: chrono::DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

impl MongoMessageStore {
    /// Connect to MongoDB and create the indexes the store relies on
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let collection = client.database(database).collection("messages");
        let store = Self {
            client,
            database: database.to_string(),
            collection,
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        let unique = IndexModel::builder()
            .keys(doc! { "message_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let indexes = vec![
            unique,
            IndexModel::builder().keys(doc! { "conversation_id": 1, "timestamp": -1 }).build(),
            IndexModel::builder().keys(doc! { "from_number": 1 }).build(),
            IndexModel::builder().keys(doc! { "processed": 1, "timestamp": 1 }).build(),
        ];
        self.collection.create_indexes(indexes).await?;
        tracing::info!(database = %self.database, "messages collection indexes verified");
        Ok(())
    }

    async fn find_sorted(&self, filter: Document, sort: Document, limit: i64) -> Result<Vec<StoredMessage>> {
        let docs: Vec<MongoMessageDoc> = self
            .collection
            .find(filter)
            .sort(sort)
            .limit(limit.max(0))
            .await?
            .try_collect()
            .await?;
        Ok(docs.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl MessageStore for MongoMessageStore {
    async fn save_message(&self, message: InboundMessage) -> Result<StoredMessage> {
        let now = Utc::now();
        let message_id = message.message_id.clone();

        let mut insert = bson::to_document(&MongoMessageDoc::from_inbound(message, now))?;
        // Updated on every delivery, so it cannot also sit in $setOnInsert
        insert.remove("updated_at");

        self.collection
            .update_one(
                doc! { "message_id": &message_id },
                doc! {
                    "$setOnInsert": insert,
                    "$set": { "updated_at": bson_date(now) },
                },
            )
            .upsert(true)
            .await?;

        self.collection
            .find_one(doc! { "message_id": &message_id })
            .await?
            .map(Into::into)
            .ok_or(PersistError::MessageNotFound(message_id))
    }

    async fn exists(&self, message_id: &str) -> Result<bool> {
        let count = self
            .collection
            .count_documents(doc! { "message_id": message_id })
            .await?;
        Ok(count > 0)
    }

    async fn get_message(&self, message_id: &str) -> Result<Option<StoredMessage>> {
        let found = self.collection.find_one(doc! { "message_id": message_id }).await?;
        Ok(found.map(Into::into))
    }

    async fn get_conversation(&self, conversation_id: &str, limit: i64) -> Result<Vec<StoredMessage>> {
        let mut messages = self
            .find_sorted(
                doc! { "conversation_id": conversation_id },
                doc! { "timestamp": -1, "_id": -1 },
                limit,
            )
            .await?;
        messages.reverse();
        Ok(messages)
    }

    async fn mark_processed(&self, message_id: &str, intent: Option<Intent>) -> Result<()> {
        let mut set = doc! { "processed": true, "updated_at": bson_date(Utc::now()) };
        if let Some(intent) = intent {
            set.insert("intent", intent.as_str());
        }
        self.collection
            .update_one(doc! { "message_id": message_id }, doc! { "$set": set })
            .await?;
        Ok(())
    }

    async fn mark_auto_response_sent(&self, message_id: &str) -> Result<()> {
        self.collection
            .update_one(
                doc! { "message_id": message_id },
                doc! { "$set": { "auto_response_sent": true, "updated_at": bson_date(Utc::now()) } },
            )
            .await?;
        Ok(())
    }

    async fn get_stats(&self, days: i64) -> Result<Vec<DailyStats>> {
        let since = Utc::now() - Duration::days(days);
        let docs: Vec<MongoMessageDoc> = self
            .collection
            .find(doc! { "timestamp": { "$gte": bson_date(since) } })
            .await?
            .try_collect()
            .await?;
        let messages: Vec<StoredMessage> = docs.into_iter().map(Into::into).collect();
        Ok(DailyStats::from_messages(&messages, since))
    }

    async fn get_unprocessed(&self, limit: i64) -> Result<Vec<StoredMessage>> {
        self.find_sorted(doc! { "processed": false }, doc! { "timestamp": 1 }, limit)
            .await
    }

    async fn get_by_phone(&self, phone: &str, limit: i64) -> Result<Vec<StoredMessage>> {
        self.find_sorted(doc! { "from_number": phone }, doc! { "timestamp": -1 }, limit)
            .await
    }

    async fn purge_older_than(&self, days: i64) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(days);
        let result = self
            .collection
            .delete_many(doc! { "timestamp": { "$lt": bson_date(cutoff) } })
            .await?;
        Ok(result.deleted_count)
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
