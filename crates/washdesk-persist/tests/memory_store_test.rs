use chrono::{Duration, Utc};
use serde_json::json;
use washdesk_persist::{MemoryMessageStore, MessageStore};
use washdesk_types::{InboundMessage, Intent, MessageKind};

fn inbound(id: &str, from: &str, minutes_ago: i64, kind: MessageKind) -> InboundMessage {
    let timestamp = Utc::now() - Duration::minutes(minutes_ago);
    InboundMessage {
        message_id: id.to_string(),
        from_number: from.to_string(),
        to_number: "56958292939".to_string(),
        kind,
        content: format!("mensaje {id}"),
        media_url: None,
        caption: String::new(),
        sender_name: "Ana".to_string(),
        sender_phone: from.to_string(),
        country_code: "56".to_string(),
        conversation_id: format!("conv_{from}"),
        session_id: None,
        timestamp,
        received_at: timestamp,
        metadata: json!({ "app": "ReclamosLavanderia" }),
    }
}

#[tokio::test]
async fn test_save_is_idempotent_on_message_id() {
    let store = MemoryMessageStore::new();

    let first = store.save_message(inbound("wamid.1", "56911111111", 5, MessageKind::Text)).await.unwrap();
    let second = store.save_message(inbound("wamid.1", "56911111111", 5, MessageKind::Text)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(store.len().await, 1);
    assert!(store.exists("wamid.1").await.unwrap());
    assert!(!store.exists("wamid.2").await.unwrap());
}

#[tokio::test]
async fn test_conversation_returns_latest_oldest_first() {
    let store = MemoryMessageStore::new();
    for (id, minutes_ago) in [("a", 30), ("b", 20), ("c", 10)] {
        store.save_message(inbound(id, "56922222222", minutes_ago, MessageKind::Text)).await.unwrap();
    }
    store.save_message(inbound("other", "56933333333", 1, MessageKind::Text)).await.unwrap();

    let conversation = store.get_conversation("conv_56922222222", 2).await.unwrap();
    let ids: Vec<&str> = conversation.iter().map(|m| m.message_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
}

#[tokio::test]
async fn test_mark_processed_keeps_intent_and_unprocessed_listing() {
    let store = MemoryMessageStore::new();
    store.save_message(inbound("m1", "56911111111", 3, MessageKind::Text)).await.unwrap();
    store.save_message(inbound("m2", "56911111111", 2, MessageKind::Image)).await.unwrap();

    store.mark_processed("m1", Some(Intent::CoinProblem)).await.unwrap();
    store.mark_processed("m1", None).await.unwrap();

    let m1 = store.get_message("m1").await.unwrap().unwrap();
    assert!(m1.processed);
    assert_eq!(m1.intent, Some(Intent::CoinProblem));

    let pending = store.get_unprocessed(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].message_id, "m2");

    assert!(store.mark_auto_response_sent("missing").await.is_err());
}

#[tokio::test]
async fn test_stats_and_purge() {
    let store = MemoryMessageStore::new();
    store.save_message(inbound("t1", "56911111111", 1, MessageKind::Text)).await.unwrap();
    store.save_message(inbound("i1", "56922222222", 2, MessageKind::Image)).await.unwrap();
    store.save_message(inbound("old", "56911111111", 60 * 24 * 100, MessageKind::Text)).await.unwrap();
    store.mark_processed("t1", Some(Intent::Pricing)).await.unwrap();
    store.mark_auto_response_sent("t1").await.unwrap();

    let stats = store.get_stats(7).await.unwrap();
    let total: i64 = stats.iter().map(|d| d.total_messages).sum();
    let images: i64 = stats.iter().map(|d| d.image_messages).sum();
    let auto: i64 = stats.iter().map(|d| d.auto_responses).sum();
    assert_eq!(total, 2);
    assert_eq!(images, 1);
    assert_eq!(auto, 1);

    let removed = store.purge_older_than(90).await.unwrap();
    assert_eq!(removed, 1);
    assert!(store.get_message("old").await.unwrap().is_none());

    let by_phone = store.get_by_phone("56911111111", 10).await.unwrap();
    assert_eq!(by_phone.len(), 1);
}
