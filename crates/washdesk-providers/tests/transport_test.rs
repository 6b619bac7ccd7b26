use std::collections::BTreeMap;
use std::sync::Arc;

use mockito::Matcher;
use washdesk_providers::{ComplaintTransport, DeliveryRoute, GupshupClient};
use washdesk_types::{Attachment, Attachments, ComplaintForm};

fn form() -> ComplaintForm {
    ComplaintForm {
        name: "Ana Pérez".to_string(),
        email: "ana@example.com".to_string(),
        phone: "+56912345678".to_string(),
        problem_kind: "monedas".to_string(),
        description: "La máquina 3 no acepta monedas".to_string(),
        machine_number: Some("3".to_string()),
        ..Default::default()
    }
}

fn attachments() -> Attachments {
    let mut files = BTreeMap::new();
    files.insert(
        "foto1".to_string(),
        Attachment {
            uri: "file:///tmp/foto1.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            name: "foto1.jpg".to_string(),
        },
    );
    files
}

fn gupshup(base: &str) -> Arc<GupshupClient> {
    Arc::new(
        GupshupClient::builder()
            .api_key("k")
            .api_url(base)
            .source_number("56958292939")
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn test_relay_is_tried_first() {
    let mut relay = mockito::Server::new_async().await;
    let mock = relay
        .mock("POST", "/send-gupshup")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "formData": { "problemKind": "monedas" },
            "archivos": { "foto1": { "name": "foto1.jpg" } }
        })))
        .with_status(200)
        .with_body(r#"{"success":true,"messageId":"relay-1"}"#)
        .create_async()
        .await;

    let transport = ComplaintTransport::new("+56958292939").unwrap().with_relay(relay.url());
    let outcome = transport.submit(&form(), &attachments()).await;

    mock.assert_async().await;
    assert_eq!(outcome.route, DeliveryRoute::Relay);
    assert_eq!(outcome.message_id, "relay-1");
}

#[tokio::test]
async fn test_direct_provider_when_relay_fails() {
    let mut relay = mockito::Server::new_async().await;
    relay.mock("POST", "/send-gupshup").with_status(502).create_async().await;

    let mut provider = mockito::Server::new_async().await;
    let mock = provider
        .mock("POST", "/sm/api/v1/msg")
        .match_body(Matcher::UrlEncoded("destination".into(), "56958292939".into()))
        .with_status(200)
        .with_body(r#"{"status":"submitted","messageId":"gs-9"}"#)
        .create_async()
        .await;

    let transport = ComplaintTransport::new("+56958292939")
        .unwrap()
        .with_relay(relay.url())
        .with_sender(gupshup(&provider.url()));
    let outcome = transport.submit(&form(), &attachments()).await;

    mock.assert_async().await;
    assert_eq!(outcome.route, DeliveryRoute::Direct);
    assert_eq!(outcome.message_id, "gs-9");
}

#[tokio::test]
async fn test_deep_link_when_everything_fails() {
    let mut relay = mockito::Server::new_async().await;
    relay.mock("POST", "/send-gupshup").with_status(500).create_async().await;
    let mut provider = mockito::Server::new_async().await;
    provider.mock("POST", "/sm/api/v1/msg").with_status(500).create_async().await;

    let transport = ComplaintTransport::new("+56 9 5829 2939")
        .unwrap()
        .with_relay(relay.url())
        .with_sender(gupshup(&provider.url()));
    let outcome = transport.submit(&form(), &attachments()).await;

    assert_eq!(outcome.route, DeliveryRoute::DeepLink);
    let link = url::Url::parse(outcome.fallback_url.as_deref().unwrap()).unwrap();
    assert_eq!(link.host_str(), Some("wa.me"));
    assert_eq!(link.path(), "/56958292939");
    let text = link.query_pairs().find(|(k, _)| k == "text").unwrap().1.into_owned();
    assert!(text.contains("NUEVO RECLAMO"));
    assert!(text.contains("Problemas con monedas"));
    assert!(text.contains("foto1.jpg"));
}

#[test]
fn test_rejects_target_without_digits() {
    assert!(ComplaintTransport::new("soporte").is_err());
}
