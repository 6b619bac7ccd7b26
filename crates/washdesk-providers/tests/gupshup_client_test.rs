use mockito::Matcher;
use washdesk_providers::{GupshupClient, ProviderKind, WhatsAppSender};

fn client(base: &str) -> GupshupClient {
    GupshupClient::builder()
        .api_key("test-key")
        .api_url(base)
        .source_number("+56958292939")
        .app_name("ReclamosLavanderia")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_send_text_posts_form_with_apikey() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sm/api/v1/msg")
        .match_header("apikey", "test-key")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("channel".into(), "whatsapp".into()),
            Matcher::UrlEncoded("source".into(), "56958292939".into()),
            Matcher::UrlEncoded("destination".into(), "56911111111".into()),
            Matcher::UrlEncoded("src.name".into(), "ReclamosLavanderia".into()),
            Matcher::UrlEncoded("destination.name".into(), "Cliente".into()),
            Matcher::UrlEncoded("message".into(), r#"{"type":"text","text":"Hola!"}"#.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"submitted","messageId":"gs-123"}"#)
        .create_async()
        .await;

    let gupshup = client(&server.url());
    let receipt = gupshup.send_message("+56911111111", "Hola!").await.unwrap();

    mock.assert_async().await;
    assert_eq!(gupshup.kind(), ProviderKind::Gupshup);
    assert_eq!(receipt.message_id.as_deref(), Some("gs-123"));
    assert_eq!(receipt.status.as_deref(), Some("submitted"));
}

#[tokio::test]
async fn test_send_image_encodes_media_message() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sm/api/v1/msg")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("destination.name".into(), "Ana".into()),
            Matcher::Regex("originalUrl".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"status":"submitted","messageId":"gs-img"}"#)
        .create_async()
        .await;

    let receipt = client(&server.url())
        .send_image("56911111111", "Ana", "https://cdn.example.com/foto.jpg", "Máquina 4")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(receipt.message_id.as_deref(), Some("gs-img"));
}

#[tokio::test]
async fn test_send_surfaces_provider_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sm/api/v1/msg")
        .with_status(401)
        .with_body(r#"{"status":"error","message":"Authentication Failed"}"#)
        .create_async()
        .await;

    let err = client(&server.url()).send_message("56911111111", "hola").await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_query_intent() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sm/api/v1/bot/query")
        .match_header("apikey", "test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "query": "la máquina no funciona",
            "botId": "bot-1"
        })))
        .with_status(200)
        .with_body(r#"{"intent":"problema_maquina"}"#)
        .create_async()
        .await;

    let intent = client(&server.url())
        .query_intent("bot-1", "la máquina no funciona")
        .await
        .unwrap();
    assert_eq!(intent.as_deref(), Some("problema_maquina"));
}
