use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;
use washdesk_api::{build_router, config::Config, state::AppState};
use washdesk_persist::{MemoryMessageStore, MessageStore};
use washdesk_providers::GupshupClient;
use washdesk_types::{InboundMessage, MessageKind};

fn state_with(config: Config, gupshup: Option<GupshupClient>) -> (Arc<AppState>, Arc<dyn MessageStore>) {
    let store: Arc<dyn MessageStore> = Arc::new(MemoryMessageStore::new());
    let state = Arc::new(AppState::new(config, store.clone(), gupshup, None));
    (state, store)
}

fn router(config: Config) -> (Router, Arc<dyn MessageStore>) {
    let (state, store) = state_with(config, None);
    (build_router(state), store)
}

fn gupshup(base: &str) -> GupshupClient {
    GupshupClient::builder()
        .api_key("test-key")
        .api_url(base)
        .source_number("56958292939")
        .build()
        .unwrap()
}

fn message_webhook(id: &str, text: &str) -> Value {
    json!({
        "app": "ReclamosLavanderia",
        "timestamp": Utc::now().timestamp_millis(),
        "version": 2,
        "type": "message",
        "payload": {
            "id": id,
            "source": "56911111111",
            "type": "text",
            "payload": { "text": text },
            "sender": { "phone": "56911111111", "name": "Ana", "country_code": "56" }
        }
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_backend() {
    let (app, _) = router(Config::default());
    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["features"]["database_backend"], "memory");
    assert_eq!(body["features"]["gupshup_configured"], false);
}

#[tokio::test]
async fn test_unknown_route_lists_endpoints() {
    let (app, _) = router(Config::default());
    let response = app.oneshot(get("/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["path"], "/nope");
    assert_eq!(body["available_endpoints"]["webhook"], "POST /webhook/gupshup");
}

#[tokio::test]
async fn test_webhook_rejects_get_and_non_json() {
    let (app, _) = router(Config::default());

    let response = app.clone().oneshot(get("/webhook/gupshup")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(response).await["allowed"], json!(["POST"]));

    let request = Request::builder()
        .method("POST")
        .uri("/webhook/gupshup")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hola"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["received"], "text/plain");
}

#[tokio::test]
async fn test_webhook_lists_missing_fields() {
    let (app, _) = router(Config::default());
    let response = app
        .oneshot(post_json("/webhook/gupshup", &json!({ "app": "ReclamosLavanderia" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["missing"], json!(["timestamp", "type"]));
}

#[tokio::test]
async fn test_message_is_stored_classified_and_deduplicated() {
    let (app, store) = router(Config::default());
    let webhook = message_webhook("gs-1", "La máquina no acepta mis monedas");

    let response = app.clone().oneshot(post_json("/webhook/gupshup", &webhook)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "received");
    assert_eq!(body["messageId"], "gs-1");
    assert_eq!(body["intent"], "coin_problem");
    // no provider configured, so nothing went out
    assert_eq!(body["autoResponseSent"], false);

    let response = app.clone().oneshot(post_json("/webhook/gupshup", &webhook)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "duplicate");

    let stored = store.get_message("gs-1").await.unwrap().unwrap();
    assert!(stored.processed);

    let response = app
        .oneshot(get("/admin/conversations/conv_56911111111?limit=10"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["messages"][0]["content"], "La máquina no acepta mis monedas");
}

#[tokio::test]
async fn test_auto_response_goes_out_through_gupshup() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sm/api/v1/msg")
        .match_header("apikey", "test-key")
        .match_body(mockito::Matcher::UrlEncoded("destination".into(), "56911111111".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"submitted","messageId":"gs-out"}"#)
        .create_async()
        .await;

    let (state, store) = state_with(Config::default(), Some(gupshup(&server.url())));
    let app = build_router(state);

    let response = app
        .oneshot(post_json("/webhook/gupshup", &message_webhook("gs-2", "¿Cuál es el precio?")))
        .await
        .unwrap();
    let body = json_body(response).await;

    mock.assert_async().await;
    assert_eq!(body["intent"], "pricing");
    assert_eq!(body["autoResponseSent"], true);
    assert!(store.get_message("gs-2").await.unwrap().unwrap().auto_response_sent);
}

#[tokio::test]
async fn test_provider_failure_still_answers_200() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sm/api/v1/msg")
        .with_status(500)
        .create_async()
        .await;

    let (state, _) = state_with(Config::default(), Some(gupshup(&server.url())));
    let response = build_router(state)
        .oneshot(post_json("/webhook/gupshup", &message_webhook("gs-3", "necesito un agente")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "received");
    assert_eq!(body["escalated"], true);
    assert_eq!(body["autoResponseSent"], false);
}

#[tokio::test]
async fn test_signature_is_enforced_when_secret_set() {
    let mut config = Config::default();
    config.secrets.gupshup_webhook_secret = Some("s3cret".to_string());
    let (app, _) = router(config);

    let body = serde_json::to_vec(&message_webhook("gs-4", "hola")).unwrap();
    let mut mac = Hmac::<Sha256>::new_from_slice(b"s3cret").unwrap();
    mac.update(&body);
    let signature = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));

    let mut tampered = body.clone();
    tampered.extend_from_slice(b" ");
    let request = Request::builder()
        .method("POST")
        .uri("/webhook/gupshup")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-gupshup-signature", &signature)
        .body(Body::from(tampered))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/webhook/gupshup")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-gupshup-signature", &signature)
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhooks_are_rate_limited_per_ip() {
    let mut config = Config::default();
    config.webhook.rate_limit_max = 1;
    let (app, _) = router(config);

    let event = json!({ "app": "ReclamosLavanderia", "timestamp": 1, "type": "message-event", "payload": {} });
    let request = |ip: &str| {
        Request::builder()
            .method("POST")
            .uri("/webhook/gupshup/events")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(serde_json::to_vec(&event).unwrap()))
            .unwrap()
    };

    let response = app.clone().oneshot(request("203.0.113.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "event_received");

    let response = app.clone().oneshot(request("203.0.113.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(json_body(response).await["retryAfter"].as_u64().unwrap() >= 1);

    let response = app.oneshot(request("203.0.113.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_send_gupshup_validates_and_relays() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sm/api/v1/msg")
        .match_body(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("destination".into(), "56958292939".into()),
            mockito::Matcher::UrlEncoded("destination.name".into(), "Ana Pérez".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"submitted","messageId":"gs-relay"}"#)
        .create_async()
        .await;
    let (state, _) = state_with(Config::default(), Some(gupshup(&server.url())));
    let app = build_router(state);

    let invalid = json!({ "formData": { "nombre": "A", "email": "no-es-email" } });
    let response = app.clone().oneshot(post_json("/send-gupshup", &invalid)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["details"].as_array().unwrap().len() >= 3);

    let valid = json!({
        "formData": {
            "nombre": " Ana Pérez ",
            "email": "ana@example.cl",
            "telefono": "912345678",
            "tipoProblema": "monedas",
            "descripcion": "La máquina 3 se tragó mis monedas"
        },
        "archivos": {
            "foto1": { "uri": "file:///a.jpg", "type": "image/jpeg", "name": "a.jpg" }
        }
    });
    let response = app.oneshot(post_json("/send-gupshup", &valid)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    mock.assert_async().await;
    assert_eq!(body["success"], true);
    assert_eq!(body["messageId"], "gs-relay");
}

#[tokio::test]
async fn test_send_routes_need_a_provider() {
    let (app, _) = router(Config::default());

    let valid = json!({
        "formData": {
            "nombre": "Ana",
            "email": "ana@example.cl",
            "telefono": "912345678",
            "tipoProblema": "otro",
            "descripcion": "No hay jabón en el dispensador"
        }
    });
    let response = app.clone().oneshot(post_json("/send-gupshup", &valid)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .oneshot(post_json("/send-whatsapp", &json!({ "to": "+56911111111", "body": "hola" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "Twilio is not configured");
}

#[tokio::test]
async fn test_twilio_webhook_answers_with_twiml() {
    let (app, store) = router(Config::default());
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("From=whatsapp%3A%2B56933333333&Body=hola&MessageSid=SM1&ProfileName=Luis"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/xml");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let xml = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(xml.contains("<Response><Message>Gracias por tu mensaje."));

    let stored = store.get_message("SM1").await.unwrap().unwrap();
    assert_eq!(stored.sender_name, "Luis");
    assert!(stored.auto_response_sent);
}

#[tokio::test]
async fn test_dashboard_counts_pending_messages() {
    let (app, store) = router(Config::default());
    app.clone()
        .oneshot(post_json("/webhook/gupshup", &message_webhook("gs-5", "horario del domingo")))
        .await
        .unwrap();

    // stored directly, so never processed
    let now = Utc::now();
    store
        .save_message(InboundMessage {
            message_id: "gs-6".to_string(),
            from_number: "56922222222".to_string(),
            to_number: "56958292939".to_string(),
            kind: MessageKind::Text,
            content: "sin procesar".to_string(),
            media_url: None,
            caption: String::new(),
            sender_name: "Luis".to_string(),
            sender_phone: "56922222222".to_string(),
            country_code: "56".to_string(),
            conversation_id: "conv_56922222222".to_string(),
            session_id: None,
            timestamp: now,
            received_at: now,
            metadata: json!({}),
        })
        .await
        .unwrap();

    let response = app.oneshot(get("/admin/dashboard?days=7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["period_days"], 7);
    assert_eq!(body["summary"]["total_messages"], 2);
    assert_eq!(body["summary"]["pending_messages"], 1);
    assert_eq!(body["summary"]["automation_rate"], "0%");
    assert_eq!(body["recent_unprocessed"][0]["message_id"], "gs-6");
}

#[tokio::test]
async fn test_echo_webhook_is_disabled_in_production() {
    let (app, _) = router(Config::default());
    let response = app.oneshot(post_json("/test/webhook", &json!({ "ping": 1 }))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["body"]["ping"], 1);

    let mut config = Config::default();
    config.environment = "production".to_string();
    let (app, _) = router(config);
    let response = app.oneshot(post_json("/test/webhook", &json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let (app, _) = router(Config::default());
    let response = app.oneshot(get("/api-docs/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/webhook/gupshup"]["post"].is_object());
    assert!(body["paths"]["/admin/dashboard"]["get"].is_object());
}

fn multipart(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "washdesk-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_describes_image() {
    let (app, _) = router(Config::default());
    let response = app
        .oneshot(multipart("file", "maquina.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF, 0xE0]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["file"]["name"], "maquina.jpg");
    assert_eq!(body["file"]["size"], 4);
    assert_eq!(body["file"]["mimetype"], "image/jpeg");
}

#[tokio::test]
async fn test_upload_rejects_missing_file_and_non_images() {
    let (app, _) = router(Config::default());
    let response = app
        .clone()
        .oneshot(multipart("photo", "a.jpg", "image/jpeg", b"x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid request: No file provided");

    let response = app
        .oneshot(multipart("file", "notes.pdf", "application/pdf", b"%PDF"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_enforces_size_limit() {
    let (app, _) = router(Config::default());
    let data = vec![0u8; 5 * 1024 * 1024 + 1];
    let response = app
        .oneshot(multipart("file", "big.png", "image/png", &data))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "File too large");
    assert_eq!(body["maxSize"], "5MB");
}
