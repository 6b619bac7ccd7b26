// Gupshup WhatsApp Business API client

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::traits::{ProviderKind, SendReceipt, WhatsAppSender};

pub const DEFAULT_API_URL: &str = "https://api.gupshup.io";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const BOT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Gupshup client (HTTP direct, no SDK)
///
/// Messages go to `POST {base}/sm/api/v1/msg` as a form with the message
/// itself JSON-encoded in the `message` field. Auth is an `apikey` header.
#[derive(Debug, Clone)]
pub struct GupshupClient {
    http_client: reqwest::Client,
    api_url: String,
    source_number: String,
    app_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MsgResponse {
    message_id: Option<String>,
    status: Option<String>,
}

/// Body of the `message` form field. Field order is kept stable on the wire.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OutboundMessage<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        original_url: &'a str,
        preview_url: &'a str,
        caption: &'a str,
    },
}

/// Strip the leading `+`; Gupshup wants bare digits with country code
pub fn clean_number(number: &str) -> &str {
    number.trim().trim_start_matches('+')
}

impl GupshupClient {
    pub fn builder() -> GupshupClientBuilder {
        GupshupClientBuilder::default()
    }

    pub fn source_number(&self) -> &str {
        &self.source_number
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }

    async fn post_message(
        &self,
        to: &str,
        recipient_name: &str,
        message: OutboundMessage<'_>,
    ) -> Result<SendReceipt> {
        let destination = clean_number(to);
        let encoded = serde_json::to_string(&message)?;
        let form = [
            ("channel", "whatsapp"),
            ("source", self.source_number.as_str()),
            ("destination", destination),
            ("src.name", self.app_name.as_str()),
            ("destination.name", recipient_name),
            ("message", encoded.as_str()),
        ];

        let response = self
            .http_client
            .post(self.url("/sm/api/v1/msg"))
            .form(&form)
            .timeout(SEND_TIMEOUT)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gupshup API error ({}): {}", status, error_text);
        }

        let raw: Value = response.json().await.context("Failed to parse response")?;
        let parsed: MsgResponse = serde_json::from_value(raw.clone()).context("Unexpected Gupshup response shape")?;

        tracing::info!(
            to = %destination,
            message_id = parsed.message_id.as_deref().unwrap_or(""),
            status = parsed.status.as_deref().unwrap_or(""),
            "gupshup message accepted"
        );

        Ok(SendReceipt {
            message_id: parsed.message_id,
            status: parsed.status,
            raw,
        })
    }

    /// Send a plain text message
    pub async fn send_text(&self, to: &str, recipient_name: &str, text: &str) -> Result<SendReceipt> {
        self.post_message(to, recipient_name, OutboundMessage::Text { text })
            .await
    }

    /// Send an image by URL with a caption
    pub async fn send_image(
        &self,
        to: &str,
        recipient_name: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<SendReceipt> {
        let message = OutboundMessage::Image {
            original_url: image_url,
            preview_url: image_url,
            caption,
        };
        self.post_message(to, recipient_name, message).await
    }

    /// Ask a configured Gupshup bot to label a message
    ///
    /// Returns the raw intent label, or `None` when the bot has no answer.
    pub async fn query_intent(&self, bot_id: &str, query: &str) -> Result<Option<String>> {
        let session_id = format!("intent_detection_{}", chrono::Utc::now().timestamp_millis());
        let response = self
            .http_client
            .post(self.url("/sm/api/v1/bot/query"))
            .json(&json!({
                "query": query,
                "sessionId": session_id,
                "botId": bot_id,
            }))
            .timeout(BOT_QUERY_TIMEOUT)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Gupshup bot query error ({})", status);
        }

        let body: Value = response.json().await.context("Failed to parse response")?;
        Ok(body
            .get("intent")
            .and_then(Value::as_str)
            .filter(|intent| !intent.is_empty())
            .map(str::to_string))
    }
}

#[async_trait]
impl WhatsAppSender for GupshupClient {
    async fn send_message(&self, to: &str, body: &str) -> Result<SendReceipt> {
        self.send_text(to, "Cliente", body).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gupshup
    }
}

#[derive(Default)]
pub struct GupshupClientBuilder {
    api_key: Option<String>,
    api_url: Option<String>,
    source_number: Option<String>,
    app_name: Option<String>,
}

impl GupshupClientBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn source_number(mut self, number: impl Into<String>) -> Self {
        self.source_number = Some(number.into());
        self
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<GupshupClient> {
        let api_key = self
            .api_key
            .filter(|key| !key.is_empty())
            .context("API key is required")?;
        let source_number = self.source_number.context("Source number is required")?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&api_key).context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(GupshupClient {
            http_client,
            api_url: self.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            source_number: clean_number(&source_number).to_string(),
            app_name: self.app_name.unwrap_or_else(|| "ReclamosLavanderia".to_string()),
        })
    }
}
