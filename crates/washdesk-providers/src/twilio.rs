// Twilio WhatsApp API client

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::{ProviderKind, SendReceipt, WhatsAppSender};

pub const DEFAULT_API_URL: &str = "https://api.twilio.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Twilio client (HTTP direct, no SDK)
///
/// - URL: {base}/2010-04-01/Accounts/{sid}/...
/// - Auth: HTTP basic with account SID and auth token
/// - WhatsApp numbers carry a `whatsapp:` prefix
#[derive(Debug, Clone)]
pub struct TwilioClient {
    http_client: reqwest::Client,
    api_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

/// An outbound message with optional media
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwilioMessage {
    pub to: String,
    #[serde(default)]
    pub from: Option<String>,
    pub body: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwilioAccount {
    pub sid: String,
    pub friendly_name: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    sid: String,
    #[serde(default)]
    friendly_name: String,
    #[serde(default)]
    status: String,
}

/// Prefix a number with `whatsapp:` unless it already has it
pub fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{}", number)
    }
}

impl TwilioClient {
    pub fn builder() -> TwilioClientBuilder {
        TwilioClientBuilder::default()
    }

    pub fn from_number(&self) -> &str {
        &self.from_number
    }

    fn account_url(&self, suffix: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}{}",
            self.api_url.trim_end_matches('/'),
            self.account_sid,
            suffix
        )
    }

    /// Create a message, attaching every media URL as a repeated `MediaUrl`
    pub async fn send(&self, message: &TwilioMessage) -> Result<SendReceipt> {
        let from = whatsapp_address(message.from.as_deref().unwrap_or(&self.from_number));
        let to = whatsapp_address(&message.to);

        let mut form: Vec<(&str, &str)> = vec![
            ("From", from.as_str()),
            ("To", to.as_str()),
            ("Body", message.body.as_str()),
        ];
        for media_url in &message.media_urls {
            form.push(("MediaUrl", media_url.as_str()));
        }

        let response = self
            .http_client
            .post(self.account_url("/Messages.json"))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Twilio API error ({}): {}", status, error_text);
        }

        let raw: Value = response.json().await.context("Failed to parse response")?;
        let sid = raw.get("sid").and_then(Value::as_str).map(str::to_string);
        let message_status = raw.get("status").and_then(Value::as_str).map(str::to_string);

        tracing::info!(
            to = %to,
            sid = sid.as_deref().unwrap_or(""),
            media = message.media_urls.len(),
            "twilio message created"
        );

        Ok(SendReceipt {
            message_id: sid,
            status: message_status,
            raw,
        })
    }

    /// Look up the configured account, used to verify credentials
    pub async fn fetch_account(&self) -> Result<TwilioAccount> {
        let response = self
            .http_client
            .get(self.account_url(".json"))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Twilio API error ({}): {}", status, error_text);
        }

        let account: AccountResponse = response.json().await.context("Failed to parse response")?;
        Ok(TwilioAccount {
            sid: account.sid,
            friendly_name: account.friendly_name,
            status: account.status,
        })
    }
}

#[async_trait]
impl WhatsAppSender for TwilioClient {
    async fn send_message(&self, to: &str, body: &str) -> Result<SendReceipt> {
        let message = TwilioMessage {
            to: to.to_string(),
            from: None,
            body: body.to_string(),
            media_urls: Vec::new(),
        };
        self.send(&message).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Twilio
    }
}

#[derive(Default)]
pub struct TwilioClientBuilder {
    account_sid: Option<String>,
    auth_token: Option<String>,
    api_url: Option<String>,
    from_number: Option<String>,
}

impl TwilioClientBuilder {
    pub fn account_sid(mut self, sid: impl Into<String>) -> Self {
        self.account_sid = Some(sid.into());
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn from_number(mut self, number: impl Into<String>) -> Self {
        self.from_number = Some(number.into());
        self
    }

    pub fn build(self) -> Result<TwilioClient> {
        let account_sid = self
            .account_sid
            .filter(|sid| !sid.is_empty())
            .context("Account SID is required")?;
        let auth_token = self
            .auth_token
            .filter(|token| !token.is_empty())
            .context("Auth token is required")?;

        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(TwilioClient {
            http_client,
            api_url: self.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            account_sid,
            auth_token,
            from_number: self.from_number.unwrap_or_else(|| "whatsapp:+14155238886".to_string()),
        })
    }
}
