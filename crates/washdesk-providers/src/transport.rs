// Complaint delivery with ordered fallbacks: relay, direct provider, deep link

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};
use washdesk_types::{Attachments, ComplaintForm};

use crate::deep_link::whatsapp_deep_link;
use crate::traits::WhatsAppSender;

const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Which stage of the chain delivered the complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryRoute {
    Relay,
    Direct,
    DeepLink,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub route: DeliveryRoute,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

/// Sends complaints to the support number
///
/// Stages are tried in order and each failure is logged and swallowed. The
/// last stage only builds a `wa.me` link, so a submission always yields an
/// outcome.
pub struct ComplaintTransport {
    http_client: reqwest::Client,
    relay_url: Option<String>,
    sender: Option<Arc<dyn WhatsAppSender>>,
    target_number: String,
}

impl ComplaintTransport {
    pub fn new(target_number: impl Into<String>) -> Result<Self> {
        let target_number = target_number.into();
        // Fail early rather than at the last fallback
        whatsapp_deep_link(&target_number, "").context("Invalid target number")?;

        let http_client = reqwest::Client::builder()
            .timeout(RELAY_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            relay_url: None,
            sender: None,
            target_number,
        })
    }

    pub fn with_relay(mut self, relay_url: impl Into<String>) -> Self {
        self.relay_url = Some(relay_url.into());
        self
    }

    pub fn with_sender(mut self, sender: Arc<dyn WhatsAppSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    fn via(&self) -> &'static str {
        match &self.sender {
            Some(sender) => sender.kind().display_name(),
            None => "WhatsApp Web",
        }
    }

    pub async fn submit(&self, form: &ComplaintForm, attachments: &Attachments) -> SubmissionOutcome {
        if let Some(relay_url) = &self.relay_url {
            match self.send_via_relay(relay_url, form, attachments).await {
                Ok(outcome) => return outcome,
                Err(e) => tracing::warn!(error = %e, "relay delivery failed, trying provider API"),
            }
        }

        let message = form.render_message(attachments, self.via(), Local::now().fixed_offset());

        if let Some(sender) = &self.sender {
            match sender.send_message(&self.target_number, &message).await {
                Ok(receipt) => {
                    return SubmissionOutcome {
                        route: DeliveryRoute::Direct,
                        message_id: receipt
                            .message_id
                            .unwrap_or_else(|| format!("{}-direct", sender.kind().as_str())),
                        fallback_url: None,
                        response: Some(receipt.raw),
                    };
                }
                Err(e) => tracing::warn!(
                    provider = sender.kind().as_str(),
                    error = %e,
                    "direct delivery failed, falling back to deep link"
                ),
            }
        }

        let fallback_url = match whatsapp_deep_link(&self.target_number, &message) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::error!(error = %e, "could not build deep link");
                None
            }
        };
        SubmissionOutcome {
            route: DeliveryRoute::DeepLink,
            message_id: "fallback-web".to_string(),
            fallback_url,
            response: None,
        }
    }

    async fn send_via_relay(
        &self,
        relay_url: &str,
        form: &ComplaintForm,
        attachments: &Attachments,
    ) -> Result<SubmissionOutcome> {
        let url = format!("{}/send-gupshup", relay_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(url)
            .json(&json!({ "formData": form, "archivos": attachments }))
            .send()
            .await
            .context("Failed to reach relay")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Relay error ({})", status);
        }

        let body: Value = response.json().await.context("Failed to parse relay response")?;
        let message_id = body
            .get("messageId")
            .and_then(Value::as_str)
            .unwrap_or("backend-success")
            .to_string();

        Ok(SubmissionOutcome {
            route: DeliveryRoute::Relay,
            message_id,
            fallback_url: None,
            response: Some(body),
        })
    }
}
