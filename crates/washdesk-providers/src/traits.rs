use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which WhatsApp Business API a sender talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gupshup,
    Twilio,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gupshup => "gupshup",
            ProviderKind::Twilio => "twilio",
        }
    }

    /// Footer used in forwarded complaint messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Gupshup => "Gupshup WhatsApp Business API",
            ProviderKind::Twilio => "Twilio WhatsApp API",
        }
    }
}

/// What the provider reported after accepting a message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendReceipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// Outbound WhatsApp text delivery
///
/// One implementation per provider. Callers only need a recipient and a
/// body; provider-specific options live on the concrete clients.
#[async_trait]
pub trait WhatsAppSender: Send + Sync {
    async fn send_message(&self, to: &str, body: &str) -> Result<SendReceipt>;

    fn kind(&self) -> ProviderKind;
}
