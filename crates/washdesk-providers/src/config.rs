// Configuration layer for provider-agnostic sender creation

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::gupshup::GupshupClient;
use crate::traits::{ProviderKind, WhatsAppSender};
use crate::twilio::TwilioClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GupshupConfig {
    pub api_key: String,
    pub source_number: String,
    pub app_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl GupshupConfig {
    pub fn new(
        api_key: impl Into<String>,
        source_number: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            source_number: source_number.into(),
            app_name: app_name.into(),
            api_url: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl TwilioConfig {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            api_url: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderDetails {
    Gupshup(GupshupConfig),
    Twilio(TwilioConfig),
}

/// Which provider to send through, with its credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub details: ProviderDetails,
}

impl ProviderConfig {
    pub fn gupshup(config: GupshupConfig) -> Self {
        Self {
            details: ProviderDetails::Gupshup(config),
        }
    }

    pub fn twilio(config: TwilioConfig) -> Self {
        Self {
            details: ProviderDetails::Twilio(config),
        }
    }

    pub fn provider_kind(&self) -> ProviderKind {
        match self.details {
            ProviderDetails::Gupshup(_) => ProviderKind::Gupshup,
            ProviderDetails::Twilio(_) => ProviderKind::Twilio,
        }
    }
}

/// Builds concrete clients from configuration
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_gupshup(config: GupshupConfig) -> Result<GupshupClient> {
        let mut builder = GupshupClient::builder()
            .api_key(config.api_key)
            .source_number(config.source_number)
            .app_name(config.app_name);
        if let Some(api_url) = config.api_url {
            builder = builder.api_url(api_url);
        }
        builder.build()
    }

    pub fn create_twilio(config: TwilioConfig) -> Result<TwilioClient> {
        let mut builder = TwilioClient::builder()
            .account_sid(config.account_sid)
            .auth_token(config.auth_token)
            .from_number(config.from_number);
        if let Some(api_url) = config.api_url {
            builder = builder.api_url(api_url);
        }
        builder.build()
    }

    /// Create the sender selected by `config`
    pub fn create_sender(config: ProviderConfig) -> Result<Arc<dyn WhatsAppSender>> {
        match config.details {
            ProviderDetails::Gupshup(gupshup) => Ok(Arc::new(Self::create_gupshup(gupshup)?)),
            ProviderDetails::Twilio(twilio) => Ok(Arc::new(Self::create_twilio(twilio)?)),
        }
    }
}
