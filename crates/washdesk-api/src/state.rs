use std::sync::Arc;
use std::time::Duration;

use washdesk_assistant::{AutoResponder, GupshupBotDetector, IntentClassifier};
use washdesk_persist::{MessageStore, StoreBuilder};
use washdesk_providers::{GupshupClient, GupshupConfig, ProviderFactory, TwilioClient, TwilioConfig};

use crate::config::Config;
use crate::middleware::rate_limit::{FixedWindowLimiter, RateLimiter};
use crate::middleware::webhook::WebhookValidator;

/// Shared application state passed to all handlers
///
/// Provider clients are optional: routes that need a missing one answer
/// with a configuration error instead of failing at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn MessageStore>,
    pub responder: Arc<AutoResponder>,
    pub gupshup: Option<Arc<GupshupClient>>,
    pub twilio: Option<Arc<TwilioClient>>,
    pub validator: Arc<WebhookValidator>,
    pub webhook_limiter: Arc<dyn RateLimiter>,
    pub relay_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn MessageStore>,
        gupshup: Option<GupshupClient>,
        twilio: Option<TwilioClient>,
    ) -> Self {
        let mut responder = AutoResponder::new(store.clone()).auto_responses(config.assistant.auto_responses);
        if let Some(client) = &gupshup {
            responder = responder.with_sender(Arc::new(client.clone()));
            if let Some(bot_id) = config.gupshup.bot_id.as_deref().filter(|id| !id.is_empty()) {
                let detector = GupshupBotDetector::new(client.clone(), bot_id);
                responder = responder.with_classifier(IntentClassifier::new().with_remote(Arc::new(detector)));
            }
        }

        let webhook_limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowLimiter::new(
            config.webhook.rate_limit_max,
            Duration::from_secs(config.webhook.rate_limit_window_secs),
        ));
        let relay_limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowLimiter::new(
            config.webhook.relay_rate_limit_max,
            Duration::from_secs(config.webhook.relay_rate_limit_window_secs),
        ));

        Self {
            validator: Arc::new(WebhookValidator::from_config(&config)),
            config: Arc::new(config),
            store,
            responder: Arc::new(responder),
            gupshup: gupshup.map(Arc::new),
            twilio: twilio.map(Arc::new),
            webhook_limiter,
            relay_limiter,
        }
    }

    /// Connect the configured store and build provider clients
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let mut builder = StoreBuilder::new()
            .backend(config.database.backend)
            .database(&config.database.database)
            .max_connections(config.database.max_connections)
            .connect_timeout(Duration::from_millis(config.database.timeout_ms));
        if let Some(url) = &config.secrets.database_url {
            builder = builder.url(url);
        }
        let store = builder.build().await?;
        tracing::info!(backend = store.backend(), "message store ready");

        let gupshup = match &config.secrets.gupshup_api_key {
            Some(api_key) => {
                let mut settings = GupshupConfig::new(
                    api_key,
                    &config.gupshup.source_number,
                    &config.gupshup.app_name,
                );
                if let Some(api_url) = &config.gupshup.api_url {
                    settings = settings.with_api_url(api_url);
                }
                match ProviderFactory::create_gupshup(settings) {
                    Ok(client) => Some(client),
                    Err(e) => {
                        tracing::warn!("Failed to create Gupshup client: {:#}", e);
                        None
                    }
                }
            }
            None => None,
        };

        let twilio = match (&config.secrets.twilio_account_sid, &config.secrets.twilio_auth_token) {
            (Some(sid), Some(token)) => {
                let mut settings = TwilioConfig::new(sid, token, &config.twilio.whatsapp_number);
                if let Some(api_url) = &config.twilio.api_url {
                    settings = settings.with_api_url(api_url);
                }
                match ProviderFactory::create_twilio(settings) {
                    Ok(client) => Some(client),
                    Err(e) => {
                        tracing::warn!("Failed to create Twilio client: {:#}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(Self::new(config, store, gupshup, twilio))
    }
}
