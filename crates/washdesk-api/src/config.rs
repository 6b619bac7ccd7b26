use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use washdesk_persist::StoreBackend;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deployment name, set from `ENV` on load (`dev`, `production`, ...)
    pub environment: String,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub gupshup: GupshupSettings,
    pub twilio: TwilioSettings,
    pub webhook: WebhookConfig,
    pub assistant: AssistantConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub database_url: Option<String>,
    pub gupshup_api_key: Option<String>,
    pub gupshup_webhook_token: Option<String>,
    pub gupshup_webhook_secret: Option<String>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// Database name, MongoDB only
    pub database: String,
    pub max_connections: u32,
    pub timeout_ms: u64,
    pub retention_days: i64,
    pub sweep_interval_hours: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database: "washdesk".to_string(),
            max_connections: 20,
            timeout_ms: 2000,
            retention_days: 90,
            sweep_interval_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GupshupSettings {
    pub app_name: String,
    /// Our WhatsApp Business number
    pub source_number: String,
    /// Support number complaints are relayed to
    pub target_number: String,
    pub api_url: Option<String>,
    /// Bot used for remote intent detection when set
    pub bot_id: Option<String>,
}

impl Default for GupshupSettings {
    fn default() -> Self {
        Self {
            app_name: "ReclamosLavanderia".to_string(),
            source_number: "56958292939".to_string(),
            target_number: "56958292939".to_string(),
            api_url: None,
            bot_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TwilioSettings {
    pub whatsapp_number: String,
    pub target_number: String,
    pub api_url: Option<String>,
}

impl Default for TwilioSettings {
    fn default() -> Self {
        Self {
            whatsapp_number: "whatsapp:+14155238886".to_string(),
            target_number: "whatsapp:+56958292939".to_string(),
            api_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Payloads older than this are logged, not rejected
    pub max_age_secs: u64,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub relay_rate_limit_max: u32,
    pub relay_rate_limit_window_secs: u64,
    /// Reject webhooks whose `app` differs, when set
    pub app_name: Option<String>,
    pub allowed_cidrs: Vec<String>,
    pub allowed_user_agents: Vec<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 300,
            rate_limit_max: 200,
            rate_limit_window_secs: 60,
            relay_rate_limit_max: 100,
            relay_rate_limit_window_secs: 15 * 60,
            app_name: None,
            allowed_cidrs: ["52.66.99.0/24", "13.232.0.0/16", "35.154.0.0/16", "52.66.0.0/16"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_user_agents: ["Gupshup", "GupshupBot", "WhatsApp", "curl", "PostmanRuntime"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub auto_responses: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self { auto_responses: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Problems found in a loaded configuration, reported at startup
#[derive(Debug, Default)]
pub struct ConfigReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (ENV defaults to `dev`)
    /// 3. `WASHDESK_<SECTION>__<KEY>` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("WASHDESK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.environment = env;
        cfg.secrets = Secrets::from_env();

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }

    pub fn gupshup_configured(&self) -> bool {
        self.secrets.gupshup_api_key.is_some()
            && !self.gupshup.app_name.is_empty()
            && !self.gupshup.source_number.is_empty()
            && !self.gupshup.target_number.is_empty()
    }

    pub fn twilio_configured(&self) -> bool {
        self.secrets.twilio_account_sid.is_some() && self.secrets.twilio_auth_token.is_some()
    }

    pub fn check(&self) -> ConfigReport {
        let mut report = ConfigReport::default();

        if self.secrets.gupshup_api_key.is_none() {
            report.errors.push("GUPSHUP_API_KEY is not set".to_string());
        }
        if self.database.backend != StoreBackend::Memory && self.secrets.database_url.is_none() {
            report
                .errors
                .push(format!("DATABASE_URL is required for the {} backend", self.database.backend));
        }
        if self.database.backend == StoreBackend::Memory {
            report
                .warnings
                .push("using the in-memory message store, messages are lost on restart".to_string());
        }
        if self.secrets.gupshup_webhook_token.is_none() {
            report
                .warnings
                .push("GUPSHUP_WEBHOOK_TOKEN is not set, webhook authentication is reduced".to_string());
        }
        if !self.twilio_configured() {
            report.warnings.push("Twilio credentials are not set, /send-whatsapp is disabled".to_string());
        }

        report
    }
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            database_url: secret("DATABASE_URL"),
            gupshup_api_key: secret("GUPSHUP_API_KEY"),
            gupshup_webhook_token: secret("GUPSHUP_WEBHOOK_TOKEN"),
            gupshup_webhook_secret: secret("GUPSHUP_WEBHOOK_SECRET"),
            twilio_account_sid: secret("TWILIO_ACCOUNT_SID"),
            twilio_auth_token: secret("TWILIO_AUTH_TOKEN"),
        }
    }
}

fn secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
