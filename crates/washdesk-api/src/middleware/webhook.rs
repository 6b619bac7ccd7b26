//! Checks applied to provider webhooks before they reach a handler.
//!
//! Checks run in a fixed order and stop at the first rejection. The
//! user-agent, source address and payload age checks only log.

use axum::http::{header, HeaderMap, Method};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use std::net::IpAddr;
use std::time::Duration;
use washdesk_types::webhook::timestamp_millis;

use crate::config::Config;
use crate::error::{WebhookError, REQUIRED_FIELDS};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-gupshup-signature";

/// An IPv4 or IPv6 network in CIDR notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    network: IpAddr,
    prefix: u8,
}

impl Cidr {
    /// Parse `a.b.c.d/n`, `x::y/n`, or a bare address as a single host
    pub fn parse(value: &str) -> Option<Self> {
        let (address, prefix) = match value.trim().split_once('/') {
            Some((address, prefix)) => (address, Some(prefix.parse::<u8>().ok()?)),
            None => (value.trim(), None),
        };
        let network: IpAddr = address.parse().ok()?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        let prefix = prefix.unwrap_or(max);
        (prefix <= max).then_some(Self { network, prefix })
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix)).unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

/// Verify a hex HMAC-SHA256 of `body`, with or without a `sha256=` prefix
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);

    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// JavaScript-style truthiness, which is what the providers' own SDKs test
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

pub struct WebhookValidator {
    token: Option<String>,
    secret: Option<String>,
    app_name: Option<String>,
    max_age: Duration,
    allowed_networks: Vec<Cidr>,
    allowed_user_agents: Vec<String>,
    allow_private: bool,
}

impl WebhookValidator {
    pub fn from_config(config: &Config) -> Self {
        let allowed_networks = config
            .webhook
            .allowed_cidrs
            .iter()
            .filter_map(|cidr| {
                let parsed = Cidr::parse(cidr);
                if parsed.is_none() {
                    tracing::warn!(cidr = %cidr, "ignoring invalid CIDR range");
                }
                parsed
            })
            .collect();

        Self {
            token: config.secrets.gupshup_webhook_token.clone(),
            secret: config.secrets.gupshup_webhook_secret.clone(),
            app_name: config.webhook.app_name.clone().filter(|name| !name.is_empty()),
            max_age: Duration::from_secs(config.webhook.max_age_secs),
            allowed_networks,
            allowed_user_agents: config
                .webhook
                .allowed_user_agents
                .iter()
                .map(|agent| agent.to_lowercase())
                .collect(),
            allow_private: !config.is_production(),
        }
    }

    /// Run every check and return the parsed JSON object
    pub fn validate(
        &self,
        method: &Method,
        headers: &HeaderMap,
        body: &[u8],
        client_ip: &str,
    ) -> Result<Map<String, Value>, WebhookError> {
        if method != Method::POST {
            return Err(WebhookError::MethodNotAllowed);
        }

        let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
        if !content_type.is_some_and(|ct| ct.contains("application/json")) {
            return Err(WebhookError::UnsupportedContentType(content_type.map(str::to_string)));
        }

        if let Some(token) = &self.token {
            let expected = format!("Bearer {}", token);
            let provided = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
            if provided != Some(expected.as_str()) {
                tracing::warn!(client_ip, "invalid webhook token");
                return Err(WebhookError::InvalidToken);
            }
        }

        if let Some(secret) = &self.secret {
            let signature = headers
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or(WebhookError::MissingSignature)?;
            if !verify_signature(secret.as_bytes(), body, signature) {
                tracing::warn!(client_ip, "invalid webhook signature");
                return Err(WebhookError::InvalidSignature);
            }
        }

        if let Some(agent) = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()) {
            if !self.is_known_agent(agent) {
                tracing::warn!(user_agent = %agent, client_ip, "unexpected webhook user agent");
            }
        }

        if !self.is_allowed_ip(client_ip) {
            tracing::warn!(client_ip, "webhook from address outside the allowlist");
        }

        let payload = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(WebhookError::InvalidPayload(format!(
                    "expected a JSON object, got {}",
                    json_type(&other)
                )))
            }
            Err(e) => return Err(WebhookError::InvalidPayload(e.to_string())),
        };

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !truthy(payload.get(*field)))
            .collect();
        if !missing.is_empty() {
            return Err(WebhookError::MissingFields(missing));
        }

        if let Some(sent) = payload.get("timestamp").and_then(timestamp_millis) {
            let age_ms = Utc::now().timestamp_millis().saturating_sub(sent);
            if age_ms.unsigned_abs() > self.max_age.as_millis() as u64 {
                tracing::warn!(age_ms, client_ip, "webhook timestamp outside the tolerance window");
            }
        }

        if let Some(expected) = &self.app_name {
            let received = payload.get("app").and_then(Value::as_str).unwrap_or_default();
            if received != expected {
                return Err(WebhookError::WrongApp {
                    expected: expected.clone(),
                    received: received.to_string(),
                });
            }
        }

        Ok(payload)
    }

    fn is_known_agent(&self, agent: &str) -> bool {
        let agent = agent.to_lowercase();
        self.allowed_user_agents.iter().any(|known| agent.contains(known.as_str()))
    }

    fn is_allowed_ip(&self, client_ip: &str) -> bool {
        let Ok(ip) = client_ip.parse::<IpAddr>() else {
            return false;
        };
        if self.allow_private && is_local(ip) {
            return true;
        }
        self.allowed_networks.iter().any(|net| net.contains(ip))
    }
}

fn is_local(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private(),
        IpAddr::V6(v6) => v6.is_loopback(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extra checks for inbound message webhooks
///
/// A `message` webhook needs a payload `id`, `source` and `type`, and a
/// text message needs some text.
pub fn check_message_structure(payload: &Map<String, Value>) -> Result<(), WebhookError> {
    if payload.get("type").and_then(Value::as_str) != Some("message") {
        return Ok(());
    }
    let Some(message) = payload.get("payload").and_then(Value::as_object) else {
        return Ok(());
    };

    let missing: Vec<&'static str> = ["id", "source", "type"]
        .into_iter()
        .filter(|field| !truthy(message.get(*field)))
        .collect();
    if !missing.is_empty() {
        return Err(WebhookError::InvalidMessage(missing));
    }

    if message.get("type").and_then(Value::as_str) == Some("text") {
        let nested = message.get("payload").and_then(|p| p.get("text"));
        if !truthy(nested) && !truthy(message.get("text")) {
            return Err(WebhookError::EmptyText);
        }
    }

    Ok(())
}
