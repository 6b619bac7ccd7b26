use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use washdesk_providers::GupshupClient;
use washdesk_types::{Intent, StoredMessage};

/// Keyword table, in tie-break order. Keywords are matched as lowercase
/// substrings, so multi-word phrases and amounts like `$100` work as is.
pub const KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::CoinProblem,
        &[
            "moneda", "monedas", "no acepta", "rechaza", "devuelve", "dinero", "pago", "pagos", "lector",
            "efectivo", "$100", "$500", "peso", "pesos",
        ],
    ),
    (
        Intent::WashProblem,
        &[
            "lavado", "lavar", "ropa", "limpia", "limpio", "detergente", "jabón", "programa", "ciclo", "mancha",
            "manchas", "sucia", "sucio",
        ],
    ),
    (
        Intent::DryProblem,
        &[
            "secado", "secar", "seca", "humeda", "húmeda", "mojada", "mojado", "centrifugado", "centrifuga",
            "temperatura", "calor",
        ],
    ),
    (
        Intent::MachineProblem,
        &[
            "máquina", "maquina", "no funciona", "rota", "roto", "descompuesta", "error", "falla", "traba",
            "trabada", "pantalla", "display",
        ],
    ),
    (
        Intent::HumanEscalation,
        &[
            "agente", "persona", "humano", "operador", "ayuda", "hablar", "contactar", "urgente", "reclamo",
            "queja", "molesto", "enojado",
        ],
    ),
    (
        Intent::HoursLocation,
        &[
            "horario", "horarios", "abierto", "cerrado", "ubicación", "dirección", "donde", "dónde", "cuándo",
            "cuando", "hora", "tiempo",
        ],
    ),
    (
        Intent::Pricing,
        &[
            "precio", "precios", "costo", "cuesta", "tarifa", "valor", "cuánto", "cuanto", "promoción",
            "descuento", "oferta",
        ],
    ),
];

const MATCH_SCORE: f64 = 1.0;
const LEADING_BONUS: f64 = 0.5;
const CONTEXT_SCORE: f64 = 0.3;
/// How many trailing conversation messages feed the context score
pub const CONTEXT_WINDOW: usize = 3;

/// Source of intent labels other than the local keyword scan
#[async_trait]
pub trait RemoteIntentDetector: Send + Sync {
    /// A raw label, or `None` when the source has no opinion
    async fn detect(&self, text: &str) -> Result<Option<String>>;
}

/// Asks a Gupshup bot to label messages
pub struct GupshupBotDetector {
    client: GupshupClient,
    bot_id: String,
}

impl GupshupBotDetector {
    pub fn new(client: GupshupClient, bot_id: impl Into<String>) -> Self {
        Self {
            client,
            bot_id: bot_id.into(),
        }
    }
}

#[async_trait]
impl RemoteIntentDetector for GupshupBotDetector {
    async fn detect(&self, text: &str) -> Result<Option<String>> {
        self.client.query_intent(&self.bot_id, text).await
    }
}

/// Per-intent keyword scores for a message and its recent context
pub fn score(text: &str, context: &[StoredMessage]) -> Vec<(Intent, f64)> {
    let message = text.trim().to_lowercase();
    let recent = &context[context.len().saturating_sub(CONTEXT_WINDOW)..];
    let context_text = recent
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    KEYWORDS
        .iter()
        .map(|(intent, keywords)| {
            let mut total = 0.0;
            for keyword in keywords.iter() {
                if message.contains(keyword) {
                    total += MATCH_SCORE;
                    if message.starts_with(keyword) {
                        total += LEADING_BONUS;
                    }
                }
                if !context_text.is_empty() && context_text.contains(keyword) {
                    total += CONTEXT_SCORE;
                }
            }
            (*intent, total)
        })
        .collect()
}

/// Keyword-only classification. Highest score wins, earlier table entries
/// win ties, and nothing matched means [`Intent::GeneralInquiry`].
pub fn classify_local(text: &str, context: &[StoredMessage]) -> Intent {
    let mut best = (Intent::GeneralInquiry, 0.0);
    for (intent, total) in score(text, context) {
        if total > best.1 {
            best = (intent, total);
        }
    }
    best.0
}

#[derive(Clone, Default)]
pub struct IntentClassifier {
    remote: Option<Arc<dyn RemoteIntentDetector>>,
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteIntentDetector>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Classify a message, trying the remote detector first when configured
    pub async fn classify(&self, text: &str, context: &[StoredMessage]) -> Intent {
        if let Some(remote) = &self.remote {
            match remote.detect(text).await {
                Ok(Some(label)) if label != "unknown" => match label.parse::<Intent>() {
                    Ok(intent) => {
                        tracing::debug!(intent = %intent, "intent from remote detector");
                        return intent;
                    }
                    Err(e) => tracing::debug!(error = %e, "ignoring remote intent label"),
                },
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "remote intent detection failed"),
            }
        }

        let intent = classify_local(text, context);
        tracing::info!(intent = %intent, "intent detected locally");
        intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use washdesk_types::{InboundMessage, MessageKind};

    fn history(texts: &[&str]) -> Vec<StoredMessage> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let message = InboundMessage {
                    message_id: format!("m{}", i),
                    from_number: "56911111111".to_string(),
                    to_number: "56958292939".to_string(),
                    kind: MessageKind::Text,
                    content: text.to_string(),
                    media_url: None,
                    caption: String::new(),
                    sender_name: "Ana".to_string(),
                    sender_phone: "56911111111".to_string(),
                    country_code: "56".to_string(),
                    conversation_id: "conv_56911111111".to_string(),
                    session_id: None,
                    timestamp: Utc::now(),
                    received_at: Utc::now(),
                    metadata: serde_json::Value::Null,
                };
                StoredMessage::from_inbound(i.to_string(), message, Utc::now())
            })
            .collect()
    }

    fn score_of(scores: &[(Intent, f64)], intent: Intent) -> f64 {
        scores.iter().find(|(i, _)| *i == intent).map(|(_, s)| *s).unwrap_or_default()
    }

    #[test]
    fn test_empty_and_unmatched_text() {
        assert_eq!(classify_local("", &[]), Intent::GeneralInquiry);
        assert_eq!(classify_local("   ", &[]), Intent::GeneralInquiry);
        assert_eq!(classify_local("buenas tardes", &[]), Intent::GeneralInquiry);
    }

    #[test]
    fn test_keyword_categories() {
        assert_eq!(classify_local("La lavadora no acepta mis monedas", &[]), Intent::CoinProblem);
        assert_eq!(classify_local("¿Cuánto cuesta lavar?", &[]), Intent::Pricing);
        assert_eq!(classify_local("La ropa sigue húmeda después del secado", &[]), Intent::DryProblem);
        assert_eq!(classify_local("quiero hablar con un agente", &[]), Intent::HumanEscalation);
        assert_eq!(classify_local("HORARIO del domingo", &[]), Intent::HoursLocation);
    }

    #[test]
    fn test_leading_keyword_bonus() {
        let scores = score("pantalla apagada", &[]);
        let machine = scores.iter().find(|(i, _)| *i == Intent::MachineProblem).unwrap().1;
        assert!((machine - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ties_go_to_first_declared() {
        // one coin keyword and one wash keyword, neither leading
        assert_eq!(classify_local("mi ropa y el pago", &[]), Intent::CoinProblem);
    }

    #[test]
    fn test_context_keyword_adds_partial_score() {
        let context = history(&["cual es el precio"]);
        let scores = score("buenas tardes", &context);

        assert!((score_of(&scores, Intent::Pricing) - 0.3).abs() < 1e-9);
        assert_eq!(score_of(&scores, Intent::CoinProblem), 0.0);
        assert_eq!(classify_local("buenas tardes", &context), Intent::Pricing);
    }

    #[test]
    fn test_only_recent_context_counts() {
        let context = history(&["cual es el precio", "ok", "gracias", "listo"]);
        let scores = score("buenas tardes", &context);

        assert_eq!(score_of(&scores, Intent::Pricing), 0.0);
        assert_eq!(classify_local("buenas tardes", &context), Intent::GeneralInquiry);
    }

    #[test]
    fn test_context_breaks_ties() {
        let context = history(&["sigue sucia"]);
        assert_eq!(classify_local("mi ropa y el pago", &context), Intent::WashProblem);
    }
}
