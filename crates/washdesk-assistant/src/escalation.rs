use chrono::{DateTime, Utc};
use serde::Serialize;
use washdesk_types::InboundMessage;

/// Customer details carried by an escalation
#[derive(Debug, Clone, Serialize)]
pub struct EscalationCustomer {
    pub phone: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EscalationConversation {
    pub id: String,
    pub original_message: String,
}

/// Structured record emitted when a conversation needs a person
#[derive(Debug, Clone, Serialize)]
pub struct EscalationRecord {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub timestamp: DateTime<Utc>,
    pub customer: EscalationCustomer,
    pub conversation: EscalationConversation,
    pub requires_action: bool,
}

impl EscalationRecord {
    pub fn from_message(message: &InboundMessage, now: DateTime<Utc>) -> Self {
        Self {
            kind: "human_escalation",
            timestamp: now,
            customer: EscalationCustomer {
                phone: message.from_number.clone(),
                name: message.sender_name.clone(),
            },
            conversation: EscalationConversation {
                id: message.conversation_id.clone(),
                original_message: message.content.clone(),
            },
            requires_action: true,
        }
    }

    /// Write the record to the log stream operators watch
    pub fn emit(&self) {
        let record = serde_json::to_value(self).unwrap_or_default();
        tracing::warn!(
            target: "washdesk::escalation",
            escalation_type = self.kind,
            customer_phone = %self.customer.phone,
            customer_name = %self.customer.name,
            conversation_id = %self.conversation.id,
            requires_action = self.requires_action,
            record = %record,
            "human escalation requested"
        );
    }
}

/// Whether a message asks for a person regardless of its intent score
pub fn mentions_agent(text: &str) -> bool {
    text.to_lowercase().contains("agente")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use washdesk_types::MessageKind;

    #[test]
    fn test_record_shape() {
        let now = Utc::now();
        let message = InboundMessage {
            message_id: "m1".into(),
            from_number: "56911111111".into(),
            to_number: "56958292939".into(),
            kind: MessageKind::Text,
            content: "quiero un agente".into(),
            media_url: None,
            caption: String::new(),
            sender_name: "Ana".into(),
            sender_phone: "56911111111".into(),
            country_code: "56".into(),
            conversation_id: "conv_56911111111".into(),
            session_id: None,
            timestamp: now,
            received_at: now,
            metadata: json!({}),
        };

        let value = serde_json::to_value(EscalationRecord::from_message(&message, now)).unwrap();
        assert_eq!(value["type"], "human_escalation");
        assert_eq!(value["customer"]["name"], "Ana");
        assert_eq!(value["conversation"]["id"], "conv_56911111111");
        assert_eq!(value["requires_action"], true);
    }

    #[test]
    fn test_mentions_agent_is_case_insensitive() {
        assert!(mentions_agent("Necesito un AGENTE"));
        assert!(!mentions_agent("necesito ayuda"));
    }
}
