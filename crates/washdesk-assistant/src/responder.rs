use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use washdesk_persist::MessageStore;
use washdesk_providers::WhatsAppSender;
use washdesk_types::{InboundMessage, Intent, MessageKind, StoredMessage};

use crate::classifier::IntentClassifier;
use crate::escalation::{mentions_agent, EscalationRecord};
use crate::responses;

/// Messages of history fetched for context and the greeting
pub const CONVERSATION_WINDOW: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// The message ID was already stored; nothing was done
    Duplicate { message_id: String },
    Processed(ProcessReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessReport {
    pub message_id: String,
    pub intent: Option<Intent>,
    pub escalated: bool,
    pub auto_response_sent: bool,
}

/// Inbound message pipeline: dedup, store, classify, reply, mark processed
pub struct AutoResponder {
    store: Arc<dyn MessageStore>,
    sender: Option<Arc<dyn WhatsAppSender>>,
    classifier: IntentClassifier,
    auto_responses: bool,
}

impl AutoResponder {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self {
            store,
            sender: None,
            classifier: IntentClassifier::new(),
            auto_responses: true,
        }
    }

    pub fn with_sender(mut self, sender: Arc<dyn WhatsAppSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn auto_responses(mut self, enabled: bool) -> Self {
        self.auto_responses = enabled;
        self
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    pub fn has_sender(&self) -> bool {
        self.sender.is_some()
    }

    /// Run one inbound message through the pipeline
    ///
    /// Store failures on save or mark are returned; send failures are only
    /// logged so one bad reply never loses the message.
    pub async fn process(&self, message: InboundMessage) -> Result<ProcessOutcome> {
        let message_id = message.message_id.clone();

        let duplicate = self.store.exists(&message_id).await.unwrap_or_else(|e| {
            tracing::warn!(message_id = %message_id, error = %e, "duplicate check failed, continuing");
            false
        });
        if duplicate {
            tracing::info!(message_id = %message_id, "duplicate message ignored");
            return Ok(ProcessOutcome::Duplicate { message_id });
        }

        let stored = self.store.save_message(message.clone()).await?;
        tracing::info!(
            message_id = %message_id,
            row_id = %stored.id,
            from = %message.from_number,
            kind = message.kind.as_str(),
            "message stored"
        );

        let mut report = ProcessReport {
            message_id: message_id.clone(),
            intent: None,
            escalated: false,
            auto_response_sent: false,
        };

        match message.kind {
            MessageKind::Text if !message.content.trim().is_empty() => {
                self.handle_text(&message, &mut report).await;
            }
            MessageKind::Image => {
                report.auto_response_sent = self.reply(&message, responses::image_acknowledgement()).await;
            }
            _ => {}
        }

        self.store.mark_processed(&message_id, report.intent).await?;
        Ok(ProcessOutcome::Processed(report))
    }

    async fn handle_text(&self, message: &InboundMessage, report: &mut ProcessReport) {
        let conversation: Vec<StoredMessage> = self
            .store
            .get_conversation(&message.conversation_id, CONVERSATION_WINDOW)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(conversation_id = %message.conversation_id, error = %e, "conversation lookup failed");
                Vec::new()
            });

        let intent = self.classifier.classify(&message.content, &conversation).await;
        report.intent = Some(intent);

        if intent == Intent::HumanEscalation || mentions_agent(&message.content) {
            report.escalated = true;
            let notice = responses::escalation_notice(&message.content);
            report.auto_response_sent = self.reply(message, &notice).await;
            EscalationRecord::from_message(message, Utc::now()).emit();
            return;
        }

        let sender_name = conversation.first().map(|m| m.sender_name.as_str()).unwrap_or("");
        if let Some(response) = responses::response_for(intent, sender_name) {
            report.auto_response_sent = self.reply(message, &response).await;
        }
    }

    /// Send a reply and flag the message when it went out
    async fn reply(&self, message: &InboundMessage, body: &str) -> bool {
        if !self.auto_responses {
            tracing::debug!(message_id = %message.message_id, "auto responses disabled");
            return false;
        }
        let Some(sender) = &self.sender else {
            tracing::warn!(message_id = %message.message_id, "no provider configured, reply not sent");
            return false;
        };

        match sender.send_message(&message.from_number, body).await {
            Ok(receipt) => {
                tracing::info!(
                    to = %message.from_number,
                    provider = sender.kind().as_str(),
                    provider_message_id = receipt.message_id.as_deref().unwrap_or(""),
                    "auto response sent"
                );
                if let Err(e) = self.store.mark_auto_response_sent(&message.message_id).await {
                    tracing::warn!(message_id = %message.message_id, error = %e, "could not flag auto response");
                }
                true
            }
            Err(e) => {
                tracing::error!(to = %message.from_number, error = %e, "auto response failed");
                false
            }
        }
    }
}
