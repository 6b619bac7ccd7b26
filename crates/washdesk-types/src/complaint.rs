use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Problem kinds offered by the intake form, keyed by the wire value the
/// mobile apps send. Unknown kinds are rendered verbatim.
pub const PROBLEM_KINDS: &[(&str, &str)] = &[
    ("monedas", "Problemas con monedas"),
    ("lavado", "Problemas con el lavado"),
    ("secado", "Problemas con el secado"),
    ("maquina", "Máquina no funciona"),
    ("dinero", "Problemas con recargas"),
    ("otro", "Otro problema"),
];

/// A complaint as submitted by the intake form.
///
/// Field names serialize in camelCase; the Spanish keys used by the
/// original mobile clients are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintForm {
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "telefono")]
    pub phone: String,
    #[serde(default, alias = "tipoProblema")]
    pub problem_kind: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(default, alias = "numeroMaquina", skip_serializing_if = "Option::is_none")]
    pub machine_number: Option<String>,
    #[serde(default, alias = "montoRecarga", skip_serializing_if = "Option::is_none")]
    pub top_up_amount: Option<String>,
    #[serde(default, alias = "tipoLavado", skip_serializing_if = "Option::is_none")]
    pub wash_type: Option<String>,
}

/// A photo attached to a complaint. Only metadata travels with the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub uri: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    pub name: String,
}

/// Attachments keyed by form slot (`foto1`, `foto2`, ...).
pub type Attachments = BTreeMap<String, Attachment>;

impl ComplaintForm {
    /// Human-readable label for the problem kind.
    pub fn problem_label(&self) -> &str {
        match PROBLEM_KINDS.iter().find(|(key, _)| *key == self.problem_kind) {
            Some((_, label)) => *label,
            None => self.problem_kind.as_str(),
        }
    }

    /// Validate the form, returning every problem found.
    ///
    /// An empty vector means the complaint can be relayed.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("name is required".to_string());
        } else if name.chars().count() < 2 {
            errors.push("name must have at least 2 characters".to_string());
        }

        if self.email.trim().is_empty() {
            errors.push("email is required".to_string());
        } else if !is_valid_email(self.email.trim()) {
            errors.push("email is not a valid address".to_string());
        }

        if self.phone.trim().is_empty() {
            errors.push("phone is required".to_string());
        } else if !is_valid_chilean_phone(&self.phone) {
            errors.push("phone must be a valid Chilean mobile number (e.g. +56912345678)".to_string());
        }

        if self.problem_kind.trim().is_empty() {
            errors.push("problem kind is required".to_string());
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.push("description is required".to_string());
        } else if description.chars().count() < 10 {
            errors.push("description must have at least 10 characters".to_string());
        }

        if matches!(self.problem_kind.as_str(), "maquina" | "lavado" | "secado")
            && blank(&self.machine_number)
        {
            errors.push("machine number is required for this problem kind".to_string());
        }

        if self.problem_kind == "dinero" {
            match self.top_up_amount.as_deref().map(str::trim) {
                None | Some("") => errors.push("top-up amount is required for top-up problems".to_string()),
                Some(amount) => match amount.parse::<f64>() {
                    Ok(value) if value > 0.0 => {}
                    _ => errors.push("top-up amount must be a number greater than 0".to_string()),
                },
            }
        }

        if self.problem_kind == "lavado" && blank(&self.wash_type) {
            errors.push("wash type is required for washing problems".to_string());
        }

        errors
    }

    /// Trim every field, lowercase the email and normalise the phone number.
    pub fn sanitized(&self) -> Self {
        let trimmed = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: format_chilean_phone(&self.phone),
            problem_kind: self.problem_kind.trim().to_string(),
            description: self.description.trim().to_string(),
            machine_number: trimmed(&self.machine_number),
            top_up_amount: trimmed(&self.top_up_amount),
            wash_type: trimmed(&self.wash_type),
        }
    }

    /// Render the WhatsApp message forwarded to the support channel.
    ///
    /// `via` names the transport in the footer, `sent_at` is printed in
    /// `dd-mm-yyyy, HH:MM:SS` as Chilean locales do.
    pub fn render_message(
        &self,
        attachments: &Attachments,
        via: &str,
        sent_at: DateTime<FixedOffset>,
    ) -> String {
        let mut message = String::new();
        message.push_str("🔧 *NUEVO RECLAMO - LAVANDERÍA*\n\n");
        let _ = writeln!(message, "👤 *Cliente:* {}", self.name);
        let _ = writeln!(message, "📧 *Email:* {}", self.email);
        let _ = writeln!(message, "📱 *Teléfono:* {}\n", self.phone);
        let _ = writeln!(message, "🔸 *Tipo de Problema:* {}", self.problem_label());
        let _ = writeln!(message, "📝 *Descripción:* {}\n", self.description);

        if let Some(machine) = self.machine_number.as_deref().filter(|v| !v.is_empty()) {
            let _ = writeln!(message, "🏷️ *Número de Máquina:* {}", machine);
        }
        if let Some(amount) = self.top_up_amount.as_deref().filter(|v| !v.is_empty()) {
            let _ = writeln!(message, "💰 *Monto de Recarga:* ${}", amount);
        }
        if let Some(wash_type) = self.wash_type.as_deref().filter(|v| !v.is_empty()) {
            let _ = writeln!(message, "🧺 *Tipo de Lavado:* {}", wash_type);
        }

        if !attachments.is_empty() {
            let _ = writeln!(message, "\n📎 *Archivos adjuntos:* {} archivo(s)", attachments.len());
            for (index, attachment) in attachments.values().enumerate() {
                let _ = writeln!(message, "   {}. {}", index + 1, attachment.name);
            }
        }

        let _ = writeln!(message, "\n⏰ *Fecha:* {}", sent_at.format("%d-%m-%Y, %H:%M:%S"));
        let _ = write!(message, "🤖 *Enviado vía:* {}", via);

        message
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static CHILEAN_MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+?56)?9[0-9]{8}$").expect("phone pattern compiles"));

/// Loose `local@domain.tld` check
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Accepts `+56912345678`, `56912345678`, `912345678` and spaced variants.
/// A `+` is only allowed in front of the country code.
pub fn is_valid_chilean_phone(phone: &str) -> bool {
    let clean: String = phone
        .chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')')))
        .collect();
    CHILEAN_MOBILE.is_match(&clean)
}

/// Normalise a Chilean number to `+56XXXXXXXXX` when it is recognisable.
pub fn format_chilean_phone(phone: &str) -> String {
    let clean: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '+'))
        .collect();

    if clean.starts_with("56") {
        format!("+{}", clean)
    } else if clean.starts_with('9') && clean.len() == 9 {
        format!("+56{}", clean)
    } else {
        phone.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn form() -> ComplaintForm {
        ComplaintForm {
            name: "Ana Pérez".to_string(),
            email: "ana@example.cl".to_string(),
            phone: "+56 9 1234 5678".to_string(),
            problem_kind: "monedas".to_string(),
            description: "La máquina se tragó mis monedas".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_form_has_no_errors() {
        assert!(form().validate().is_empty());
    }

    #[test]
    fn test_kind_specific_requirements() {
        let mut complaint = form();
        complaint.problem_kind = "lavado".to_string();
        let errors = complaint.validate();
        assert_eq!(errors.len(), 2);

        complaint.problem_kind = "dinero".to_string();
        complaint.top_up_amount = Some("-5".to_string());
        let errors = complaint.validate();
        assert_eq!(errors, vec!["top-up amount must be a number greater than 0".to_string()]);
    }

    #[test]
    fn test_email_and_phone_checks() {
        assert!(is_valid_email("a@b.cl"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.cl"));
        assert!(!is_valid_email("a@@c.cl"));

        assert!(is_valid_chilean_phone("912345678"));
        assert!(is_valid_chilean_phone("+56 9 1234-5678"));
        assert!(!is_valid_chilean_phone("+56 2 2123 4567"));
        assert!(!is_valid_chilean_phone("12345"));
        assert!(!is_valid_chilean_phone("+912345678"));
        assert!(!is_valid_chilean_phone("56+912345678"));
        assert!(is_valid_chilean_phone("(+56) 9 1234 5678"));
    }

    #[test]
    fn test_sanitized_normalises_fields() {
        let mut complaint = form();
        complaint.email = "  Ana@Example.CL ".to_string();
        complaint.phone = "9 1234 5678".to_string();
        complaint.machine_number = Some("   ".to_string());

        let clean = complaint.sanitized();
        assert_eq!(clean.email, "ana@example.cl");
        assert_eq!(clean.phone, "+56912345678");
        assert_eq!(clean.machine_number, None);
    }

    #[test]
    fn test_spanish_aliases_deserialize() {
        let complaint: ComplaintForm = serde_json::from_value(serde_json::json!({
            "nombre": "Luis",
            "email": "luis@example.cl",
            "telefono": "912345678",
            "tipoProblema": "maquina",
            "descripcion": "No enciende la lavadora",
            "numeroMaquina": "7"
        }))
        .unwrap();

        assert_eq!(complaint.name, "Luis");
        assert_eq!(complaint.machine_number.as_deref(), Some("7"));
        assert_eq!(complaint.problem_label(), "Máquina no funciona");
    }

    #[test]
    fn test_render_message_lists_attachments() {
        let mut attachments = Attachments::new();
        attachments.insert(
            "foto1".to_string(),
            Attachment {
                uri: "file:///tmp/a.jpg".to_string(),
                mime_type: "image/jpeg".to_string(),
                name: "a.jpg".to_string(),
            },
        );
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let sent_at = offset.with_ymd_and_hms(2024, 3, 9, 14, 5, 9).unwrap();

        let text = form().render_message(&attachments, "Gupshup WhatsApp Business API", sent_at);

        assert!(text.starts_with("🔧 *NUEVO RECLAMO - LAVANDERÍA*"));
        assert!(text.contains("🔸 *Tipo de Problema:* Problemas con monedas"));
        assert!(text.contains("📎 *Archivos adjuntos:* 1 archivo(s)\n   1. a.jpg"));
        assert!(text.contains("⏰ *Fecha:* 09-03-2024, 14:05:09"));
        assert!(text.ends_with("🤖 *Enviado vía:* Gupshup WhatsApp Business API"));
    }
}
