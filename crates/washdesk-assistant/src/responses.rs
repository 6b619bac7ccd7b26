//! Canned customer replies, one per intent.

use washdesk_types::Intent;

/// Longest slice of the customer's message quoted back on escalation
pub const ESCALATION_QUOTE_CHARS: usize = 100;

pub fn greeting(sender_name: &str) -> String {
    let name = sender_name.trim();
    if name.is_empty() {
        "Hola! ".to_string()
    } else {
        format!("Hola {}! ", name)
    }
}

/// Reply for `intent`, or `None` for escalations which are handled apart
pub fn response_for(intent: Intent, sender_name: &str) -> Option<String> {
    let body = match intent {
        Intent::CoinProblem => COIN_PROBLEM,
        Intent::WashProblem => WASH_PROBLEM,
        Intent::DryProblem => DRY_PROBLEM,
        Intent::MachineProblem => MACHINE_PROBLEM,
        Intent::HoursLocation => HOURS_LOCATION,
        Intent::Pricing => PRICING,
        Intent::GeneralInquiry => GENERAL,
        Intent::HumanEscalation => return None,
    };
    Some(format!("{}{}", greeting(sender_name), body))
}

pub fn image_acknowledgement() -> &'static str {
    IMAGE_RECEIVED
}

/// Notice sent when a conversation is handed to a person
pub fn escalation_notice(original: &str) -> String {
    let mut quoted: String = original.chars().take(ESCALATION_QUOTE_CHARS).collect();
    if original.chars().count() > ESCALATION_QUOTE_CHARS {
        quoted.push_str("...");
    }
    format!(
        "Te conectaré con un agente humano. 👨‍💼\n\n\
         Un miembro de nuestro equipo se pondrá en contacto contigo en los próximos minutos.\n\n\
         **Tu consulta**: \"{}\"\n\n\
         Mientras tanto, mantén este chat abierto. ⏳",
        quoted
    )
}

const COIN_PROBLEM: &str = "Entiendo que tienes problemas con las monedas. 🪙

Intenta estos pasos:
1️⃣ Verifica que las monedas estén limpias y sin daños
2️⃣ Inserta las monedas lentamente una por una
3️⃣ Verifica que uses monedas válidas ($100, $500)
4️⃣ Si la ranura está obstruida, no fuerces las monedas

✅ **Tip**: Las monedas muy nuevas o muy viejas a veces no son reconocidas.

Si el problema persiste, escribe \"agente\" para conectarte con una persona.

¿Esto resolvió tu problema? 🤔";

const WASH_PROBLEM: &str = "Lamento que tengas problemas con el lavado. 🧺

Verifiquemos algunas cosas:
1️⃣ ¿Seleccionaste el programa correcto para tu tipo de ropa?
2️⃣ ¿Usaste la cantidad adecuada de detergente?
3️⃣ ¿La máquina estaba sobrecargada de ropa?
4️⃣ ¿El agua salía limpia al final del ciclo?

✅ **Recomendación**: Máximo 8kg de ropa por lavado.

Si necesitas ayuda personalizada, escribe \"agente\" para hablar con nuestro equipo.

¿Te ayudó esta información? 👍";

const DRY_PROBLEM: &str = "Veo que tienes problemas con el secado. 🌪️

Revisa estos puntos:
1️⃣ ¿Seleccionaste la temperatura correcta?
2️⃣ ¿La ropa estaba muy húmeda al inicio?
3️⃣ ¿La máquina completó todo el ciclo?
4️⃣ ¿El filtro de pelusas está limpio?

✅ **Consejo**: Para mejor secado, no sobrecargues la máquina.

Si el problema continúa, escribe \"agente\" para asistencia directa.

¿Esto te sirvió? 🔥";

const MACHINE_PROBLEM: &str = "¡Oh no! Parece que la máquina tiene un problema técnico. 🔧

Primeros pasos:
1️⃣ Verifica que la puerta esté bien cerrada
2️⃣ Revisa si hay algún mensaje de error en pantalla
3️⃣ Intenta reiniciar presionando el botón de encendido
4️⃣ Si hay ropa dentro, NO fuerces la puerta

⚠️ **Importante**: Si la máquina tiene ropa y no abre, NO te vayas.

Voy a conectarte con un técnico inmediatamente para resolver esto.

Escribe \"técnico\" o espera un momento... 🛠️";

const HOURS_LOCATION: &str = "Aquí tienes la información que necesitas: 📍

🕐 **Horarios**:
• Lunes a Viernes: 7:00 AM - 10:00 PM
• Sábados: 8:00 AM - 8:00 PM
• Domingos: 9:00 AM - 6:00 PM

📞 **Contacto**: +56 9 5829 2939

🅿️ **Estacionamiento**: Disponible en la calle

¿Necesitas direcciones específicas? Escribe \"ubicación\" 🗺️";

const PRICING: &str = "Te comparto nuestros precios actuales: 💰

🧺 **Lavado**:
• Carga pequeña (5kg): $2.500
• Carga mediana (8kg): $3.500
• Carga grande (12kg): $4.500

🌪️ **Secado**:
• 30 minutos: $1.500
• 45 minutos: $2.000
• 60 minutos: $2.500

💸 **Paquetes**:
• Lavado + Secado pequeño: $3.500
• Lavado + Secado mediano: $5.000

💳 **Formas de pago**: Efectivo (monedas) y tarjeta

¿Te interesa algún paquete específico? 📦";

const GENERAL: &str = "Gracias por contactarnos. 😊

He recibido tu mensaje y nuestro equipo lo revisará pronto.

**Respuestas rápidas**:
• Escribe \"monedas\" para problemas de pago
• Escribe \"lavado\" para problemas de limpieza
• Escribe \"horarios\" para información de horarios
• Escribe \"precios\" para ver tarifas
• Escribe \"agente\" para hablar con una persona

¿En qué más puedo ayudarte? 🤝";

const IMAGE_RECEIVED: &str = "Gracias por enviar la imagen. 📸

Nuestro equipo la revisará y se pondrá en contacto contigo pronto.

Si es urgente, escribe \"agente\" para conectarte inmediatamente con una persona.";
