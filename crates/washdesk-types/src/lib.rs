pub mod complaint;
pub mod intent;
pub mod message;
pub mod stats;
pub mod webhook;

pub use complaint::{Attachment, Attachments, ComplaintForm, PROBLEM_KINDS};
pub use intent::Intent;
pub use message::{InboundMessage, MessageKind, StoredMessage};
pub use stats::{DailyStats, StatsTotals};
pub use webhook::{ExtractError, GupshupEnvelope, TwilioInbound};
