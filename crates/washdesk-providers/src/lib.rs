pub mod config;
pub mod deep_link;
pub mod gupshup;
pub mod traits;
pub mod transport;
pub mod twilio;

pub use config::{GupshupConfig, ProviderConfig, ProviderDetails, ProviderFactory, TwilioConfig};
pub use deep_link::whatsapp_deep_link;
pub use gupshup::GupshupClient;
pub use traits::{ProviderKind, SendReceipt, WhatsAppSender};
pub use transport::{ComplaintTransport, DeliveryRoute, SubmissionOutcome};
pub use twilio::{TwilioAccount, TwilioClient, TwilioMessage};
