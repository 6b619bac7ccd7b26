pub mod classifier;
pub mod escalation;
pub mod responder;
pub mod responses;

pub use classifier::{classify_local, GupshupBotDetector, IntentClassifier, RemoteIntentDetector, KEYWORDS};
pub use escalation::EscalationRecord;
pub use responder::{AutoResponder, ProcessOutcome, ProcessReport};
