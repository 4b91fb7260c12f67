pub mod escalation;
pub mod intent;
pub mod lexicon;
pub mod message;
pub mod normalize;
pub mod responses;
pub mod sentences;
pub mod urgency;

pub use escalation::{EscalationPhase, EscalationState, EscalationTracker};
pub use intent::IntentClassifier;
pub use lexicon::{LexiconScorer, SentimentResult, SentimentScorer};
pub use message::{Message, MessageAnalysis, MessageAnalyzer, SentenceScore};
pub use responses::ResponseSelector;
pub use urgency::UrgencyScorer;
