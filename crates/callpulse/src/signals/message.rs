use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::configuration::AnalysisSettings;
use common::labels::{Intent, Speaker, Urgency};

use super::intent::IntentClassifier;
use super::lexicon::{LexiconScorer, SentimentResult, SentimentScorer};
use super::normalize::NormalizedText;
use super::sentences;
use super::urgency::UrgencyScorer;

/// One chat turn as ingested. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub sequence_index: usize,
    pub speaker: Speaker,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sequence_index: usize, speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            sequence_index,
            speaker,
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentenceScore {
    pub text: String,
    pub sentiment: SentimentResult,
}

/// Everything derived from a single user message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageAnalysis {
    pub sentiment: SentimentResult,
    pub sentences: Vec<SentenceScore>,
    /// `None` only for blank text.
    pub worst_sentence: Option<SentenceScore>,
    pub intent: Intent,
    pub urgency: Urgency,
    pub urgency_intensity: f64,
}

/// Lowest-compound sentence, the earliest one on ties.
pub fn worst_sentence(sentences: &[SentenceScore]) -> Option<&SentenceScore> {
    sentences.iter().fold(None, |worst, candidate| match worst {
        Some(current) if current.sentiment.compound <= candidate.sentiment.compound => {
            Some(current)
        }
        _ => Some(candidate),
    })
}

/// Composes sentiment, sentence breakdown, intent and urgency for one
/// message. Holds no per-conversation state and can be shared freely.
pub struct MessageAnalyzer {
    scorer: Box<dyn SentimentScorer>,
    intents: IntentClassifier,
    urgency: UrgencyScorer,
    max_message_length: usize,
}

impl MessageAnalyzer {
    pub fn new() -> Self {
        Self::from_settings(&AnalysisSettings::default())
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self {
            scorer: Box::new(LexiconScorer::from_settings(settings)),
            intents: IntentClassifier::from_settings(settings),
            urgency: UrgencyScorer::from_settings(settings),
            max_message_length: settings.max_message_length,
        }
    }

    pub fn with_scorer(
        scorer: Box<dyn SentimentScorer>,
        intents: IntentClassifier,
        urgency: UrgencyScorer,
    ) -> Self {
        Self {
            scorer,
            intents,
            urgency,
            max_message_length: usize::MAX,
        }
    }

    pub fn score(&self, text: &str) -> SentimentResult {
        self.scorer.score(text)
    }

    pub fn analyze(&self, message: &Message) -> MessageAnalysis {
        self.analyze_text(&message.text)
    }

    pub fn analyze_text(&self, text: &str) -> MessageAnalysis {
        let sentiment = self.scorer.score(text);

        let sentences: Vec<SentenceScore> = sentences::split(text)
            .into_iter()
            .map(|sentence| SentenceScore {
                text: sentence.to_string(),
                sentiment: self.scorer.score(sentence),
            })
            .collect();
        let worst_sentence = worst_sentence(&sentences).cloned();

        let normalized = NormalizedText::from_text_with_limit(text, self.max_message_length);
        let intent = self.intents.classify_normalized(&normalized);
        let urgency = self.urgency.score_normalized(&normalized, &sentiment);
        let urgency_intensity = self.urgency.intensity_normalized(text, &normalized);

        MessageAnalysis {
            sentiment,
            sentences,
            worst_sentence,
            intent,
            urgency,
            urgency_intensity,
        }
    }
}

impl Default for MessageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
