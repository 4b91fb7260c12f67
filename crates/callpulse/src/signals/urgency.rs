use common::configuration::AnalysisSettings;
use common::consts::{DEFAULT_STRONG_NEGATIVE_THRESHOLD, DEFAULT_URGENCY_KEYWORDS};
use common::labels::{SentimentLabel, Urgency};

use super::lexicon::SentimentResult;
use super::normalize::NormalizedText;

const KEYWORD_WEIGHT: f64 = 0.4;
const EXCLAMATION_WEIGHT: f64 = 0.05;
const MAX_EXCLAMATION_SCORE: f64 = 0.2;
const MAX_CAPS_SCORE: f64 = 0.4;

/// Condition half of an urgency rule.
#[derive(Debug, Clone, PartialEq)]
pub enum UrgencySignal {
    /// Any of the phrases appears in the text.
    Keywords(Vec<String>),
    /// Compound at or below the bound.
    CompoundAtMost(f64),
    Label(SentimentLabel),
    Always,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrgencyRule {
    pub signal: UrgencySignal,
    pub level: Urgency,
}

impl UrgencyRule {
    fn matches(&self, text: &NormalizedText, sentiment: &SentimentResult) -> bool {
        match &self.signal {
            UrgencySignal::Keywords(keywords) => text.first_match(keywords).is_some(),
            UrgencySignal::CompoundAtMost(bound) => sentiment.compound <= *bound,
            UrgencySignal::Label(label) => sentiment.label == *label,
            UrgencySignal::Always => true,
        }
    }
}

/// Ordered urgency rules, first match wins.
#[derive(Debug, Clone)]
pub struct UrgencyScorer {
    rules: Vec<UrgencyRule>,
    keywords: Vec<String>,
    max_message_length: usize,
}

impl UrgencyScorer {
    pub fn new() -> Self {
        let keywords = DEFAULT_URGENCY_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .collect();
        Self::with_keywords(keywords, DEFAULT_STRONG_NEGATIVE_THRESHOLD, usize::MAX)
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self::with_keywords(
            settings.urgency_keywords.clone(),
            settings.strong_negative_threshold,
            settings.max_message_length,
        )
    }

    fn with_keywords(
        keywords: Vec<String>,
        strong_negative_threshold: f64,
        max_message_length: usize,
    ) -> Self {
        let rules = vec![
            UrgencyRule {
                signal: UrgencySignal::Keywords(keywords.clone()),
                level: Urgency::High,
            },
            UrgencyRule {
                signal: UrgencySignal::CompoundAtMost(strong_negative_threshold),
                level: Urgency::High,
            },
            UrgencyRule {
                signal: UrgencySignal::Label(SentimentLabel::Negative),
                level: Urgency::Medium,
            },
            UrgencyRule {
                signal: UrgencySignal::Always,
                level: Urgency::Low,
            },
        ];
        Self {
            rules,
            keywords,
            max_message_length,
        }
    }

    pub fn rules(&self) -> &[UrgencyRule] {
        &self.rules
    }

    pub fn score(&self, text: &str, sentiment: &SentimentResult) -> Urgency {
        let normalized = NormalizedText::from_text_with_limit(text, self.max_message_length);
        self.score_normalized(&normalized, sentiment)
    }

    pub(crate) fn score_normalized(
        &self,
        text: &NormalizedText,
        sentiment: &SentimentResult,
    ) -> Urgency {
        self.rules
            .iter()
            .find(|rule| rule.matches(text, sentiment))
            .map(|rule| rule.level)
            .unwrap_or_default()
    }

    /// Shouting-aware urgency estimate in [0, 1], reported next to the level.
    ///
    /// 0.4 per urgency keyword present, 0.05 per `!` (capped at 0.2) and the
    /// share of ALL-CAPS words (capped at 0.4).
    pub fn intensity(&self, text: &str) -> f64 {
        let normalized = NormalizedText::from_text_with_limit(text, self.max_message_length);
        self.intensity_normalized(text, &normalized)
    }

    pub(crate) fn intensity_normalized(&self, raw: &str, text: &NormalizedText) -> f64 {
        if text.tokens().is_empty() {
            return 0.0;
        }

        let keyword_hits = self
            .keywords
            .iter()
            .filter(|k| text.contains_phrase(k))
            .count();
        let mut score = keyword_hits as f64 * KEYWORD_WEIGHT;

        let exclamations = raw.matches('!').count();
        score += (exclamations as f64 * EXCLAMATION_WEIGHT).min(MAX_EXCLAMATION_SCORE);

        let words: Vec<&str> = raw
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        if !words.is_empty() {
            let shouted = words
                .iter()
                .filter(|w| {
                    w.chars().count() >= 2
                        && w.chars().any(|c| c.is_alphabetic())
                        && !w.chars().any(|c| c.is_lowercase())
                })
                .count();
            score += (shouted as f64 / words.len() as f64).min(MAX_CAPS_SCORE);
        }

        score.clamp(0.0, 1.0)
    }
}

impl Default for UrgencyScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::lexicon::{LexiconScorer, SentimentScorer};

    fn scored(text: &str) -> Urgency {
        let sentiment = LexiconScorer::new().score(text);
        UrgencyScorer::new().score(text, &sentiment)
    }

    #[test]
    fn test_keyword_and_negative_is_high() {
        assert_eq!(
            scored("I need this fixed immediately, this is unacceptable"),
            Urgency::High
        );
    }

    #[test]
    fn test_keyword_alone_is_high() {
        assert_eq!(scored("Please call me back asap"), Urgency::High);
    }

    #[test]
    fn test_strongly_negative_is_high() {
        let sentiment = SentimentResult::from_compound(-0.75);
        assert_eq!(
            UrgencyScorer::new().score("whatever", &sentiment),
            Urgency::High
        );
    }

    #[test]
    fn test_mildly_negative_is_medium() {
        let sentiment = SentimentResult::from_compound(-0.2);
        assert_eq!(
            UrgencyScorer::new().score("whatever", &sentiment),
            Urgency::Medium
        );
    }

    #[test]
    fn test_positive_or_neutral_is_low() {
        assert_eq!(scored("Thanks, that was helpful"), Urgency::Low);
        assert_eq!(scored("What are your opening hours"), Urgency::Low);
    }

    #[test]
    fn test_now_does_not_match_inside_words() {
        assert_eq!(scored("I know the store opens at nine"), Urgency::Low);
    }

    #[test]
    fn test_rule_order_is_explicit() {
        let levels: Vec<Urgency> = UrgencyScorer::new().rules().iter().map(|r| r.level).collect();
        assert_eq!(
            levels,
            vec![Urgency::High, Urgency::High, Urgency::Medium, Urgency::Low]
        );
    }

    #[test]
    fn test_intensity_for_shouted_request() {
        let scorer = UrgencyScorer::new();
        assert!(scorer.intensity("This is urgent, please help me ASAP!!!") > 0.4);
        assert_eq!(scorer.intensity(""), 0.0);
        assert_eq!(scorer.intensity("what are your opening hours"), 0.0);
    }

    #[test]
    fn test_intensity_is_bounded() {
        let scorer = UrgencyScorer::new();
        let value = scorer.intensity("URGENT ASAP NOW EMERGENCY HELP ME!!!!!!!!");
        assert!((0.0..=1.0).contains(&value));
        assert_eq!(value, 1.0);
    }
}
