use common::configuration::{default_intent_rules, AnalysisSettings, IntentRuleConfig};
use common::labels::Intent;

use super::normalize::NormalizedText;

/// One row of the intent table: any keyword present selects `intent`.
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub intent: Intent,
    pub keywords: Vec<String>,
}

impl IntentRule {
    fn matches(&self, text: &NormalizedText) -> bool {
        text.first_match(&self.keywords).is_some()
    }
}

impl From<&IntentRuleConfig> for IntentRule {
    fn from(config: &IntentRuleConfig) -> Self {
        Self {
            intent: config.intent,
            keywords: config.keywords.clone(),
        }
    }
}

/// Ordered keyword table, first matching row wins, no match is `General`.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
    max_message_length: usize,
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self::with_rules(default_intent_rules().iter().map(IntentRule::from).collect())
    }

    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self {
            rules,
            max_message_length: usize::MAX,
        }
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self {
            rules: settings.intent_rules.iter().map(IntentRule::from).collect(),
            max_message_length: settings.max_message_length,
        }
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn classify(&self, text: &str) -> Intent {
        let normalized = NormalizedText::from_text_with_limit(text, self.max_message_length);
        self.classify_normalized(&normalized)
    }

    pub(crate) fn classify_normalized(&self, text: &NormalizedText) -> Intent {
        self.rules
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| rule.intent)
            .unwrap_or(Intent::General)
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_intents() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("Why was I charged twice on my invoice?"),
            Intent::Billing
        );
        assert_eq!(classifier.classify("My package is late"), Intent::Delivery);
        assert_eq!(classifier.classify("I forgot my password"), Intent::Account);
        assert_eq!(
            classifier.classify("The app shows an error when I open it"),
            Intent::Technical
        );
        assert_eq!(
            classifier.classify("I would like my money back"),
            Intent::Refund
        );
    }

    #[test]
    fn test_unmatched_is_general() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("Hello, is anyone there?"), Intent::General);
        assert_eq!(classifier.classify(""), Intent::General);
    }

    #[test]
    fn test_priority_resolves_multiple_matches() {
        let classifier = IntentClassifier::new();
        // refund and technical both match, refund sits earlier in the table
        assert_eq!(
            classifier.classify("I want a refund for my broken product"),
            Intent::Refund
        );
        // billing beats delivery
        assert_eq!(
            classifier.classify("The delivery fee on my bill is wrong"),
            Intent::Billing
        );
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let classifier = IntentClassifier::new();
        // "translate" must not trigger "late", "billion" must not trigger "bill"
        assert_eq!(
            classifier.classify("Can you translate a billion words?"),
            Intent::General
        );
    }

    #[test]
    fn test_case_insensitive_and_phrases() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("The checkout is NOT WORKING"),
            Intent::Technical
        );
        assert_eq!(classifier.classify("I can't LOG IN"), Intent::Account);
    }

    #[test]
    fn test_custom_rule_order() {
        let classifier = IntentClassifier::with_rules(vec![
            IntentRule {
                intent: Intent::Technical,
                keywords: vec!["broken".to_string()],
            },
            IntentRule {
                intent: Intent::Refund,
                keywords: vec!["refund".to_string()],
            },
        ]);
        assert_eq!(
            classifier.classify("I want a refund for my broken product"),
            Intent::Technical
        );
        assert_eq!(classifier.rules().len(), 2);
    }
}
