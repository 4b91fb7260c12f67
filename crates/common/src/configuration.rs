use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

use crate::consts::{
    ACCOUNT_KEYWORDS, BILLING_KEYWORDS, DEFAULT_ESCALATION_THRESHOLD, DEFAULT_MAX_MESSAGE_LENGTH,
    DEFAULT_NEUTRAL_BAND, DEFAULT_NEUTRAL_PHRASES, DEFAULT_STRONG_NEGATIVE_THRESHOLD,
    DEFAULT_TOP_NEGATIVE, DEFAULT_TREND_WINDOW, DEFAULT_URGENCY_KEYWORDS, DELIVERY_KEYWORDS,
    REFUND_KEYWORDS, TECHNICAL_KEYWORDS,
};
use crate::errors::ConfigError;
use crate::labels::{Intent, SentimentLabel};

/// Raw on-disk configuration. Every section is optional; missing values fall
/// back to the defaults in [`crate::consts`] when [`AnalysisSettings`] is built.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Configuration {
    pub version: Option<String>,
    pub sentiment: Option<SentimentConfig>,
    pub conversation: Option<ConversationConfig>,
    pub escalation: Option<EscalationConfig>,
    pub urgency: Option<UrgencyConfig>,
    pub intents: Option<Vec<IntentRuleConfig>>,
    pub responses: Option<ResponsesConfig>,
    pub logging: Option<Logging>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SentimentConfig {
    pub neutral_phrases: Option<Vec<String>>,
    /// Extra or overriding lexicon entries, word -> valence in [-4, 4].
    pub lexicon: Option<HashMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConversationConfig {
    pub neutral_band: Option<f64>,
    pub trend_window: Option<usize>,
    pub top_negative: Option<usize>,
    pub reject_blank_messages: Option<bool>,
    pub max_message_length: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EscalationConfig {
    pub threshold: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UrgencyConfig {
    pub keywords: Option<Vec<String>>,
    pub strong_negative_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentRuleConfig {
    pub intent: Intent,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResponsesConfig {
    /// Fixed seed for reply selection; omit for a fresh seed per conversation.
    pub seed: Option<u64>,
    pub rules: Option<Vec<ResponseRuleConfig>>,
}

/// One row of the reply table. `None` fields match anything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseRuleConfig {
    pub label: Option<SentimentLabel>,
    pub escalated: Option<bool>,
    pub intent: Option<Intent>,
    pub replies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Logging {
    pub level: Option<String>,
}

impl Configuration {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref()?.level.as_deref()
    }
}

/// Validated, fully-resolved settings consumed by the analysis engine.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub neutral_phrases: Vec<String>,
    pub lexicon_overrides: HashMap<String, f64>,
    pub neutral_band: f64,
    pub trend_window: usize,
    pub top_negative: usize,
    pub reject_blank_messages: bool,
    pub max_message_length: usize,
    pub escalation_threshold: usize,
    pub urgency_keywords: Vec<String>,
    pub strong_negative_threshold: f64,
    pub intent_rules: Vec<IntentRuleConfig>,
    pub response_seed: Option<u64>,
    /// `None` selects the built-in reply table.
    pub response_rules: Option<Vec<ResponseRuleConfig>>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn lowercased(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

pub fn default_intent_rules() -> Vec<IntentRuleConfig> {
    Intent::PRIORITY
        .iter()
        .map(|intent| {
            let keywords = match intent {
                Intent::Billing => BILLING_KEYWORDS,
                Intent::Refund => REFUND_KEYWORDS,
                Intent::Delivery => DELIVERY_KEYWORDS,
                Intent::Technical => TECHNICAL_KEYWORDS,
                Intent::Account => ACCOUNT_KEYWORDS,
                Intent::General => &[],
            };
            IntentRuleConfig {
                intent: *intent,
                keywords: owned(keywords),
            }
        })
        .collect()
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            neutral_phrases: owned(DEFAULT_NEUTRAL_PHRASES),
            lexicon_overrides: HashMap::new(),
            neutral_band: DEFAULT_NEUTRAL_BAND,
            trend_window: DEFAULT_TREND_WINDOW,
            top_negative: DEFAULT_TOP_NEGATIVE,
            reject_blank_messages: false,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
            urgency_keywords: owned(DEFAULT_URGENCY_KEYWORDS),
            strong_negative_threshold: DEFAULT_STRONG_NEGATIVE_THRESHOLD,
            intent_rules: default_intent_rules(),
            response_seed: None,
            response_rules: None,
        }
    }
}

impl TryFrom<&Configuration> for AnalysisSettings {
    type Error = ConfigError;

    fn try_from(config: &Configuration) -> Result<Self, Self::Error> {
        let mut settings = AnalysisSettings::default();

        if let Some(sentiment) = &config.sentiment {
            if let Some(phrases) = &sentiment.neutral_phrases {
                settings.neutral_phrases = lowercased(phrases);
            }
            if let Some(lexicon) = &sentiment.lexicon {
                for (word, valence) in lexicon {
                    if !valence.is_finite() || valence.abs() > 4.0 {
                        return Err(ConfigError::invalid(
                            "sentiment.lexicon",
                            format!("valence for '{}' must be within [-4, 4]", word),
                        ));
                    }
                    settings
                        .lexicon_overrides
                        .insert(word.trim().to_lowercase(), *valence);
                }
            }
        }

        if let Some(conversation) = &config.conversation {
            if let Some(band) = conversation.neutral_band {
                if !band.is_finite() || !(0.0..1.0).contains(&band) {
                    return Err(ConfigError::invalid(
                        "conversation.neutral_band",
                        "must be within [0, 1)",
                    ));
                }
                settings.neutral_band = band;
            }
            if let Some(window) = conversation.trend_window {
                if window == 0 {
                    return Err(ConfigError::invalid(
                        "conversation.trend_window",
                        "must be at least 1",
                    ));
                }
                settings.trend_window = window;
            }
            if let Some(top) = conversation.top_negative {
                settings.top_negative = top;
            }
            if let Some(reject) = conversation.reject_blank_messages {
                settings.reject_blank_messages = reject;
            }
            if let Some(max_len) = conversation.max_message_length {
                if max_len < 16 {
                    return Err(ConfigError::invalid(
                        "conversation.max_message_length",
                        "must be at least 16",
                    ));
                }
                settings.max_message_length = max_len;
            }
        }

        if let Some(threshold) = config.escalation.as_ref().and_then(|e| e.threshold) {
            if threshold == 0 {
                return Err(ConfigError::invalid(
                    "escalation.threshold",
                    "must be at least 1",
                ));
            }
            settings.escalation_threshold = threshold;
        }

        if let Some(urgency) = &config.urgency {
            if let Some(keywords) = &urgency.keywords {
                settings.urgency_keywords = lowercased(keywords);
            }
            if let Some(threshold) = urgency.strong_negative_threshold {
                if !threshold.is_finite() || !(-1.0..=0.0).contains(&threshold) {
                    return Err(ConfigError::invalid(
                        "urgency.strong_negative_threshold",
                        "must be within [-1, 0]",
                    ));
                }
                settings.strong_negative_threshold = threshold;
            }
        }

        if let Some(rules) = &config.intents {
            let mut resolved = Vec::with_capacity(rules.len());
            for rule in rules {
                if rule.intent == Intent::General {
                    return Err(ConfigError::invalid(
                        "intents",
                        "general is the fallback and cannot have keywords",
                    ));
                }
                let keywords = lowercased(&rule.keywords);
                if keywords.is_empty() {
                    return Err(ConfigError::invalid(
                        "intents",
                        format!("rule for '{}' has no keywords", rule.intent),
                    ));
                }
                resolved.push(IntentRuleConfig {
                    intent: rule.intent,
                    keywords,
                });
            }
            settings.intent_rules = resolved;
        }

        if let Some(responses) = &config.responses {
            settings.response_seed = responses.seed;
            if let Some(rules) = &responses.rules {
                if rules.is_empty() {
                    return Err(ConfigError::invalid(
                        "responses.rules",
                        "must contain at least one rule when present",
                    ));
                }
                if let Some(position) = rules.iter().position(|r| r.replies.is_empty()) {
                    return Err(ConfigError::invalid(
                        "responses.rules",
                        format!("rule #{} has no replies", position + 1),
                    ));
                }
                if let Some(position) = rules
                    .iter()
                    .position(|r| r.replies.iter().any(|reply| reply.trim().is_empty()))
                {
                    return Err(ConfigError::invalid(
                        "responses.rules",
                        format!("rule #{} has a blank reply", position + 1),
                    ));
                }
                settings.response_rules = Some(rules.clone());
            }
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    const FULL_CONFIG: &str = r#"
version: v0.1
sentiment:
  neutral_phrases: ["Meh", "fine"]
  lexicon:
    meh: -0.5
conversation:
  neutral_band: 0.2
  trend_window: 5
  top_negative: 2
  reject_blank_messages: true
escalation:
  threshold: 2
urgency:
  keywords: ["ASAP", "today"]
  strong_negative_threshold: -0.7
intents:
  - intent: refund
    keywords: ["refund", "money back"]
  - intent: billing
    keywords: ["invoice"]
responses:
  seed: 7
  rules:
    - escalated: true
      replies: ["Connecting you to a specialist."]
    - label: negative
      intent: refund
      replies: ["Starting your refund."]
logging:
  level: debug
"#;

    #[test]
    fn test_deserialize_configuration() {
        let config = Configuration::from_yaml(FULL_CONFIG).unwrap();
        assert_eq!(config.version.as_deref(), Some("v0.1"));
        assert_eq!(config.log_level(), Some("debug"));

        let settings = AnalysisSettings::try_from(&config).unwrap();
        assert_eq!(settings.neutral_phrases, vec!["meh", "fine"]);
        assert_eq!(settings.lexicon_overrides.get("meh"), Some(&-0.5));
        assert_eq!(settings.neutral_band, 0.2);
        assert_eq!(settings.trend_window, 5);
        assert_eq!(settings.top_negative, 2);
        assert!(settings.reject_blank_messages);
        assert_eq!(settings.escalation_threshold, 2);
        assert_eq!(settings.urgency_keywords, vec!["asap", "today"]);
        assert_eq!(settings.strong_negative_threshold, -0.7);
        assert_eq!(
            settings.intent_rules,
            vec![
                IntentRuleConfig {
                    intent: Intent::Refund,
                    keywords: vec!["refund".to_string(), "money back".to_string()],
                },
                IntentRuleConfig {
                    intent: Intent::Billing,
                    keywords: vec!["invoice".to_string()],
                },
            ]
        );
        assert_eq!(settings.response_seed, Some(7));

        let rules = settings.response_rules.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].escalated, Some(true));
        assert_eq!(rules[1].label, Some(SentimentLabel::Negative));
        assert_eq!(rules[1].intent, Some(Intent::Refund));
    }

    #[test]
    fn test_empty_configuration_uses_defaults() {
        let config = Configuration::from_yaml("version: v0.1").unwrap();
        let settings = AnalysisSettings::try_from(&config).unwrap();

        assert_eq!(settings.escalation_threshold, 3);
        assert_eq!(settings.neutral_band, 0.1);
        assert_eq!(settings.strong_negative_threshold, -0.5);
        assert!(!settings.reject_blank_messages);
        assert!(settings.response_rules.is_none());

        let order: Vec<Intent> = settings.intent_rules.iter().map(|r| r.intent).collect();
        assert_eq!(order, Intent::PRIORITY.to_vec());
    }

    #[test]
    fn test_zero_escalation_threshold_rejected() {
        let config = Configuration::from_yaml("escalation:\n  threshold: 0\n").unwrap();
        let err = AnalysisSettings::try_from(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "escalation.threshold"));
    }

    #[test]
    fn test_general_intent_rule_rejected() {
        let yaml = "intents:\n  - intent: general\n    keywords: [hello]\n";
        let config = Configuration::from_yaml(yaml).unwrap();
        assert!(AnalysisSettings::try_from(&config).is_err());
    }

    #[test]
    fn test_out_of_range_lexicon_rejected() {
        let yaml = "sentiment:\n  lexicon:\n    doom: -9.0\n";
        let config = Configuration::from_yaml(yaml).unwrap();
        assert!(AnalysisSettings::try_from(&config).is_err());
    }

    #[test]
    fn test_response_rule_without_replies_rejected() {
        let yaml = "responses:\n  rules:\n    - label: positive\n      replies: []\n";
        let config = Configuration::from_yaml(yaml).unwrap();
        assert!(AnalysisSettings::try_from(&config).is_err());
    }

    #[test]
    fn test_response_rule_with_blank_reply_rejected() {
        let yaml = "responses:\n  rules:\n    - replies: [\"ok\"]\n    - replies: [\"fine\", \"  \"]\n";
        let config = Configuration::from_yaml(yaml).unwrap();
        let err = AnalysisSettings::try_from(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            ConfigError::invalid("responses.rules", "rule #2 has a blank reply").to_string()
        );

        let yaml = "responses:\n  rules:\n    - replies: [\"\"]\n";
        let config = Configuration::from_yaml(yaml).unwrap();
        assert!(matches!(
            AnalysisSettings::try_from(&config),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Configuration::load("/nonexistent/callpulse.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
