use rand::seq::IndexedRandom;
use rand::Rng;

use common::configuration::{AnalysisSettings, ResponseRuleConfig};
use common::labels::{Intent, SentimentLabel};

const FALLBACK_REPLY: &str = "Thanks for your message. How can I help you further?";

/// One row of the reply table. `None` matches any value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRule {
    pub label: Option<SentimentLabel>,
    pub escalated: Option<bool>,
    pub intent: Option<Intent>,
    pub replies: Vec<String>,
}

impl ResponseRule {
    fn new(
        label: Option<SentimentLabel>,
        escalated: Option<bool>,
        intent: Option<Intent>,
        replies: &[&str],
    ) -> Self {
        Self {
            label,
            escalated,
            intent,
            replies: replies.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn matches(&self, label: SentimentLabel, escalated: bool, intent: Intent) -> bool {
        self.label.is_none_or(|l| l == label)
            && self.escalated.is_none_or(|e| e == escalated)
            && self.intent.is_none_or(|i| i == intent)
    }
}

impl From<&ResponseRuleConfig> for ResponseRule {
    fn from(config: &ResponseRuleConfig) -> Self {
        Self {
            label: config.label,
            escalated: config.escalated,
            intent: config.intent,
            replies: config.replies.clone(),
        }
    }
}

fn negative(intent: Intent, replies: &[&str]) -> ResponseRule {
    ResponseRule::new(Some(SentimentLabel::Negative), None, Some(intent), replies)
}

pub fn default_response_rules() -> Vec<ResponseRule> {
    vec![
        ResponseRule::new(
            None,
            Some(true),
            None,
            &[
                "I'm sorry this has been so frustrating. I'm bringing in a senior specialist to take over right away.",
                "I understand this hasn't been resolved. Let me connect you with a human supervisor now.",
                "I'm escalating your case to our priority team, someone will be with you shortly.",
            ],
        ),
        negative(
            Intent::Billing,
            &[
                "I'm sorry about the billing trouble. Let me review the charges on your account.",
                "Apologies for the confusion with your invoice. I'll check what happened with that payment.",
            ],
        ),
        negative(
            Intent::Refund,
            &[
                "I'm sorry for the trouble. Let me look into your refund right away.",
                "I understand you'd like your money back. I'll check the status of the refund for you.",
            ],
        ),
        negative(
            Intent::Delivery,
            &[
                "I'm sorry your order hasn't arrived as expected. Let me track the package for you.",
                "Apologies for the delivery delay. I'll check with the courier right now.",
            ],
        ),
        negative(
            Intent::Technical,
            &[
                "I'm sorry it isn't working. Could you tell me what you see when the problem happens?",
                "Apologies for the technical trouble. Let me walk you through a fix.",
            ],
        ),
        negative(
            Intent::Account,
            &[
                "I'm sorry you're having trouble getting into your account. Let's get that sorted.",
                "Apologies for the account issue. I can help you reset your access.",
            ],
        ),
        ResponseRule::new(
            Some(SentimentLabel::Negative),
            None,
            None,
            &[
                "I'm really sorry about that. Let me see how I can fix this for you.",
                "I understand your frustration. I'll do my best to resolve this quickly.",
                "Apologies for the trouble. Could you share a few more details?",
            ],
        ),
        ResponseRule::new(
            Some(SentimentLabel::Neutral),
            None,
            Some(Intent::Delivery),
            &[
                "Could you share your order number so I can check the delivery status?",
                "Happy to help with your delivery. What's the order number?",
            ],
        ),
        ResponseRule::new(
            Some(SentimentLabel::Neutral),
            None,
            Some(Intent::Account),
            &[
                "Could you confirm the email address on your account?",
                "I can help with your account. Which email did you sign up with?",
            ],
        ),
        ResponseRule::new(
            Some(SentimentLabel::Neutral),
            None,
            None,
            &[
                "Thanks for the details. Could you tell me a bit more?",
                "Got it. Is there anything else you'd like me to check?",
                "Understood. How can I help you further?",
            ],
        ),
        ResponseRule::new(
            Some(SentimentLabel::Positive),
            None,
            None,
            &[
                "Great! Glad it worked for you.",
                "Awesome! I'm here if you need anything further.",
                "Happy to help! Have a great day.",
            ],
        ),
    ]
}

/// Picks an agent reply for an analyzed user message from an ordered rule
/// table. Stateless; randomness comes from the caller.
#[derive(Debug, Clone)]
pub struct ResponseSelector {
    rules: Vec<ResponseRule>,
}

impl ResponseSelector {
    pub fn new() -> Self {
        Self::with_rules(default_response_rules())
    }

    pub fn with_rules(rules: Vec<ResponseRule>) -> Self {
        Self { rules }
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        match &settings.response_rules {
            Some(rules) => Self::with_rules(rules.iter().map(ResponseRule::from).collect()),
            None => Self::new(),
        }
    }

    pub fn rules(&self) -> &[ResponseRule] {
        &self.rules
    }

    pub fn select<R: Rng + ?Sized>(
        &self,
        label: SentimentLabel,
        escalated: bool,
        intent: Intent,
        rng: &mut R,
    ) -> String {
        self.rules
            .iter()
            .find(|rule| rule.matches(label, escalated, intent))
            .and_then(|rule| rule.replies.choose(rng))
            .map(String::as_str)
            .unwrap_or(FALLBACK_REPLY)
            .to_string()
    }
}

impl Default for ResponseSelector {
    fn default() -> Self {
        Self::new()
    }
}
