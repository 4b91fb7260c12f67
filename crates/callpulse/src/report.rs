//! Read-only views over a conversation for dashboards and exports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::labels::{Intent, SentimentLabel, Speaker, Urgency};

use crate::conversation::{Conversation, ConversationEntry};
use crate::signals::escalation::EscalationState;
use crate::signals::lexicon::SentimentResult;

/// Flat, serializable record of one message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportRow {
    pub sequence_index: usize,
    pub speaker: Speaker,
    pub text: String,
    pub label: SentimentLabel,
    pub compound: f64,
    pub intent: Option<Intent>,
    pub urgency: Option<Urgency>,
    pub escalated: bool,
}

impl From<&ConversationEntry> for ExportRow {
    fn from(entry: &ConversationEntry) -> Self {
        Self {
            sequence_index: entry.message.sequence_index,
            speaker: entry.message.speaker,
            text: entry.message.text.clone(),
            label: entry.sentiment.label,
            compound: entry.sentiment.compound,
            intent: entry.analysis.as_ref().map(|a| a.intent),
            urgency: entry.analysis.as_ref().map(|a| a.urgency),
            escalated: entry.escalated,
        }
    }
}

/// Trailing moving average; the first points average over what exists so far.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NegativeHighlight {
    pub sequence_index: usize,
    pub text: String,
    pub compound: f64,
}

/// Up to `k` user messages with the lowest compound, most negative first.
/// Equal scores keep arrival order.
pub fn top_negative(entries: &[ConversationEntry], k: usize) -> Vec<NegativeHighlight> {
    let mut users: Vec<&ConversationEntry> = entries
        .iter()
        .filter(|e| e.message.speaker == Speaker::User)
        .collect();
    users.sort_by(|a, b| a.sentiment.compound.total_cmp(&b.sentiment.compound));
    users
        .into_iter()
        .take(k)
        .map(|e| NegativeHighlight {
            sequence_index: e.message.sequence_index,
            text: e.message.text.clone(),
            compound: e.sentiment.compound,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    pub conversation_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub closed: bool,
    pub total_messages: usize,
    pub user_messages: usize,
    pub agent_messages: usize,
    pub overall: SentimentResult,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub mean_urgency_intensity: f64,
    pub escalation: EscalationState,
    pub smoothed_trend: Vec<f64>,
    pub top_negative: Vec<NegativeHighlight>,
}

impl ConversationSummary {
    pub fn from_conversation(
        conversation: &Conversation,
        trend_window: usize,
        top_k: usize,
    ) -> Self {
        let entries = conversation.messages();
        let analyses: Vec<_> = entries.iter().filter_map(|e| e.analysis.as_ref()).collect();
        let count = |label: SentimentLabel| {
            analyses
                .iter()
                .filter(|a| a.sentiment.label == label)
                .count()
        };

        let mean_urgency_intensity = if analyses.is_empty() {
            0.0
        } else {
            analyses.iter().map(|a| a.urgency_intensity).sum::<f64>() / analyses.len() as f64
        };

        let user_messages = entries
            .iter()
            .filter(|e| e.message.speaker == Speaker::User)
            .count();

        Self {
            conversation_id: conversation.id(),
            started_at: conversation.started_at(),
            closed: conversation.is_closed(),
            total_messages: entries.len(),
            user_messages,
            agent_messages: entries.len() - user_messages,
            overall: conversation.overall_sentiment(),
            positive_count: count(SentimentLabel::Positive),
            negative_count: count(SentimentLabel::Negative),
            neutral_count: count(SentimentLabel::Neutral),
            mean_urgency_intensity,
            escalation: conversation.escalation(),
            smoothed_trend: moving_average(conversation.sentiment_trend(), trend_window),
            top_negative: top_negative(entries, top_k),
        }
    }

    /// Multi-line plain-text report.
    pub fn render_text_report(&self) -> String {
        let mut lines = vec![
            "Conversation Summary".to_string(),
            "====================".to_string(),
            format!("Total messages: {}", self.total_messages),
            format!("User messages: {}", self.user_messages),
            format!("Agent messages: {}", self.agent_messages),
            format!(
                "Overall sentiment: {} (average compound = {:.3})",
                self.overall.label, self.overall.compound
            ),
            format!(
                "Sentiment counts: positive={} negative={} neutral={}",
                self.positive_count, self.negative_count, self.neutral_count
            ),
            format!("Mean urgency intensity: {:.3}", self.mean_urgency_intensity),
        ];

        lines.push(match self.escalation.escalated_at {
            Some(index) if self.escalation.is_escalated => format!(
                "Escalation: escalated at message {} (current negative streak {})",
                index, self.escalation.consecutive_negative_count
            ),
            _ => format!(
                "Escalation: none (current negative streak {})",
                self.escalation.consecutive_negative_count
            ),
        });
        lines.push(String::new());

        if self.top_negative.is_empty() {
            lines.push("No user messages to highlight.".to_string());
        } else {
            lines.push("Top negative user messages:".to_string());
            for (i, highlight) in self.top_negative.iter().enumerate() {
                lines.push(format!(
                    "{}. \"{}\" (score = {:.3})",
                    i + 1,
                    highlight.text,
                    highlight.compound
                ));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationAnalyzer;
    use common::configuration::AnalysisSettings;
    use pretty_assertions::assert_eq;

    fn close_enough(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    fn analyzer() -> ConversationAnalyzer {
        ConversationAnalyzer::new(&AnalysisSettings {
            response_seed: Some(1),
            ..AnalysisSettings::default()
        })
    }

    #[test]
    fn test_moving_average_trailing_window() {
        let smoothed = moving_average(&[0.3, -0.3, 0.6, 0.0], 3);
        assert!(close_enough(&smoothed, &[0.3, 0.0, 0.2, 0.1]));
    }

    #[test]
    fn test_moving_average_edges() {
        assert!(moving_average(&[], 3).is_empty());
        assert!(close_enough(&moving_average(&[0.4, -0.2], 1), &[0.4, -0.2]));
        // a zero window behaves like one
        assert!(close_enough(&moving_average(&[0.4, -0.2], 0), &[0.4, -0.2]));
    }

    #[test]
    fn test_top_negative_orders_and_limits() {
        let mut analyzer = analyzer();
        for text in [
            "Thanks, that was helpful",
            "This is terrible",
            "I am a bit sad",
            "I am furious",
        ] {
            analyzer.respond(text).unwrap();
        }
        let highlights = top_negative(analyzer.messages(), 2);
        assert_eq!(highlights.len(), 2);
        assert!(highlights[0].compound <= highlights[1].compound);
        assert!(highlights
            .iter()
            .all(|h| h.text != "Thanks, that was helpful"));
    }

    #[test]
    fn test_top_negative_ties_keep_arrival_order() {
        let mut analyzer = analyzer();
        analyzer.respond("This is terrible").unwrap();
        analyzer.respond("This is terrible").unwrap();
        let highlights = top_negative(analyzer.messages(), 3);
        assert_eq!(highlights[0].sequence_index, 0);
        assert_eq!(highlights[1].sequence_index, 2);
    }

    #[test]
    fn test_summary_counts() {
        let mut analyzer = analyzer();
        analyzer.respond("Your service disappoints me").unwrap();
        analyzer.respond("Last time was better").unwrap();
        let summary = analyzer.summary();

        assert_eq!(summary.total_messages, 4);
        assert_eq!(summary.user_messages, 2);
        assert_eq!(summary.agent_messages, 2);
        assert_eq!(summary.positive_count, 1);
        assert_eq!(summary.negative_count, 1);
        assert_eq!(summary.neutral_count, 0);
        assert_eq!(summary.overall.label, SentimentLabel::Neutral);
        assert_eq!(summary.smoothed_trend.len(), 2);
        assert!(!summary.closed);
    }

    #[test]
    fn test_text_report_layout() {
        let mut analyzer = analyzer();
        analyzer.respond("This is terrible").unwrap();
        let report = analyzer.summary().render_text_report();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "Conversation Summary");
        assert_eq!(lines[1], "====================");
        assert_eq!(lines[2], "Total messages: 2");
        assert_eq!(lines[3], "User messages: 1");
        assert!(lines[5].starts_with("Overall sentiment: Negative (average compound = -"));
        assert!(report.contains("Top negative user messages:\n1. \"This is terrible\""));
    }

    #[test]
    fn test_text_report_empty_conversation() {
        let report = analyzer().summary().render_text_report();
        assert!(report.contains("Overall sentiment: Neutral (average compound = 0.000)"));
        assert!(report.contains("Escalation: none (current negative streak 0)"));
        assert!(report.ends_with("No user messages to highlight."));
    }

    #[test]
    fn test_export_row_serializes_lowercase() {
        let mut analyzer = analyzer();
        analyzer.respond("My package is late").unwrap();
        let json = serde_json::to_value(&analyzer.export_rows()[0]).unwrap();
        assert_eq!(json["speaker"], "user");
        assert_eq!(json["intent"], "delivery");
        assert_eq!(json["sequence_index"], 0);
    }
}
