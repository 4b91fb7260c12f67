use serde::{Deserialize, Serialize};

use common::consts::DEFAULT_ESCALATION_THRESHOLD;
use common::labels::SentimentLabel;

use super::lexicon::SentimentResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EscalationPhase {
    Calm,
    /// Absorbing for the rest of the conversation.
    Escalated,
}

/// Snapshot of the negative-streak state of one conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EscalationState {
    pub consecutive_negative_count: usize,
    pub is_escalated: bool,
    /// Sequence index of the user message that tipped the streak over.
    pub escalated_at: Option<usize>,
}

impl EscalationState {
    pub fn phase(&self) -> EscalationPhase {
        if self.is_escalated {
            EscalationPhase::Escalated
        } else {
            EscalationPhase::Calm
        }
    }
}

/// Counts consecutive negative user messages and latches once `threshold`
/// is reached. The counter keeps moving afterwards, the flag does not.
#[derive(Debug, Clone)]
pub struct EscalationTracker {
    threshold: usize,
    state: EscalationState,
}

impl EscalationTracker {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            state: EscalationState::default(),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn state(&self) -> EscalationState {
        self.state
    }

    pub fn is_escalated(&self) -> bool {
        self.state.is_escalated
    }

    /// Feeds one user message. Returns true only on the transition into
    /// `Escalated`.
    pub fn observe(&mut self, sequence_index: usize, sentiment: &SentimentResult) -> bool {
        if sentiment.label == SentimentLabel::Negative {
            self.state.consecutive_negative_count += 1;
        } else {
            self.state.consecutive_negative_count = 0;
        }

        if !self.state.is_escalated && self.state.consecutive_negative_count >= self.threshold {
            self.state.is_escalated = true;
            self.state.escalated_at = Some(sequence_index);
            return true;
        }
        false
    }
}

impl Default for EscalationTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ESCALATION_THRESHOLD)
    }
}

/// Whether `labels` ever holds `window` consecutive negatives.
pub fn detect_escalation(labels: &[SentimentLabel], window: usize) -> bool {
    let mut tracker = EscalationTracker::new(window);
    labels.iter().enumerate().any(|(i, label)| {
        let sentiment = SentimentResult {
            compound: 0.0,
            label: *label,
        };
        tracker.observe(i, &sentiment)
    })
}
