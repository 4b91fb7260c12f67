use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use common::configuration::AnalysisSettings;
use common::errors::AnalysisError;
use common::labels::{SentimentLabel, Speaker};

use crate::report::{ConversationSummary, ExportRow};
use crate::signals::escalation::{EscalationState, EscalationTracker};
use crate::signals::lexicon::SentimentResult;
use crate::signals::message::{Message, MessageAnalysis, MessageAnalyzer};
use crate::signals::responses::ResponseSelector;

/// Mean of the per-message compounds, labelled with the conversation-level
/// neutral band. Empty input is neutral.
pub fn overall_sentiment(scores: &[f64], neutral_band: f64) -> SentimentResult {
    if scores.is_empty() {
        return SentimentResult::neutral();
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    if !mean.is_finite() {
        return SentimentResult::neutral();
    }
    let label = if mean >= neutral_band {
        SentimentLabel::Positive
    } else if mean <= -neutral_band {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    SentimentResult {
        compound: mean.clamp(-1.0, 1.0),
        label,
    }
}

/// A recorded message with whatever was derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationEntry {
    pub message: Message,
    /// Only user messages are analyzed.
    pub analysis: Option<MessageAnalysis>,
    pub sentiment: SentimentResult,
    /// Escalation flag right after this message was recorded.
    pub escalated: bool,
}

/// Result of one user turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub sequence_index: usize,
    pub analysis: MessageAnalysis,
    pub response: String,
    pub escalation: EscalationState,
    /// True only for the turn that flipped the conversation into escalation.
    pub escalated_now: bool,
    pub overall: SentimentResult,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    id: Uuid,
    started_at: DateTime<Utc>,
    entries: Vec<ConversationEntry>,
    trend: Vec<f64>,
    escalation: EscalationTracker,
    neutral_band: f64,
    closed: bool,
}

impl Conversation {
    pub fn new(escalation_threshold: usize, neutral_band: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            entries: Vec::new(),
            trend: Vec::new(),
            escalation: EscalationTracker::new(escalation_threshold),
            neutral_band,
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn messages(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Compound of every user message, in arrival order.
    pub fn sentiment_trend(&self) -> &[f64] {
        &self.trend
    }

    pub fn overall_sentiment(&self) -> SentimentResult {
        overall_sentiment(&self.trend, self.neutral_band)
    }

    pub fn escalation(&self) -> EscalationState {
        self.escalation.state()
    }

    pub fn is_escalated(&self) -> bool {
        self.escalation.is_escalated()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn next_index(&self) -> usize {
        self.entries.len()
    }
}

/// Owns one conversation and is the only thing allowed to change it.
///
/// Turns are processed strictly in the order `ingest`/`respond` are called.
/// The analysis engine and reply table are shared read-only across
/// conversations.
pub struct ConversationAnalyzer {
    engine: Arc<MessageAnalyzer>,
    responder: Arc<ResponseSelector>,
    conversation: Conversation,
    rng: StdRng,
    reject_blank_messages: bool,
    trend_window: usize,
    top_negative: usize,
}

impl ConversationAnalyzer {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self::with_engine(
            Arc::new(MessageAnalyzer::from_settings(settings)),
            Arc::new(ResponseSelector::from_settings(settings)),
            settings,
        )
    }

    pub fn with_engine(
        engine: Arc<MessageAnalyzer>,
        responder: Arc<ResponseSelector>,
        settings: &AnalysisSettings,
    ) -> Self {
        let rng = match settings.response_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            engine,
            responder,
            conversation: Conversation::new(
                settings.escalation_threshold,
                settings.neutral_band,
            ),
            rng,
            reject_blank_messages: settings.reject_blank_messages,
            trend_window: settings.trend_window,
            top_negative: settings.top_negative,
        }
    }

    pub fn id(&self) -> Uuid {
        self.conversation.id()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[ConversationEntry] {
        self.conversation.messages()
    }

    pub fn sentiment_trend(&self) -> &[f64] {
        self.conversation.sentiment_trend()
    }

    pub fn overall_sentiment(&self) -> SentimentResult {
        self.conversation.overall_sentiment()
    }

    pub fn escalation(&self) -> EscalationState {
        self.conversation.escalation()
    }

    pub fn is_escalated(&self) -> bool {
        self.conversation.is_escalated()
    }

    /// Records one message. User messages are analyzed and answered, agent
    /// messages are only scored and stored, so they yield `None`.
    pub fn ingest(
        &mut self,
        text: &str,
        speaker: Speaker,
    ) -> Result<Option<TurnOutcome>, AnalysisError> {
        match speaker {
            Speaker::User => self.ingest_user(text).map(Some),
            Speaker::Agent => {
                self.record_agent(text)?;
                Ok(None)
            }
        }
    }

    /// Handles a user message and records the chosen reply as the agent's
    /// next message. Only the user text is validated; the reply is recorded as generated.
    pub fn respond(&mut self, text: &str) -> Result<TurnOutcome, AnalysisError> {
        let outcome = self.ingest_user(text)?;
        let _span = info_span!("conversation", conversation_id = %self.id()).entered();
        self.push_agent(&outcome.response);
        Ok(outcome)
    }

    /// Finalizes the conversation. Any later `ingest`, `respond` or `close`
    /// fails with `InvalidState`.
    pub fn close(&mut self) -> Result<ConversationSummary, AnalysisError> {
        self.ensure_open()?;
        self.conversation.closed = true;

        let summary = self.summary();
        let _span = info_span!("conversation", conversation_id = %self.id()).entered();
        info!(
            messages = summary.total_messages,
            overall = %summary.overall.label,
            escalated = summary.escalation.is_escalated,
            "conversation closed"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary::from_conversation(
            &self.conversation,
            self.trend_window,
            self.top_negative,
        )
    }

    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.conversation
            .messages()
            .iter()
            .map(ExportRow::from)
            .collect()
    }

    fn ensure_open(&self) -> Result<(), AnalysisError> {
        if self.conversation.closed {
            return Err(AnalysisError::InvalidState(format!(
                "conversation {} is closed",
                self.id()
            )));
        }
        Ok(())
    }

    fn check_text(&self, text: &str) -> Result<(), AnalysisError> {
        if self.reject_blank_messages && text.trim().is_empty() {
            warn!("rejected blank message");
            return Err(AnalysisError::InvalidInput(
                "message text is blank".to_string(),
            ));
        }
        Ok(())
    }

    fn ingest_user(&mut self, text: &str) -> Result<TurnOutcome, AnalysisError> {
        let _span = info_span!("conversation", conversation_id = %self.id()).entered();
        self.ensure_open()?;
        self.check_text(text)?;

        let sequence_index = self.conversation.next_index();
        let message = Message::new(sequence_index, Speaker::User, text);
        let analysis = self.engine.analyze(&message);

        let escalated_now = self
            .conversation
            .escalation
            .observe(sequence_index, &analysis.sentiment);
        self.conversation.trend.push(analysis.sentiment.compound);
        let overall = self.conversation.overall_sentiment();
        let escalation = self.conversation.escalation();

        debug!(
            sequence_index,
            compound = analysis.sentiment.compound,
            label = %analysis.sentiment.label,
            intent = %analysis.intent,
            urgency = %analysis.urgency,
            negative_streak = escalation.consecutive_negative_count,
            "analyzed user message"
        );
        if escalated_now {
            info!(
                sequence_index,
                negative_streak = escalation.consecutive_negative_count,
                "conversation escalated"
            );
        }

        let response = self.responder.select(
            analysis.sentiment.label,
            escalation.is_escalated,
            analysis.intent,
            &mut self.rng,
        );

        self.conversation.entries.push(ConversationEntry {
            message,
            analysis: Some(analysis.clone()),
            sentiment: analysis.sentiment,
            escalated: escalation.is_escalated,
        });

        Ok(TurnOutcome {
            sequence_index,
            analysis,
            response,
            escalation,
            escalated_now,
            overall,
        })
    }

    fn record_agent(&mut self, text: &str) -> Result<(), AnalysisError> {
        let _span = info_span!("conversation", conversation_id = %self.id()).entered();
        self.ensure_open()?;
        self.check_text(text)?;
        self.push_agent(text);
        Ok(())
    }

    fn push_agent(&mut self, text: &str) {
        let sequence_index = self.conversation.next_index();
        let sentiment = self.engine.score(text);
        debug!(sequence_index, compound = sentiment.compound, "recorded agent message");

        self.conversation.entries.push(ConversationEntry {
            message: Message::new(sequence_index, Speaker::Agent, text),
            analysis: None,
            sentiment,
            escalated: self.conversation.is_escalated(),
        });
    }
}
