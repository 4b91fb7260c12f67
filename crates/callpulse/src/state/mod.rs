use async_trait::async_trait;
use uuid::Uuid;

use common::errors::AnalysisError;
use common::labels::Speaker;

use crate::conversation::TurnOutcome;
use crate::report::{ConversationSummary, ExportRow};

pub mod memory;

pub use memory::ConversationRegistry;

/// Holds many independent conversations keyed by id.
///
/// Turns for one conversation are applied one at a time in call order;
/// different conversations never block each other's analysis.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Opens a new conversation and returns its id.
    async fn start(&self) -> Uuid;

    async fn ingest(
        &self,
        id: Uuid,
        text: &str,
        speaker: Speaker,
    ) -> Result<Option<TurnOutcome>, AnalysisError>;

    async fn respond(&self, id: Uuid, text: &str) -> Result<TurnOutcome, AnalysisError>;

    async fn summary(&self, id: Uuid) -> Result<ConversationSummary, AnalysisError>;

    async fn export_rows(&self, id: Uuid) -> Result<Vec<ExportRow>, AnalysisError>;

    /// Closes the conversation, drops it, and returns its final summary.
    async fn close(&self, id: Uuid) -> Result<ConversationSummary, AnalysisError>;

    async fn active_count(&self) -> usize;
}

pub(crate) fn unknown_conversation(id: Uuid) -> AnalysisError {
    AnalysisError::InvalidState(format!("unknown conversation {}", id))
}
