use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use common::configuration::AnalysisSettings;
use common::errors::AnalysisError;
use common::labels::Speaker;

use super::{unknown_conversation, ConversationStore};
use crate::conversation::{ConversationAnalyzer, TurnOutcome};
use crate::report::{ConversationSummary, ExportRow};
use crate::signals::message::MessageAnalyzer;
use crate::signals::responses::ResponseSelector;

type SharedConversation = Arc<Mutex<ConversationAnalyzer>>;

/// In-memory conversation registry.
///
/// The map lock is only held to look up or insert an entry; each
/// conversation has its own mutex so turns on different conversations run
/// in parallel. The analysis engine is built once and shared.
#[derive(Clone)]
pub struct ConversationRegistry {
    conversations: Arc<RwLock<HashMap<Uuid, SharedConversation>>>,
    engine: Arc<MessageAnalyzer>,
    responder: Arc<ResponseSelector>,
    settings: Arc<AnalysisSettings>,
}

impl ConversationRegistry {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self {
            conversations: Arc::new(RwLock::new(HashMap::new())),
            engine: Arc::new(MessageAnalyzer::from_settings(&settings)),
            responder: Arc::new(ResponseSelector::from_settings(&settings)),
            settings: Arc::new(settings),
        }
    }

    async fn get(&self, id: Uuid) -> Result<SharedConversation, AnalysisError> {
        let conversations = self.conversations.read().await;
        match conversations.get(&id) {
            Some(conversation) => Ok(Arc::clone(conversation)),
            None => {
                warn!(conversation_id = %id, "conversation not found");
                Err(unknown_conversation(id))
            }
        }
    }
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self::new(AnalysisSettings::default())
    }
}

#[async_trait]
impl ConversationStore for ConversationRegistry {
    async fn start(&self) -> Uuid {
        let analyzer = ConversationAnalyzer::with_engine(
            Arc::clone(&self.engine),
            Arc::clone(&self.responder),
            &self.settings,
        );
        let id = analyzer.id();
        let mut conversations = self.conversations.write().await;
        conversations.insert(id, Arc::new(Mutex::new(analyzer)));
        debug!(conversation_id = %id, active = conversations.len(), "conversation started");
        id
    }

    async fn ingest(
        &self,
        id: Uuid,
        text: &str,
        speaker: Speaker,
    ) -> Result<Option<TurnOutcome>, AnalysisError> {
        let conversation = self.get(id).await?;
        let mut analyzer = conversation.lock().await;
        analyzer.ingest(text, speaker)
    }

    async fn respond(&self, id: Uuid, text: &str) -> Result<TurnOutcome, AnalysisError> {
        let conversation = self.get(id).await?;
        let mut analyzer = conversation.lock().await;
        analyzer.respond(text)
    }

    async fn summary(&self, id: Uuid) -> Result<ConversationSummary, AnalysisError> {
        let conversation = self.get(id).await?;
        let analyzer = conversation.lock().await;
        Ok(analyzer.summary())
    }

    async fn export_rows(&self, id: Uuid) -> Result<Vec<ExportRow>, AnalysisError> {
        let conversation = self.get(id).await?;
        let analyzer = conversation.lock().await;
        Ok(analyzer.export_rows())
    }

    async fn close(&self, id: Uuid) -> Result<ConversationSummary, AnalysisError> {
        let removed = self.conversations.write().await.remove(&id);
        let Some(conversation) = removed else {
            warn!(conversation_id = %id, "close requested for unknown conversation");
            return Err(unknown_conversation(id));
        };
        let mut analyzer = conversation.lock().await;
        analyzer.close()
    }

    async fn active_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}
