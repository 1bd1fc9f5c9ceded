use crate::agent_service::AgentBackend;
use crate::error::{AgentError, AgentResult};
use crate::models::*;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A single chat with the coordinator, bound to one hosted thread at a time.
pub struct ConversationService {
    backend: Arc<dyn AgentBackend>,
    thread_id: RwLock<Option<String>>,
}

impl ConversationService {
    pub fn new(backend: Arc<dyn AgentBackend>) -> Self {
        Self {
            backend,
            thread_id: RwLock::new(None),
        }
    }

    pub async fn current_thread(&self) -> Option<String> {
        self.thread_id.read().await.clone()
    }

    pub async fn new_conversation(&self) -> AgentResult<String> {
        let id = self.backend.create_thread().await?;
        *self.thread_id.write().await = Some(id.clone());
        Ok(id)
    }

    pub async fn reset(&self) {
        if let Some(id) = self.thread_id.write().await.take() {
            log::info!("Dropped thread {}", id);
        }
    }

    /// Holds the write lock across check-and-create so concurrent first turns share one thread.
    async fn ensure_thread(&self) -> AgentResult<String> {
        let mut current = self.thread_id.write().await;
        if let Some(id) = current.as_ref() {
            return Ok(id.clone());
        }

        let id = self
            .backend
            .create_thread()
            .await
            .map_err(|e| AgentError::ThreadCreation(Box::new(e)))?;
        *current = Some(id.clone());
        Ok(id)
    }

    /// Sends one user turn. Failures come back as an error reply, never as `Err`.
    pub async fn ask(&self, content: &str) -> AgentReply {
        log::info!("Sending message to agent: {}", content);

        let result = match self.ensure_thread().await {
            Ok(thread_id) => self.backend.send_message(&thread_id, content).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => AgentReply {
                status: ReplyStatus::Success,
                response,
                error: None,
            },
            Err(e) => {
                log::error!("Error communicating with agent: {}", e);
                AgentReply {
                    status: ReplyStatus::Error,
                    response: e.user_message().to_string(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn history(&self) -> Vec<ConversationEntry> {
        let Some(thread_id) = self.current_thread().await else {
            return Vec::new();
        };

        match self.backend.history(&thread_id).await {
            Ok(messages) => messages
                .iter()
                .filter_map(|m| {
                    m.last_text().map(|text| ConversationEntry {
                        role: m.role.clone(),
                        content: text.to_string(),
                    })
                })
                .collect(),
            Err(e) => {
                log::error!("Failed to get conversation history: {}", e);
                Vec::new()
            }
        }
    }
}
