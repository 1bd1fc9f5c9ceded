use crate::chat_payload::ChatMessage;
use agent_system::ReplyStatus;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
pub struct ChatTurnResponse {
    pub status: ReplyStatus,
    pub history: Vec<ChatMessage>,
    /// Technical failure detail for logs and debugging; the visible notice stays generic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: error.into(),
        }
    }
}
