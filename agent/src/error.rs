use crate::models::RunStatus;
use reqwest::StatusCode;
use thiserror::Error;

pub type AgentResult<T> = std::result::Result<T, AgentError>;

pub const GENERIC_FAILURE: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";
pub const EMPTY_RESPONSE: &str =
    "I'm sorry, I didn't receive a proper response. Please try again.";
pub const THREAD_FAILURE: &str =
    "Sorry, I couldn't start a new conversation. Please try again.";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("authentication with the agent platform failed: {0}")]
    Authentication(String),

    #[error("agent platform rate limit reached: {0}")]
    RateLimited(String),

    #[error("agent platform resource not found: {0}")]
    NotFound(String),

    #[error("agent platform returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error talking to the agent platform: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response from the agent platform: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("agent run failed: {0}")]
    RunFailed(String),

    #[error("agent run ended with status {0}")]
    RunEnded(RunStatus),

    #[error("agent run did not finish within {0} seconds")]
    RunTimedOut(u64),

    #[error("no response received from agent")]
    EmptyResponse,

    #[error("failed to create conversation thread: {0}")]
    ThreadCreation(Box<AgentError>),
}

impl AgentError {
    /// Maps a non-success HTTP status and body to an error variant.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Authentication(body),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(body),
            StatusCode::NOT_FOUND => AgentError::NotFound(body),
            _ => AgentError::Api {
                status: status.as_u16(),
                message: body,
            },
        }
    }

    /// Text shown to the user in place of an answer.
    pub fn user_message(&self) -> &'static str {
        match self {
            AgentError::EmptyResponse => EMPTY_RESPONSE,
            AgentError::ThreadCreation(_) => THREAD_FAILURE,
            _ => GENERIC_FAILURE,
        }
    }
}
