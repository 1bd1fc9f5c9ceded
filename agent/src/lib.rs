pub mod models;
pub mod config;
pub mod error;
pub mod agent_service;
pub mod conversation;
pub mod file_index;
pub mod source_links;

pub use models::*;
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use agent_service::{AgentBackend, HostedAgentService};
pub use conversation::ConversationService;
pub use file_index::FileIndex;
pub use source_links::extract_source_links;
