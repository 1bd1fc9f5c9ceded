mod chat_payload;
mod chat_response;
mod config;
mod render;
mod routes;

use agent_system::{AgentConfig, ConversationService, HostedAgentService};
use anyhow::Result;
use config::ServerConfig;
use routes::{build_router, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let server_config = ServerConfig::from_env()?;
    let agent_config = AgentConfig::from_env()?;
    log::info!(
        "Using coordinator agent {} at {}",
        agent_config.agent_id,
        agent_config.endpoint
    );

    let backend = Arc::new(HostedAgentService::new(agent_config)?);
    let conversation = Arc::new(ConversationService::new(backend));

    // The index is rebuilt per cited answer, so files added while running are picked up.
    if !server_config.files_dir.is_dir() {
        log::warn!(
            "Files directory {} does not exist; cited documents will not get download cards",
            server_config.files_dir.display()
        );
    }

    let app = build_router(AppState {
        conversation,
        files_dir: server_config.files_dir.clone(),
    });

    let listener = tokio::net::TcpListener::bind(server_config.address()?).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
