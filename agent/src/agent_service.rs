use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::models::*;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::time::{sleep, Instant};

/// The hosted coordinator as seen from the chat front-end.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn create_thread(&self) -> AgentResult<String>;

    /// Posts `content` to the thread, runs the agent and returns its latest answer.
    async fn send_message(&self, thread_id: &str, content: &str) -> AgentResult<String>;

    async fn history(&self, thread_id: &str) -> AgentResult<Vec<ThreadMessage>>;
}

pub struct HostedAgentService {
    client: Client,
    config: AgentConfig,
}

impl HostedAgentService {
    pub fn new(config: AgentConfig) -> AgentResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.api_key)
            .query(&[("api-version", self.config.api_version.as_str())])
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> AgentResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log::warn!("Agent platform returned {}: {}", status, body);
            return Err(AgentError::from_status(status, body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn post_message(&self, thread_id: &str, content: &str) -> AgentResult<ThreadMessage> {
        let request = CreateMessageRequest {
            role: "user".to_string(),
            content: content.to_string(),
        };

        let response = self
            .authorize(self.client.post(self.url(&format!("/threads/{}/messages", thread_id))))
            .json(&request)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn create_run(&self, thread_id: &str) -> AgentResult<Run> {
        let request = CreateRunRequest {
            assistant_id: self.config.agent_id.clone(),
        };

        let response = self
            .authorize(self.client.post(self.url(&format!("/threads/{}/runs", thread_id))))
            .json(&request)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> AgentResult<Run> {
        let response = self
            .authorize(self.client.get(self.url(&format!("/threads/{}/runs/{}", thread_id, run_id))))
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Polls until the run reaches a terminal status or the run timeout passes.
    async fn wait_for_run(&self, thread_id: &str, mut run: Run) -> AgentResult<Run> {
        let deadline = Instant::now() + self.config.run_timeout;

        while !run.status.is_terminal() {
            if Instant::now() >= deadline {
                log::error!("Run {} still {} after {:?}", run.id, run.status, self.config.run_timeout);
                return Err(AgentError::RunTimedOut(self.config.run_timeout.as_secs()));
            }
            sleep(self.config.poll_interval).await;
            run = self.get_run(thread_id, &run.id).await?;
            log::debug!("Run {} status: {}", run.id, run.status);
        }

        Ok(run)
    }

    async fn list_messages(&self, thread_id: &str) -> AgentResult<Vec<ThreadMessage>> {
        let response = self
            .authorize(self.client.get(self.url(&format!("/threads/{}/messages", thread_id))))
            .query(&[("order", "asc")])
            .send()
            .await?;

        let list: MessageList = Self::read_json(response).await?;
        Ok(list.data)
    }
}

#[async_trait]
impl AgentBackend for HostedAgentService {
    async fn create_thread(&self) -> AgentResult<String> {
        let response = self
            .authorize(self.client.post(self.url("/threads")))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let thread: Thread = Self::read_json(response).await?;
        log::info!("Created new thread: {}", thread.id);
        Ok(thread.id)
    }

    async fn send_message(&self, thread_id: &str, content: &str) -> AgentResult<String> {
        self.post_message(thread_id, content).await?;
        log::info!("Sent message to thread {}", thread_id);

        let run = self.create_run(thread_id).await?;
        let run = self.wait_for_run(thread_id, run).await?;

        match run.status {
            RunStatus::Completed => {}
            RunStatus::Failed => {
                let reason = run
                    .last_error
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .unwrap_or_else(|| "unknown error".to_string());
                log::error!("Agent run failed: {}", reason);
                return Err(AgentError::RunFailed(reason));
            }
            other => return Err(AgentError::RunEnded(other)),
        }

        let messages = self.list_messages(thread_id).await?;
        // Only text written by this run counts; earlier answers stay in the thread.
        let answer = messages
            .iter()
            .filter(|m| m.is_assistant() && m.run_id.as_deref() == Some(run.id.as_str()))
            .filter_map(|m| m.last_text())
            .last()
            .map(str::to_string)
            .ok_or(AgentError::EmptyResponse)?;

        log::info!("Successfully got agent response");
        Ok(answer)
    }

    async fn history(&self, thread_id: &str) -> AgentResult<Vec<ThreadMessage>> {
        self.list_messages(thread_id).await
    }
}
