use anyhow::Result;
use std::env;
use std::time::Duration;

/// Connection settings for the hosted coordinator agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub endpoint: String,
    pub agent_id: String,
    pub api_key: String,
    pub api_version: String,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
    pub request_timeout: Duration,
}

impl AgentConfig {
    pub fn new(endpoint: impl Into<String>, agent_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            agent_id: agent_id.into(),
            api_key: api_key.into(),
            api_version: "v1".to_string(),
            poll_interval: Duration::from_millis(500),
            run_timeout: Duration::from_secs(120),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow::anyhow!("{} environment variable not set", key))
        };

        let mut config = Self::new(
            required("AGENT_ENDPOINT")?,
            required("AGENT_ID")?,
            required("AGENT_API_KEY")?,
        );

        if let Some(version) = get("AGENT_API_VERSION") {
            config.api_version = version;
        }
        if let Some(ms) = get("AGENT_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(parse_number("AGENT_POLL_INTERVAL_MS", &ms)?);
        }
        if let Some(secs) = get("AGENT_RUN_TIMEOUT_SECS") {
            config.run_timeout = Duration::from_secs(parse_number("AGENT_RUN_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get("AGENT_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_number("AGENT_REQUEST_TIMEOUT_SECS", &secs)?);
        }

        Ok(config)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a whole number, got '{}'", key, value))
}
