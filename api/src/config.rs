use anyhow::Result;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub files_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
            files_dir: PathBuf::from("public/files"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = env::var("CHAT_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("CHAT_PORT") {
            config.port = port
                .parse()
                .map_err(|_| anyhow::anyhow!("CHAT_PORT must be a port number, got '{}'", port))?;
        }
        if let Ok(dir) = env::var("CHAT_FILES_DIR") {
            config.files_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid address {}:{}: {}", self.host, self.port, e))
    }
}
