use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crawler::CrawlConfig;
use embeddings::EmbedderConfig;
use vector_store::StoreConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlConfig,
    pub vector_store: StoreConfig,
    pub embedder: EmbedderConfig,
    pub logger: LoggerConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&data)?;

        if config.vector_store.embedding_dimension == 0 {
            config.vector_store.embedding_dimension = embeddings::DEFAULT_DIMENSION;
        }
        if config.embedder.kind.is_empty() {
            config.embedder.kind = "dummy".to_string();
        }

        Ok(config)
    }
}
