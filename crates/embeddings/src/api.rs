use std::time::Duration;

use async_trait::async_trait;
use crawler::{EmbedError, TextEmbedder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EmbedderConfig;
use crate::error::{EmbedderBuildError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embedder backed by an HTTP embedding service.
pub struct ApiEmbedder {
    endpoint: String,
    api_key: String,
    model_name: String,
    dimension: usize,
    client: reqwest::Client,
}

impl ApiEmbedder {
    pub fn new(config: &EmbedderConfig, dimension: usize) -> Result<Self> {
        if config.api_endpoint.is_empty() {
            return Err(EmbedderBuildError::MissingEndpoint);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
            model_name: config.model_name.clone(),
            dimension,
            client,
        })
    }
}

#[async_trait]
impl TextEmbedder for ApiEmbedder {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbedError> {
        if text.is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }

        debug!(
            "Embedding {} chars via {} (model {})",
            text.len(),
            self.endpoint,
            self.model_name
        );

        let mut request = self.client.post(&self.endpoint).json(&EmbedRequest {
            model: &self.model_name,
            input: text,
        });
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbedError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| EmbedError::Request(e.to_string()))?;

        let payload: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::Request(e.to_string()))?;

        if payload.embedding.len() != self.dimension {
            return Err(EmbedError::Dimension {
                expected: self.dimension,
                got: payload.embedding.len(),
            });
        }

        Ok(payload.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
