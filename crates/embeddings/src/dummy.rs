use async_trait::async_trait;
use crawler::{EmbedError, TextEmbedder};
use tracing::warn;

use crate::config::DEFAULT_DIMENSION;

/// Offline embedder producing deterministic vectors, so runs without an
/// embedding service still exercise the full storage path.
pub struct DummyEmbedder {
    dimension: usize,
}

impl DummyEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = if dimension == 0 {
            warn!(
                "Invalid dimension 0 for dummy embedder, defaulting to {}",
                DEFAULT_DIMENSION
            );
            DEFAULT_DIMENSION
        } else {
            dimension
        };
        Self { dimension }
    }
}

#[async_trait]
impl TextEmbedder for DummyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }

        let vector = (0..self.dimension)
            .map(|i| {
                let value = (text.len() + i) as f32 * 0.01;
                value.sin()
            })
            .collect();
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
