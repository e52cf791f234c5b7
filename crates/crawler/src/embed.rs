use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Request(String),

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },
}

/// Optional collaborator that turns extracted text into a fixed-length
/// vector. When absent, documents carry an empty vector and the sink
/// applies its zero-vector policy.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    fn dimension(&self) -> usize;
}
