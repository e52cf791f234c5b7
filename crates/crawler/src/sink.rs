use async_trait::async_trait;
use thiserror::Error;

use crate::WebDocument;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Where finished documents go. Implementations own schema provisioning,
/// field truncation and vector indexing; the core only hands over records
/// and logs failures.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn store(&self, doc: WebDocument) -> Result<(), SinkError>;

    /// Called exactly once at shutdown.
    async fn close(&self);
}
