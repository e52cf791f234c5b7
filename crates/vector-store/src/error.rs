use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Qdrant error: {0}")]
    Qdrant(#[from] qdrant_client::QdrantError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, VectorStoreError>;
