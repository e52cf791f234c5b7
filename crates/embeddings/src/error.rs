use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedderBuildError {
    #[error("API endpoint is required for the api embedder")]
    MissingEndpoint,

    #[error("unsupported embedder type: {0}")]
    UnsupportedType(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, EmbedderBuildError>;
