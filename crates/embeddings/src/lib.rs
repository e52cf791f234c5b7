pub mod api;
pub mod config;
pub mod dummy;
pub mod error;

pub use api::ApiEmbedder;
pub use config::{EmbedderConfig, DEFAULT_DIMENSION};
pub use dummy::DummyEmbedder;
pub use error::{EmbedderBuildError, Result};

use std::sync::Arc;

use crawler::TextEmbedder;
use tracing::info;

/// Builds the embedder selected by the configuration. The dimension comes
/// from the vector store so documents and collection always agree.
pub fn build_embedder(
    config: &EmbedderConfig,
    dimension: usize,
) -> Result<Arc<dyn TextEmbedder>> {
    info!(
        "Initializing embedder of type '{}' with dimension {}",
        config.kind, dimension
    );
    match config.kind.to_lowercase().as_str() {
        "dummy" => Ok(Arc::new(DummyEmbedder::new(dimension))),
        "api" => Ok(Arc::new(ApiEmbedder::new(config, dimension)?)),
        other => Err(EmbedderBuildError::UnsupportedType(other.to_string())),
    }
}
