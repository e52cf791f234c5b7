mod config;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crawler::{Crawler, DocumentSink};
use vector_store::VectorStore;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "gleaner.toml".to_string());
    let config = Config::load(Path::new(&path))
        .with_context(|| format!("failed to load configuration from {path}"))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logger.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Configuration loaded from {}", path);

    // Storage must be up before any crawling starts; a broken backend is a
    // startup failure, not something to discover per page.
    let store = tokio::time::timeout(
        Duration::from_secs(30),
        VectorStore::connect(config.vector_store.clone()),
    )
    .await
    .context("vector store initialization timed out")?
    .context("failed to initialize vector store")?;
    let sink: Arc<dyn DocumentSink> = Arc::new(store);

    let embedder = embeddings::build_embedder(
        &config.embedder,
        config.vector_store.embedding_dimension,
    )
    .context("failed to initialize embedder")?;

    let crawler = Crawler::new(config.crawler, sink.clone())
        .context("failed to initialize crawler")?
        .with_embedder(embedder);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    crawler.run(cancel).await;
    sink.close().await;

    info!("Crawling engine finished or was interrupted");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
