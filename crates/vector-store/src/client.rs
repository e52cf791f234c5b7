use async_trait::async_trait;
use qdrant_client::qdrant::{
    vectors_config::Config, CreateCollection, Distance, HnswConfigDiff, PointStruct,
    UpsertPoints, VectorParams, VectorsConfig,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crawler::{DocumentSink, SinkError, WebDocument};

use crate::{Result, StoreConfig};

/// Qdrant-backed document sink. Owns schema provisioning, payload
/// truncation and the zero-vector policy, so the crawler core stays free
/// of storage concerns.
pub struct VectorStore {
    client: Qdrant,
    config: StoreConfig,
}

impl VectorStore {
    pub async fn connect(config: StoreConfig) -> Result<Self> {
        let url = config.url();
        info!("Connecting to vector store at {}", url);

        let client = Qdrant::from_url(&url).build()?;
        let store = Self { client, config };
        store.ensure_collection().await?;

        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<()> {
        let name = &self.config.collection_name;

        if self.client.collection_info(name).await.is_ok() {
            info!("Collection '{}' already exists", name);
            return Ok(());
        }

        info!("Creating collection '{}'", name);

        let create = CreateCollection {
            collection_name: name.clone(),
            vectors_config: Some(VectorsConfig {
                config: Some(Config::Params(VectorParams {
                    size: self.config.embedding_dimension as u64,
                    distance: metric_distance(&self.config.metric_type).into(),
                    ..Default::default()
                })),
            }),
            hnsw_config: index_config(&self.config.index_type, self.config.nlist),
            ..Default::default()
        };

        self.client.create_collection(create).await?;
        info!("Collection '{}' created", name);

        Ok(())
    }
}

fn metric_distance(metric_type: &str) -> Distance {
    match metric_type.to_uppercase().as_str() {
        "IP" => Distance::Dot,
        "L2" => Distance::Euclid,
        other => {
            warn!("Invalid metric_type '{}', defaulting to L2", other);
            Distance::Euclid
        }
    }
}

fn index_config(index_type: &str, nlist: usize) -> Option<HnswConfigDiff> {
    match index_type.to_uppercase().as_str() {
        "HNSW" => Some(HnswConfigDiff {
            m: Some(16),
            ef_construct: Some(200),
            ..Default::default()
        }),
        "IVF_FLAT" => {
            // Accepted for config compatibility; the engine default index
            // serves these collections and nlist is not consulted.
            info!(
                "index_type IVF_FLAT (nlist {}) mapped to the engine default index",
                nlist
            );
            None
        }
        other => {
            warn!("Unsupported index_type '{}', using the engine default", other);
            None
        }
    }
}

/// Deterministic point id from the content fingerprint: identical content
/// upserts to a single point.
fn point_id(hash_id: &str) -> String {
    hash_id
        .get(..32)
        .and_then(|hex| u128::from_str_radix(hex, 16).ok())
        .map(|value| Uuid::from_u128(value).to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        value.chars().take(max_chars).collect()
    }
}

#[async_trait]
impl DocumentSink for VectorStore {
    async fn store(&self, doc: WebDocument) -> std::result::Result<(), SinkError> {
        let dimension = self.config.embedding_dimension;

        if !doc.content_vector.is_empty() && doc.content_vector.len() != dimension {
            return Err(SinkError::Dimension {
                expected: dimension,
                got: doc.content_vector.len(),
            });
        }

        let vector = if doc.content_vector.is_empty() {
            debug!(
                "Document {} has no content vector, storing a zero placeholder",
                doc.hash_id
            );
            vec![0.0; dimension]
        } else {
            doc.content_vector.clone()
        };

        let mut payload = Payload::new();
        payload.insert("hash_id", doc.hash_id.clone());
        payload.insert("url", truncate(&doc.url, self.config.max_length_url));
        payload.insert(
            "html_source",
            truncate(&doc.html_source, self.config.max_length_html),
        );
        payload.insert(
            "main_content",
            truncate(&doc.main_content, self.config.max_length_content),
        );
        payload.insert("title", truncate(&doc.title, self.config.max_length_title));
        payload.insert(
            "meta_description",
            truncate(&doc.meta_description, self.config.max_length_meta_desc),
        );
        payload.insert(
            "canonical_url",
            truncate(&doc.canonical_url, self.config.max_length_canonical_url),
        );
        payload.insert(
            "language",
            truncate(&doc.language, self.config.max_length_language),
        );
        payload.insert("publication_timestamp", doc.publication_timestamp);
        payload.insert(
            "headings_text",
            truncate(&doc.headings_text, self.config.max_length_headings),
        );
        payload.insert("crawled_at", doc.crawled_at);

        let point = PointStruct::new(point_id(&doc.hash_id), vector, payload);
        let upsert = UpsertPoints {
            collection_name: self.config.collection_name.clone(),
            wait: Some(true),
            points: vec![point],
            ..Default::default()
        };

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| SinkError::Backend(e.to_string()))?;

        debug!("Stored document {} for {}", doc.hash_id, doc.url);
        Ok(())
    }

    async fn close(&self) {
        info!("Vector store connection closed");
    }
}
