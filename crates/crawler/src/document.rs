use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The record handed to the document sink, one per stored page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDocument {
    pub hash_id: String,
    pub url: String,
    pub html_source: String,
    pub main_content: String,
    pub title: String,
    pub meta_description: String,
    pub canonical_url: String,
    pub language: String,
    pub publication_timestamp: i64,
    pub headings_text: String,
    pub crawled_at: i64,
    pub content_vector: Vec<f32>,
}

/// Stable content fingerprint: SHA-256 over the main content bytes,
/// hex-encoded. De-duplication therefore ignores boilerplate variation
/// outside the extracted content.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
