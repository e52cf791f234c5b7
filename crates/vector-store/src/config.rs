use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub collection_name: String,
    pub embedding_dimension: usize,
    pub max_length_url: usize,
    pub max_length_html: usize,
    pub max_length_content: usize,
    pub max_length_title: usize,
    pub max_length_meta_desc: usize,
    pub max_length_canonical_url: usize,
    pub max_length_language: usize,
    pub max_length_headings: usize,
    pub index_type: String,
    pub metric_type: String,
    pub nlist: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6334,
            collection_name: "web_documents".to_string(),
            embedding_dimension: 768,
            max_length_url: 2048,
            max_length_html: 65_535,
            max_length_content: 65_535,
            max_length_title: 512,
            max_length_meta_desc: 1024,
            max_length_canonical_url: 2048,
            max_length_language: 16,
            max_length_headings: 4096,
            index_type: "HNSW".to_string(),
            metric_type: "L2".to_string(),
            nlist: 1024,
        }
    }
}

impl StoreConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
