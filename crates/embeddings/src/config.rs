use serde::{Deserialize, Serialize};

pub const DEFAULT_DIMENSION: usize = 768;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub api_endpoint: String,
    pub api_key: String,
    pub model_name: String,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            kind: "dummy".to_string(),
            api_endpoint: String::new(),
            api_key: String::new(),
            model_name: String::new(),
        }
    }
}
