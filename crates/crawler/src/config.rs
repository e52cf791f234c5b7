use serde::{Deserialize, Serialize};

use crate::{CrawlerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub seed_urls: Vec<String>,
    pub max_depth: u32,
    pub delay_ms: u64,
    pub max_concurrency: usize,
    pub user_agents: Vec<String>,
    pub ad_link_patterns: Vec<String>,
    pub content_tags: Vec<String>,
    pub excluded_domains: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_urls: Vec::new(),
            max_depth: 2,
            delay_ms: 500,
            max_concurrency: 4,
            user_agents: Vec::new(),
            ad_link_patterns: Vec::new(),
            content_tags: Vec::new(),
            excluded_domains: Vec::new(),
        }
    }
}

impl CrawlConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(CrawlerError::InvalidConfig(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed_urls = seeds.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}
