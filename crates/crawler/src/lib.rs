pub mod client;
pub mod config;
pub mod document;
pub mod embed;
pub mod engine;
pub mod error;
pub mod extract;
pub mod robots;
pub mod sink;
pub mod urls;

pub use client::{FetchedPage, HttpClient, PageFetcher};
pub use config::CrawlConfig;
pub use document::{content_hash, WebDocument};
pub use embed::{EmbedError, TextEmbedder};
pub use engine::{CrawlTask, Crawler};
pub use error::{CrawlerError, Result};
pub use extract::{ExtractedPage, Extractor};
pub use robots::RobotsCache;
pub use sink::{DocumentSink, SinkError};
