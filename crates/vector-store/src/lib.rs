pub mod client;
pub mod config;
pub mod error;

pub use client::VectorStore;
pub use config::StoreConfig;
pub use error::{Result, VectorStoreError};
