use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        source: url::ParseError,
    },

    #[error("invalid ad pattern '{pattern}': {source}")]
    InvalidAdPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("invalid content selector '{0}'")]
    InvalidSelector(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CrawlerError>;
