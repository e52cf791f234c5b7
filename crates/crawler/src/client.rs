use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client as ReqwestClient;
use tracing::debug;
use url::Url;

use crate::{CrawlerError, Result};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: usize = 5;

#[derive(Debug)]
pub struct FetchedPage {
    pub body: String,
}

/// Capability surface for page retrieval, swappable in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, user_agent: &str) -> Result<FetchedPage>;
}

#[derive(Debug)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        // After the redirect cap the last response is used as-is rather than
        // surfacing a redirect error.
        let redirect_policy = Policy::custom(|attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.stop()
            } else {
                attempt.follow()
            }
        });

        let client = ReqwestClient::builder()
            .timeout(FETCH_TIMEOUT)
            .default_headers(headers)
            .redirect(redirect_policy)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &Url, user_agent: &str) -> Result<FetchedPage> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.as_str())
            .header(USER_AGENT, user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} bytes from {}", body.len(), url);

        Ok(FetchedPage { body })
    }
}
