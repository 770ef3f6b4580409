use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS};
use tracing::debug;

use crate::config::ScraperConfig;
use crate::scraper::error::FetchError;
use crate::scraper::retry::RetryPolicy;
use crate::scraper::{Fetched, PageSource};

/// Static page fetcher: one GET per attempt, fixed retry on transient errors.
pub struct HttpClient {
    inner: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(browser_headers())
            .timeout(config.timeout())
            .gzip(true)
            .cookie_store(true)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            retry: RetryPolicy::from_config(config),
        })
    }

    async fn get_once(&self, url: &str) -> Result<Fetched, FetchError> {
        let resp = self.inner.get(url).send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(Fetched::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let text = resp.text().await.map_err(|e| FetchError::Body(e.to_string()))?;
        Ok(Fetched::Document(text))
    }
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        debug!("GET {}", url);
        self.retry.run(url, || self.get_once(url)).await
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}
