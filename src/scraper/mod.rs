pub mod assembler;
pub mod browser;
pub mod cleaner;
pub mod error;
pub mod http_client;
pub mod parsers;
pub mod retry;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use crate::models::{ClubRecord, SkipReport, SwimmerRecord};

use self::error::FetchError;
use self::parsers::{SwimmerPage, parse_club_listing, parse_swimmer_page};

// ── Page sources ──────────────────────────────────────────────────────────────

/// Raw outcome of loading one URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Document(String),
    NotFound,
}

/// Swappable document source: plain HTTP or a driven browser.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError>;

    /// Release anything the source holds for the crawl's lifetime.
    async fn close(&self) -> Result<(), FetchError> {
        Ok(())
    }
}

// ── Swimmer source ────────────────────────────────────────────────────────────

/// What became of one swimmer id.
#[derive(Debug, Clone, PartialEq)]
pub enum SwimmerLookup {
    Found(SwimmerRecord, SkipReport),
    NotFound,
    Unparseable(String),
}

/// Fetch + parse + assemble, as seen by the crawl driver.
#[async_trait]
pub trait SwimmerSource: Send + Sync {
    async fn fetch_swimmer(&self, id: u32) -> Result<SwimmerLookup, FetchError>;
    async fn fetch_clubs(&self) -> Result<(Vec<ClubRecord>, SkipReport), FetchError>;
}

// ── lpin.ro ───────────────────────────────────────────────────────────────────

pub struct LpinScraper {
    pages: Box<dyn PageSource>,
    base_url: Url,
}

impl LpinScraper {
    pub fn new(pages: Box<dyn PageSource>, base_url: &str) -> Result<Self, FetchError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { pages, base_url })
    }

    /// e.g. 42 → https://lpin.ro/sportivi/detalii/42
    pub fn swimmer_url(&self, id: u32) -> Result<Url, FetchError> {
        Ok(self.base_url.join(&format!("sportivi/detalii/{}", id))?)
    }

    pub fn clubs_url(&self) -> Result<Url, FetchError> {
        Ok(self.base_url.join("cluburi")?)
    }

    pub async fn close(&self) -> Result<(), FetchError> {
        self.pages.close().await
    }
}

#[async_trait]
impl SwimmerSource for LpinScraper {
    async fn fetch_swimmer(&self, id: u32) -> Result<SwimmerLookup, FetchError> {
        let url = self.swimmer_url(id)?;
        debug!("Fetching swimmer {} ({})", id, url);

        let html = match self.pages.fetch(url.as_str()).await? {
            Fetched::Document(html) => html,
            Fetched::NotFound => return Ok(SwimmerLookup::NotFound),
        };

        Ok(match parse_swimmer_page(&html) {
            SwimmerPage::Missing => SwimmerLookup::NotFound,
            SwimmerPage::Unparseable(reason) => SwimmerLookup::Unparseable(reason),
            SwimmerPage::Parsed(parsed) => {
                let skipped = parsed.skipped;
                if skipped.total() > 0 {
                    debug!("Swimmer {}: {:?} lines skipped", id, skipped);
                }
                SwimmerLookup::Found(parsed.into_record(id), skipped)
            }
        })
    }

    async fn fetch_clubs(&self) -> Result<(Vec<ClubRecord>, SkipReport), FetchError> {
        let url = self.clubs_url()?;
        info!("Fetching club listing ({})", url);

        match self.pages.fetch(url.as_str()).await? {
            Fetched::Document(html) => Ok(parse_club_listing(&html)),
            Fetched::NotFound => {
                warn!("Club listing not found at {}", url);
                Ok((Vec::new(), SkipReport::default()))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned documents keyed by URL; every request is recorded.
    #[derive(Default)]
    pub struct FakePages {
        pub pages: HashMap<String, Fetched>,
        pub requested: Mutex<Vec<String>>,
    }

    impl FakePages {
        pub fn with(mut self, url: &str, page: Fetched) -> Self {
            self.pages.insert(url.to_string(), page);
            self
        }
    }

    #[async_trait]
    impl PageSource for FakePages {
        async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().ok_or(FetchError::Status(500))
        }
    }
}
