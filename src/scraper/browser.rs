//! Browser-driven page source for when static fetching misses client-rendered
//! markup. One browser, one page, reused for the whole crawl.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, Headers, ResourceType, SetExtraHttpHeadersParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{BrowserConfig, ScraperConfig};
use crate::scraper::error::FetchError;
use crate::scraper::retry::RetryPolicy;
use crate::scraper::{Fetched, PageSource};

pub struct ChromeSource {
    browser: Mutex<Browser>,
    page: Page,
    config: BrowserConfig,
    retry: RetryPolicy,
    handler: JoinHandle<()>,
    interceptor: Option<JoinHandle<()>>,
}

impl ChromeSource {
    pub async fn launch(browser_cfg: &BrowserConfig, scraper_cfg: &ScraperConfig) -> Result<Self, FetchError> {
        let mut builder = ChromeConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-accelerated-2d-canvas")
            .arg("--disable-gpu")
            .window_size(browser_cfg.window_width, browser_cfg.window_height)
            .request_timeout(browser_cfg.timeout());

        if !browser_cfg.headless {
            builder = builder.with_head();
        }
        if let Some(ref exe) = browser_cfg.executable {
            builder = builder.chrome_executable(exe);
        }

        let chrome_config = builder
            .build()
            .map_err(|e| FetchError::Browser(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(chrome_config).await.map_err(|e| {
            FetchError::Browser(format!(
                "failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Browser(format!("failed to open page: {}", e)))?;

        let mut source = Self {
            browser: Mutex::new(browser),
            page,
            config: browser_cfg.clone(),
            retry: RetryPolicy::from_config(scraper_cfg),
            handler,
            interceptor: None,
        };
        source.setup_page(scraper_cfg).await?;
        info!("Browser ready (headless={})", browser_cfg.headless);
        Ok(source)
    }

    async fn setup_page(&mut self, scraper_cfg: &ScraperConfig) -> Result<(), FetchError> {
        self.page
            .set_user_agent(&scraper_cfg.user_agent)
            .await
            .map_err(|e| FetchError::Browser(format!("set user agent: {}", e)))?;

        let headers = Headers::new(serde_json::json!({
            "Accept-Language": "en-US,en;q=0.9",
            "Accept": "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        }));
        self.page
            .execute(SetExtraHttpHeadersParams::new(headers))
            .await
            .map_err(|e| FetchError::Browser(format!("set headers: {}", e)))?;

        if self.config.block_resources {
            self.interceptor = Some(self.intercept_assets().await?);
        }
        Ok(())
    }

    /// Pause every request and fail the ones for images, stylesheets and fonts.
    async fn intercept_assets(&self) -> Result<JoinHandle<()>, FetchError> {
        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| FetchError::Browser(format!("request listener: {}", e)))?;

        let page = self.page.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let outcome = if is_blocked(&event.resource_type) {
                    page.execute(FailRequestParams::new(
                        event.request_id.clone(),
                        ErrorReason::BlockedByClient,
                    ))
                    .await
                    .map(|_| ())
                } else {
                    page.execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ())
                };
                if let Err(e) = outcome {
                    debug!("interception: {}", e);
                }
            }
        });

        let pattern = RequestPattern::builder().url_pattern("*").build();
        self.page
            .execute(EnableParams::builder().pattern(pattern).build())
            .await
            .map_err(|e| FetchError::Browser(format!("enable interception: {}", e)))?;

        Ok(task)
    }

    async fn navigate_once(&self, url: &str) -> Result<Fetched, FetchError> {
        let nav = async {
            self.page.goto(url).await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(self.config.timeout(), nav).await {
            Err(_) => return Err(FetchError::Timeout),
            Ok(Err(e)) => return Err(FetchError::Browser(e.to_string())),
            Ok(Ok(())) => {}
        }

        tokio::time::sleep(self.config.settle()).await;

        let html = self
            .page
            .content()
            .await
            .map_err(|e| FetchError::Browser(format!("read content: {}", e)))?;
        Ok(Fetched::Document(html))
    }
}

fn is_blocked(kind: &ResourceType) -> bool {
    matches!(kind, ResourceType::Image | ResourceType::Stylesheet | ResourceType::Font)
}

#[async_trait]
impl PageSource for ChromeSource {
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        debug!("navigate {}", url);
        self.retry.run(url, || self.navigate_once(url)).await
    }

    async fn close(&self) -> Result<(), FetchError> {
        info!("Closing browser");
        if let Some(ref task) = self.interceptor {
            task.abort();
        }
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("browser close: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!("browser wait: {}", e);
        }
        self.handler.abort();
        Ok(())
    }
}

impl Drop for ChromeSource {
    fn drop(&mut self) {
        if let Some(ref task) = self.interceptor {
            task.abort();
        }
        self.handler.abort();
    }
}
