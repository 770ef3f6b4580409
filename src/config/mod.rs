use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Plain HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Browser-automation page source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Navigation timeout per page load
    #[serde(default = "default_browser_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra wait after navigation for client-side rendering
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Abort image, stylesheet and font requests
    #[serde(default = "default_true")]
    pub block_resources: bool,

    #[serde(default)]
    pub executable: Option<PathBuf>,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

/// Swimmer sweep configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlConfig {
    #[serde(default = "default_start_id")]
    pub start_id: u32,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default)]
    pub jitter_ms: u64,

    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Inclusive upper id bound; `None` sweeps until the failure streak stops it.
    #[serde(default)]
    pub max_id: Option<u32>,

    #[serde(default)]
    pub skip_clubs: bool,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_json_path")]
    pub json_path: PathBuf,

    /// JSON artifact is rewritten after this many successful extractions
    #[serde(default = "default_save_every")]
    pub save_every: usize,

    /// Abort when the store cannot be opened; otherwise crawl without persisting
    #[serde(default = "default_true")]
    pub require_store: bool,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://lpin.ro".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    2000
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}
fn default_browser_timeout_secs() -> u64 {
    30
}
fn default_settle_ms() -> u64 {
    1000
}
fn default_window_width() -> u32 {
    1920
}
fn default_window_height() -> u32 {
    1080
}
fn default_start_id() -> u32 {
    1
}
fn default_request_delay_ms() -> u64 {
    1000
}
fn default_max_consecutive_failures() -> u32 {
    10
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/lpin.duckdb")
}
fn default_json_path() -> PathBuf {
    PathBuf::from("data/swimmers.json")
}
fn default_save_every() -> usize {
    10
}
fn default_true() -> bool {
    true
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_secs: default_browser_timeout_secs(),
            settle_ms: default_settle_ms(),
            block_resources: true,
            executable: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_id: default_start_id(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: 0,
            max_consecutive_failures: default_max_consecutive_failures(),
            max_id: None,
            skip_clubs: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            json_path: default_json_path(),
            save_every: default_save_every(),
            require_store: true,
            run_migrations: true,
        }
    }
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl BrowserConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl CrawlConfig {
    /// Slower, more tolerant sweep used with the browser page source:
    /// a longer failure streak, randomised 1-3s pacing and the known id ceiling.
    pub fn browser_profile(&self) -> Self {
        Self {
            jitter_ms: self.jitter_ms.max(2000),
            max_consecutive_failures: self.max_consecutive_failures.max(50),
            max_id: self.max_id.or(Some(4136)),
            ..self.clone()
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("LPIN").separator("__"))
            .build()
            .context("Failed to read configuration sources")?;

        cfg.try_deserialize().context("Invalid configuration")
    }
}
