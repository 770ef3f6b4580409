use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::scraper::error::FetchError;

/// Bounded retry with a constant pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }

    fn strategy(&self) -> std::iter::Take<FixedInterval> {
        FixedInterval::new(self.delay).take(self.max_retries as usize)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retries are spent. The last error is returned as-is.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let total = self.max_retries + 1;
        let mut attempt = 0u32;

        RetryIf::start(
            self.strategy(),
            || {
                attempt += 1;
                if attempt > 1 {
                    debug!("Retry {}/{} for {}", attempt - 1, total - 1, label);
                }
                op()
            },
            |e: &FetchError| e.is_retryable(),
        )
        .await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ScraperConfig::default())
    }
}
