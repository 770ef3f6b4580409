//! Crawl driver: one club-listing pass, then an ascending swimmer id sweep.
//!
//! ## Sweep
//!
//! Ids are dense but the maximum is unknown, so the sweep starts at `start_id`
//! and stops after `max_consecutive_failures` misses in a row (or at `max_id`
//! when one is set). A failure is anything that does not end in a stored
//! record: not found, unparseable page, exhausted fetch retries, store error.
//! A long transient outage mid-range ends the crawl early; rerun with
//! `--start-id` to continue.
//!
//! Ids are processed strictly one at a time with a fixed pause between them.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::analytics::CompetitionCache;
use crate::config::CrawlConfig;
use crate::models::SkipReport;
use crate::scraper::{SwimmerLookup, SwimmerSource};
use crate::storage::RecordSink;

// ── State machine ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxConsecutiveFailures,
    UpperBoundReached,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::MaxConsecutiveFailures => "max-consecutive-failures",
            StopReason::UpperBoundReached => "upper-bound",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Running,
    Stopped(StopReason),
}

/// Id bookkeeping for the sweep, free of I/O.
#[derive(Debug, Clone)]
pub struct Sweep {
    next_id: u32,
    consecutive_failures: u32,
    threshold: u32,
    max_id: Option<u32>,
    state: CrawlState,
}

impl Sweep {
    pub fn new(start_id: u32, threshold: u32, max_id: Option<u32>) -> Self {
        let state = match max_id {
            Some(max) if start_id > max => CrawlState::Stopped(StopReason::UpperBoundReached),
            _ => CrawlState::Running,
        };
        Self {
            next_id: start_id,
            consecutive_failures: 0,
            threshold: threshold.max(1),
            max_id,
            state,
        }
    }

    pub fn from_config(config: &CrawlConfig, start_id: u32) -> Self {
        Self::new(start_id, config.max_consecutive_failures, config.max_id)
    }

    /// The id to process now, or `None` once stopped.
    pub fn current(&self) -> Option<u32> {
        match self.state {
            CrawlState::Running => Some(self.next_id),
            CrawlState::Stopped(_) => None,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Record the outcome for the current id and advance.
    pub fn record(&mut self, success: bool) -> CrawlState {
        if self.state != CrawlState::Running {
            return self.state;
        }

        if success {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
        }
        let done = self.next_id;
        self.next_id = self.next_id.saturating_add(1);

        if self.consecutive_failures >= self.threshold {
            self.state = CrawlState::Stopped(StopReason::MaxConsecutiveFailures);
        } else if self.max_id.is_some_and(|max| done >= max) || done == u32::MAX {
            self.state = CrawlState::Stopped(StopReason::UpperBoundReached);
        }
        self.state
    }
}

// ── Stats ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CrawlStats {
    pub clubs_stored: usize,
    pub ids_processed: usize,
    pub stored: usize,
    pub not_found: usize,
    pub unparseable: usize,
    pub fetch_errors: usize,
    pub store_errors: usize,
    pub skipped: SkipReport,
    pub last_id: Option<u32>,
    pub stop_reason: Option<StopReason>,
}

impl CrawlStats {
    pub fn failures(&self) -> usize {
        self.not_found + self.unparseable + self.fetch_errors + self.store_errors
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct Pipeline<'a> {
    source: &'a dyn SwimmerSource,
    config: CrawlConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn SwimmerSource, config: CrawlConfig) -> Self {
        Self { source, config }
    }

    /// Club pass (unless skipped), then the swimmer sweep, then a final flush.
    pub async fn run(&self, sink: &mut dyn RecordSink, start_id: u32) -> Result<CrawlStats> {
        let clubs_stored = if self.config.skip_clubs {
            0
        } else {
            info!("=== Step 1: Club listing ===");
            self.crawl_clubs(sink).await
        };

        info!("=== Step 2: Swimmers from id {} ===", start_id);
        let mut stats = self.crawl_swimmers(sink, start_id).await;
        stats.clubs_stored = clubs_stored;

        sink.finish()?;

        info!(
            "=== Done: {} ids | {} stored | {} failures ({} not found, {} unparseable, {} fetch, {} store) | {} lines skipped | stop: {} ===",
            stats.ids_processed,
            stats.stored,
            stats.failures(),
            stats.not_found,
            stats.unparseable,
            stats.fetch_errors,
            stats.store_errors,
            stats.skipped.total(),
            stats.stop_reason.map(|r| r.as_str()).unwrap_or("-"),
        );
        Ok(stats)
    }

    /// One-shot listing pass. Failures are logged, never fatal.
    pub async fn crawl_clubs(&self, sink: &mut dyn RecordSink) -> usize {
        let (clubs, skipped) = match self.source.fetch_clubs().await {
            Ok(found) => found,
            Err(e) => {
                error!("Club listing failed: {}", e);
                return 0;
            }
        };

        if skipped.clubs > 0 {
            debug!("{} club panels without a name", skipped.clubs);
        }
        if clubs.is_empty() {
            info!("No clubs found to process");
            return 0;
        }

        match sink.store_clubs(&clubs) {
            Ok(n) => n,
            Err(e) => {
                error!("Storing {} clubs failed: {:#}", clubs.len(), e);
                0
            }
        }
    }

    pub async fn crawl_swimmers(&self, sink: &mut dyn RecordSink, start_id: u32) -> CrawlStats {
        let mut sweep = Sweep::from_config(&self.config, start_id);
        let mut stats = CrawlStats::default();

        while let Some(id) = sweep.current() {
            let success = self.process_id(id, sink, &mut stats).await;
            stats.ids_processed += 1;
            stats.last_id = Some(id);

            match sweep.record(success) {
                CrawlState::Running => {
                    if !success {
                        debug!("{} consecutive failures", sweep.consecutive_failures());
                    }
                    tokio::time::sleep(self.pause()).await
                }
                CrawlState::Stopped(reason) => {
                    info!("Stopping after id {}: {}", id, reason.as_str());
                    stats.stop_reason = Some(reason);
                }
            }
        }

        if stats.stop_reason.is_none() {
            // Start id was already past the upper bound.
            stats.stop_reason = match sweep.state() {
                CrawlState::Stopped(reason) => Some(reason),
                CrawlState::Running => None,
            };
        }
        stats
    }

    async fn process_id(&self, id: u32, sink: &mut dyn RecordSink, stats: &mut CrawlStats) -> bool {
        match self.source.fetch_swimmer(id).await {
            Ok(SwimmerLookup::Found(record, skipped)) => {
                stats.skipped.merge(&skipped);
                match sink.store_swimmer(&record) {
                    Ok(()) => {
                        info!("Swimmer {} stored ({})", id, record.club_name);
                        stats.stored += 1;
                        true
                    }
                    Err(e) => {
                        error!("Saving swimmer {} failed: {:#}", id, e);
                        stats.store_errors += 1;
                        false
                    }
                }
            }
            Ok(SwimmerLookup::NotFound) => {
                info!("No swimmer with id {}", id);
                stats.not_found += 1;
                false
            }
            Ok(SwimmerLookup::Unparseable(reason)) => {
                warn!("Swimmer {}: could not extract basic info ({})", id, reason);
                stats.unparseable += 1;
                false
            }
            Err(e) => {
                warn!("Swimmer {}: fetch failed after retries: {}", id, e);
                stats.fetch_errors += 1;
                false
            }
        }
    }

    /// Re-fetch one swimmer and store it. Cached views of that swimmer are
    /// dropped once the new record is written. Returns whether it was stored.
    pub async fn refresh_swimmer(
        &self,
        sink: &mut dyn RecordSink,
        cache: &mut CompetitionCache,
        id: u32,
    ) -> Result<bool> {
        let mut stats = CrawlStats::default();
        let stored = self.process_id(id, sink, &mut stats).await;
        sink.finish()?;
        if stored {
            cache.invalidate(Some(id));
        }
        Ok(stored)
    }

    /// Fixed pause plus optional random jitter.
    fn pause(&self) -> Duration {
        let jitter = if self.config.jitter_ms > 0 {
            rand::random_range(0..=self.config.jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.config.request_delay_ms + jitter)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
