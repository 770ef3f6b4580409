mod analytics;
mod config;
mod models;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::analytics::{CompetitionCache, best_times};
use crate::config::{AppConfig, CrawlConfig};
use crate::pipeline::{CrawlStats, Pipeline};
use crate::scraper::browser::ChromeSource;
use crate::scraper::http_client::HttpClient;
use crate::scraper::{LpinScraper, PageSource};
use crate::storage::{JsonFileSink, RecordSink, Repository, Store, open_store};
use crate::utils::{fmt_number, or_dash};

#[derive(Parser)]
#[command(name = "lpin-crawler", about = "lpin.ro swimmer and club crawler", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Club listing, then the swimmer id sweep, into the database
    Crawl {
        /// Drive a headless Chrome instead of plain HTTP
        #[arg(long)]
        browser: bool,

        /// Skip the club listing pass
        #[arg(long)]
        skip_clubs: bool,

        /// First swimmer id (default: crawl.start_id)
        #[arg(long)]
        start_id: Option<u32>,

        /// Last swimmer id to try
        #[arg(long)]
        max_id: Option<u32>,

        /// Stop after this many failed ids in a row
        #[arg(long)]
        max_failures: Option<u32>,

        /// Keep crawling (without saving) if the database cannot be opened
        #[arg(long, env = "LPIN_ALLOW_NO_STORE")]
        allow_no_store: bool,
    },

    /// Refresh the club listing only
    Clubs {
        #[arg(long)]
        browser: bool,
    },

    /// Sweep swimmers into a JSON file, resuming after the highest id in it
    Extract {
        #[arg(long)]
        browser: bool,

        /// Output file (default: storage.json_path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        max_id: Option<u32>,
    },

    /// Show database statistics and a few sample rows
    Stats,

    /// Competitions built from stored results, or one swimmer's view
    Competitions {
        /// External swimmer id
        #[arg(long)]
        swimmer: Option<u32>,

        /// How many competitions to list
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Re-fetch the swimmer from lpin.ro before showing it
        #[arg(long, requires = "swimmer")]
        refresh: bool,
    },

    /// Apply schema migrations without crawling
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "lpin_crawler=info,warn",
        1 => "lpin_crawler=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Crawl {
            browser,
            skip_clubs,
            start_id,
            max_id,
            max_failures,
            allow_no_store,
        } => {
            let _t = utils::Timer::start("Crawl");
            let mut crawl = crawl_config(&config, browser, max_id);
            crawl.skip_clubs |= skip_clubs;
            if let Some(n) = max_failures {
                crawl.max_consecutive_failures = n;
            }
            let start = start_id.unwrap_or(crawl.start_id);

            let require_store = config.storage.require_store && !allow_no_store;
            let mut store = open_store(&config.storage.db_path, config.storage.run_migrations, require_store)?;
            let run_id = match store.repository() {
                Some(repo) => Some(repo.begin_scrape_run()?),
                None => None,
            };

            let scraper = open_scraper(&config, browser).await?;
            let outcome = Pipeline::new(&scraper, crawl).run(store.sink(), start).await;
            shutdown(&scraper).await;
            let stats = match outcome {
                Ok(stats) => stats,
                Err(e) => {
                    if let (Some(repo), Some(run_id)) = (store.repository(), run_id) {
                        repo.fail_scrape_run(run_id, &format!("{:#}", e))?;
                    }
                    return Err(e);
                }
            };

            if let (Some(repo), Some(run_id)) = (store.repository(), run_id) {
                let reason = stats.stop_reason.map(|r| r.as_str()).unwrap_or("-");
                repo.finish_scrape_run(run_id, stats.ids_processed, stats.stored, stats.failures(), reason)?;
            }
            if let Store::Discard(discard) = &store {
                info!("{} swimmers seen, none stored", discard.swimmers_seen);
            }
            print_summary(&stats);
        }

        Command::Clubs { browser } => {
            let _t = utils::Timer::start("Club listing");
            let mut repo = Repository::open(&config.storage.db_path)?;
            repo.run_migrations()?;

            let scraper = open_scraper(&config, browser).await?;
            let stored = Pipeline::new(&scraper, config.crawl.clone()).crawl_clubs(&mut repo).await;
            shutdown(&scraper).await;
            repo.finish()?;

            println!("{} clubs stored ({} in database)", stored, fmt_number(repo.club_count()?));
        }

        Command::Extract { browser, output, max_id } => {
            let _t = utils::Timer::start("Swimmer extraction");
            let path = output.unwrap_or_else(|| config.storage.json_path.clone());
            let mut sink = JsonFileSink::open(&path, config.storage.save_every)?;

            let mut crawl = crawl_config(&config, browser, max_id);
            crawl.skip_clubs = true;
            let start = sink.resume_id().unwrap_or(crawl.start_id);
            info!("Starting extraction from id {}", start);

            let scraper = open_scraper(&config, browser).await?;
            let outcome = Pipeline::new(&scraper, crawl).run(&mut sink, start).await;
            shutdown(&scraper).await;
            let stats = outcome?;

            print_summary(&stats);
            println!("  {} swimmers in {:?}", fmt_number(sink.swimmers().len() as i64), path);
        }

        Command::Stats => {
            let repo = Repository::open(&config.storage.db_path)?;
            print_stats(&repo)?;
        }

        Command::Competitions { swimmer, limit, refresh } => {
            let mut repo = Repository::open(&config.storage.db_path)?;
            let mut cache = CompetitionCache::new();

            match swimmer {
                Some(id) => {
                    if refresh {
                        repo.run_migrations()?;
                        let scraper = open_scraper(&config, false).await?;
                        let pipeline = Pipeline::new(&scraper, config.crawl.clone());
                        let outcome = pipeline.refresh_swimmer(&mut repo, &mut cache, id).await;
                        shutdown(&scraper).await;
                        if !outcome? {
                            warn!("Swimmer {} could not be refreshed, showing stored data", id);
                        }
                    }
                    let record = repo
                        .load_swimmer(id)?
                        .with_context(|| format!("No swimmer {} in the database", id))?;
                    println!(
                        "Swimmer {} {} ({}, {}, {})",
                        id, record.name, record.gender, record.birth_year, record.club_name
                    );
                    if let Some(club_id) = repo.swimmer_club_id(id)? {
                        println!("  club #{} with {} known members", club_id, repo.club_members(club_id)?.len());
                    }
                    for (style, time) in best_times(&record) {
                        println!("  best  {:<28} {}", style, time);
                    }
                    for competition in cache.swimmer_competitions(&record) {
                        println!("  {}  {}", competition.start, competition.name);
                        for event in &competition.events {
                            println!("        {:<28} {:>10}  #{}", event.style, event.time, event.place);
                        }
                    }
                }
                None => {
                    let swimmers = repo.list_swimmers()?;
                    let competitions = cache.competitions(&swimmers);
                    println!("{} competitions from {} swimmers", competitions.len(), swimmers.len());
                    for competition in competitions.iter().take(limit) {
                        println!(
                            "  {}  {:<48} {} events",
                            competition.start,
                            competition.name,
                            competition.events.len()
                        );
                    }
                }
            }
        }

        Command::Migrate => {
            Repository::open(&config.storage.db_path)?.run_migrations()?;
            println!("Migrations applied.");
        }
    }

    Ok(())
}

fn crawl_config(config: &AppConfig, browser: bool, max_id: Option<u32>) -> CrawlConfig {
    let mut crawl = if browser {
        config.crawl.browser_profile()
    } else {
        config.crawl.clone()
    };
    if max_id.is_some() {
        crawl.max_id = max_id;
    }
    crawl
}

async fn open_scraper(config: &AppConfig, browser: bool) -> Result<LpinScraper> {
    let pages: Box<dyn PageSource> = if browser {
        info!("Launching browser");
        Box::new(ChromeSource::launch(&config.browser, &config.scraper).await?)
    } else {
        Box::new(HttpClient::new(&config.scraper)?)
    };
    Ok(LpinScraper::new(pages, &config.scraper.base_url)?)
}

async fn shutdown(scraper: &LpinScraper) {
    if let Err(e) = scraper.close().await {
        warn!("Closing page source failed: {}", e);
    }
}

fn print_summary(stats: &CrawlStats) {
    println!("─────────────────────────────────");
    println!("  Clubs stored   : {}", fmt_number(stats.clubs_stored as i64));
    println!("  Ids processed  : {}", fmt_number(stats.ids_processed as i64));
    println!("  Swimmers saved : {}", fmt_number(stats.stored as i64));
    println!("  Not found      : {}", fmt_number(stats.not_found as i64));
    println!("  Unparseable    : {}", fmt_number(stats.unparseable as i64));
    println!("  Fetch errors   : {}", fmt_number(stats.fetch_errors as i64));
    println!("  Store errors   : {}", fmt_number(stats.store_errors as i64));
    println!("  Lines skipped  : {}", fmt_number(stats.skipped.total() as i64));
    println!("  Last id        : {}", or_dash(stats.last_id));
    println!("  Stopped        : {}", or_dash(stats.stop_reason.map(|r| r.as_str())));
    println!("─────────────────────────────────");
}

fn print_stats(repo: &Repository) -> Result<()> {
    println!("─────────────────────────────────");
    println!("  lpin.ro crawl - Database Stats");
    println!("─────────────────────────────────");
    println!("  Clubs    : {}", fmt_number(repo.club_count()?));
    println!("  Swimmers : {}", fmt_number(repo.swimmer_count()?));
    println!("  Max id   : {}", or_dash(repo.max_external_id()?));
    println!("─────────────────────────────────");

    let clubs = repo.sample_clubs(5)?;
    if !clubs.is_empty() {
        println!("Sample clubs:");
        for club in &clubs {
            println!(
                "  {} ({}) - coach {}, {} members",
                club.record.name, club.record.city, club.record.coach, club.member_count
            );
        }
    }

    let swimmers = repo.list_swimmers()?;
    if !swimmers.is_empty() {
        println!("Sample swimmers:");
    }
    for swimmer in swimmers.iter().take(3) {
        println!(
            "  #{} {} {} {} - {} competitions, {} personal bests",
            swimmer.external_id,
            swimmer.gender,
            swimmer.birth_year,
            swimmer.club_name,
            swimmer.participations.len(),
            swimmer.personal_bests.len()
        );
        if let Some(best) = swimmer.personal_bests.first() {
            println!("      best: {} {} ({}, {})", best.style, best.time, best.competition, best.date);
        }
        if let Some(p) = swimmer.participations.first() {
            println!(
                "      first: {} {}..{} ({} results)",
                p.competition_name,
                p.date_range.start,
                p.date_range.end,
                p.results.len()
            );
        }
    }
    Ok(())
}
