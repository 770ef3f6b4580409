pub mod json_file;

use crate::models::{ClubRecord, Participation, PersonalBest, SwimmerRecord};
use anyhow::{Context, Result};
use chrono::Utc;
use duckdb::{Connection, OptionalExt, params};
use std::path::Path;
use tracing::{debug, info, warn};

pub use self::json_file::JsonFileSink;

// ── Sink trait ────────────────────────────────────────────────────────────────

/// Where crawled records end up.
pub trait RecordSink {
    /// Store the club listing; returns how many clubs were written.
    fn store_clubs(&mut self, clubs: &[ClubRecord]) -> Result<usize>;

    /// Create-or-overwrite one swimmer keyed by its external id.
    fn store_swimmer(&mut self, swimmer: &SwimmerRecord) -> Result<()>;

    /// Flush anything buffered. Called once at the end of a crawl.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Degraded mode: the crawl runs and logs, nothing is kept.
#[derive(Debug, Default)]
pub struct DiscardSink {
    pub swimmers_seen: usize,
}

impl RecordSink for DiscardSink {
    fn store_clubs(&mut self, clubs: &[ClubRecord]) -> Result<usize> {
        for club in clubs {
            debug!("Club (not stored): {}", club.name);
        }
        info!("{} clubs found (no store attached)", clubs.len());
        Ok(0)
    }

    fn store_swimmer(&mut self, swimmer: &SwimmerRecord) -> Result<()> {
        self.swimmers_seen += 1;
        info!(
            "Swimmer {} (not stored): {} {} {}, {} competitions",
            swimmer.external_id,
            swimmer.gender,
            swimmer.birth_year,
            swimmer.club_name,
            swimmer.participations.len()
        );
        Ok(())
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

const DDL: &str = r#"
CREATE SEQUENCE IF NOT EXISTS clubs_id_seq START 1;
CREATE SEQUENCE IF NOT EXISTS scrape_runs_id_seq START 1;

CREATE TABLE IF NOT EXISTS clubs (
    id          INTEGER PRIMARY KEY DEFAULT nextval('clubs_id_seq'),
    name        VARCHAR NOT NULL,
    city        VARCHAR NOT NULL DEFAULT 'Unknown',
    address     VARCHAR,
    phone       VARCHAR,
    email       VARCHAR,
    website     VARCHAR,
    coach       VARCHAR,
    scraped_at  TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS swimmers (
    external_id         INTEGER PRIMARY KEY,
    name                VARCHAR,
    gender              VARCHAR NOT NULL,
    birth_year          INTEGER NOT NULL,
    club_id             INTEGER NOT NULL,
    club_name           VARCHAR NOT NULL,
    lpin_license        VARCHAR,
    federation_license  VARCHAR,
    -- JSON arrays, page order
    participations      VARCHAR NOT NULL,
    personal_bests      VARCHAR NOT NULL,
    scraped_at          TIMESTAMP NOT NULL
);

-- Membership set; a swimmer outlives its club row
CREATE TABLE IF NOT EXISTS club_members (
    club_id     INTEGER NOT NULL,
    external_id INTEGER NOT NULL,
    PRIMARY KEY (club_id, external_id)
);

CREATE TABLE IF NOT EXISTS scrape_runs (
    id                  INTEGER PRIMARY KEY DEFAULT nextval('scrape_runs_id_seq'),
    started_at          TIMESTAMP NOT NULL,
    finished_at         TIMESTAMP,
    status              VARCHAR NOT NULL DEFAULT 'running',
    ids_processed       INTEGER DEFAULT 0,
    swimmers_stored     INTEGER DEFAULT 0,
    failures            INTEGER DEFAULT 0,
    stop_reason         VARCHAR
);

CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TIMESTAMP NOT NULL
);
"#;

const SCHEMA_VERSION: i32 = 2;

// Stores created before names were extracted (version 1).
const UPGRADES: &str = r#"
ALTER TABLE swimmers ADD COLUMN IF NOT EXISTS name VARCHAR;
"#;

const INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_clubs_name ON clubs (name);
"#;

// ── Repository ────────────────────────────────────────────────────────────────

/// A club row as stored, with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredClub {
    pub id: i64,
    pub record: ClubRecord,
    pub member_count: i64,
}

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DuckDB at {:?}", path))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn run_migrations(&self) -> Result<()> {
        info!("Running migrations…");
        self.conn.execute_batch(DDL).context("DDL failed")?;
        self.conn.execute_batch(UPGRADES).context("Schema upgrade failed")?;
        self.conn.execute_batch(INDEXES).context("Index creation failed")?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, ?)",
            params![SCHEMA_VERSION, Utc::now().naive_utc()],
        )?;
        info!("Migrations done.");
        Ok(())
    }

    // ── Clubs ─────────────────────────────────────────────────────────────────

    /// Exact-name lookup. Names are not unique in the schema; the oldest row wins.
    pub fn find_club_by_name(&self, name: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM clubs WHERE name = ? ORDER BY id LIMIT 1",
                params![name],
                |r| r.get(0),
            )
            .optional()
            .with_context(|| format!("find club {:?}", name))?;
        Ok(id)
    }

    pub fn create_club(&self, club: &ClubRecord) -> Result<i64> {
        let id = self
            .conn
            .query_row(
                r#"INSERT INTO clubs (name, city, address, phone, email, website, coach, scraped_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                   RETURNING id"#,
                params![
                    club.name, club.city, club.address, club.phone,
                    club.email, club.website, club.coach,
                    Utc::now().naive_utc(),
                ],
                |r| r.get(0),
            )
            .with_context(|| format!("create club {:?}", club.name))?;
        Ok(id)
    }

    /// Find a club by name, creating a placeholder row when absent.
    pub fn resolve_club(&self, name: &str) -> Result<i64> {
        match self.find_club_by_name(name)? {
            Some(id) => Ok(id),
            None => {
                debug!("Creating placeholder club {:?}", name);
                self.create_club(&ClubRecord::placeholder(name))
            }
        }
    }

    /// Listing pass: insert new clubs, refresh details of known ones.
    pub fn upsert_club(&self, club: &ClubRecord) -> Result<i64> {
        let Some(id) = self.find_club_by_name(&club.name)? else {
            return self.create_club(club);
        };
        self.conn
            .execute(
                r#"UPDATE clubs SET
                       city = ?, address = ?, phone = ?, email = ?,
                       website = ?, coach = ?, scraped_at = ?
                   WHERE id = ?"#,
                params![
                    club.city, club.address, club.phone, club.email,
                    club.website, club.coach, Utc::now().naive_utc(), id,
                ],
            )
            .with_context(|| format!("update club {:?}", club.name))?;
        Ok(id)
    }

    pub fn upsert_clubs(&self, clubs: &[ClubRecord]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for club in clubs {
            self.upsert_club(club)?;
        }
        tx.commit()?;
        Ok(clubs.len())
    }

    /// Idempotent: re-adding an existing member is a no-op.
    pub fn add_member(&self, club_id: i64, external_id: u32) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO club_members (club_id, external_id) VALUES (?, ?)",
            params![club_id, external_id as i64],
        )?;
        Ok(())
    }

    pub fn club_members(&self, club_id: i64) -> Result<Vec<u32>> {
        let mut stmt = self.conn.prepare(
            "SELECT external_id FROM club_members WHERE club_id = ? ORDER BY external_id",
        )?;
        let ids = stmt
            .query_map(params![club_id], |r| r.get::<_, i64>(0))?
            .filter_map(|r| r.ok())
            .map(|id| id as u32)
            .collect();
        Ok(ids)
    }

    pub fn sample_clubs(&self, limit: usize) -> Result<Vec<StoredClub>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"SELECT c.id, c.name, c.city, c.address, c.phone, c.email, c.website, c.coach,
                      (SELECT COUNT(*) FROM club_members m WHERE m.club_id = c.id)
               FROM clubs c ORDER BY c.id LIMIT {}"#,
            limit
        ))?;
        let clubs = stmt
            .query_map([], |r| {
                Ok(StoredClub {
                    id: r.get(0)?,
                    record: ClubRecord {
                        name: r.get(1)?,
                        city: r.get(2)?,
                        address: r.get::<_, Option<String>>(3)?.unwrap_or_default(),
                        phone: r.get::<_, Option<String>>(4)?.unwrap_or_default(),
                        email: r.get::<_, Option<String>>(5)?.unwrap_or_default(),
                        website: r.get::<_, Option<String>>(6)?.unwrap_or_default(),
                        coach: r.get::<_, Option<String>>(7)?.unwrap_or_default(),
                    },
                    member_count: r.get(8)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(clubs)
    }

    // ── Swimmers ──────────────────────────────────────────────────────────────

    /// Resolve the club, overwrite the swimmer keyed by external id, then
    /// record the membership. One transaction.
    pub fn upsert_swimmer(&self, swimmer: &SwimmerRecord) -> Result<i64> {
        let participations = serde_json::to_string(&swimmer.participations)?;
        let personal_bests = serde_json::to_string(&swimmer.personal_bests)?;

        let tx = self.conn.unchecked_transaction()?;
        let club_id = self.resolve_club(&swimmer.club_name)?;

        tx.execute(
            r#"INSERT INTO swimmers
                   (external_id, name, gender, birth_year, club_id, club_name,
                    lpin_license, federation_license, participations, personal_bests, scraped_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (external_id) DO UPDATE SET
                   name               = excluded.name,
                   gender             = excluded.gender,
                   birth_year         = excluded.birth_year,
                   club_id            = excluded.club_id,
                   club_name          = excluded.club_name,
                   lpin_license       = excluded.lpin_license,
                   federation_license = excluded.federation_license,
                   participations     = excluded.participations,
                   personal_bests     = excluded.personal_bests,
                   scraped_at         = excluded.scraped_at"#,
            params![
                swimmer.external_id as i64,
                swimmer.name,
                swimmer.gender,
                swimmer.birth_year,
                club_id,
                swimmer.club_name,
                swimmer.lpin_license_number,
                swimmer.federation_license_number,
                participations,
                personal_bests,
                Utc::now().naive_utc(),
            ],
        )
        .with_context(|| format!("upsert swimmer {}", swimmer.external_id))?;

        self.add_member(club_id, swimmer.external_id)?;
        tx.commit()?;
        Ok(club_id)
    }

    pub fn load_swimmer(&self, external_id: u32) -> Result<Option<SwimmerRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE external_id = ?", SWIMMER_SELECT),
                params![external_id as i64],
                swimmer_row,
            )
            .optional()?;
        row.map(SwimmerRow::into_record).transpose()
    }

    pub fn list_swimmers(&self) -> Result<Vec<SwimmerRecord>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY external_id", SWIMMER_SELECT))?;
        let rows = stmt
            .query_map([], swimmer_row)?
            .collect::<Result<Vec<_>, duckdb::Error>>()?;
        rows.into_iter().map(SwimmerRow::into_record).collect()
    }

    /// Club a stored swimmer points at.
    pub fn swimmer_club_id(&self, external_id: u32) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT club_id FROM swimmers WHERE external_id = ?",
                params![external_id as i64],
                |r| r.get(0),
            )
            .optional()?)
    }

    pub fn max_external_id(&self) -> Result<Option<u32>> {
        let max: Option<i64> = self
            .conn
            .query_row("SELECT MAX(external_id) FROM swimmers", [], |r| r.get(0))?;
        Ok(max.map(|id| id as u32))
    }

    pub fn swimmer_count(&self) -> Result<i64> {
        let mut s = self.conn.prepare("SELECT COUNT(*) FROM swimmers")?;
        Ok(s.query_row([], |r| r.get(0))?)
    }

    pub fn club_count(&self) -> Result<i64> {
        let mut s = self.conn.prepare("SELECT COUNT(*) FROM clubs")?;
        Ok(s.query_row([], |r| r.get(0))?)
    }

    // ── Scrape run log ────────────────────────────────────────────────────────

    pub fn begin_scrape_run(&self) -> Result<i64> {
        let id = self.conn.query_row(
            "INSERT INTO scrape_runs (started_at, status) VALUES (?, 'running') RETURNING id",
            params![Utc::now().naive_utc()],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    pub fn finish_scrape_run(
        &self,
        run_id: i64,
        ids_processed: usize,
        stored: usize,
        failures: usize,
        stop_reason: &str,
    ) -> Result<()> {
        self.conn.execute(
            r#"UPDATE scrape_runs SET
               finished_at = ?, status = 'finished',
               ids_processed = ?, swimmers_stored = ?, failures = ?, stop_reason = ?
               WHERE id = ?"#,
            params![
                Utc::now().naive_utc(),
                ids_processed as i64,
                stored as i64,
                failures as i64,
                stop_reason,
                run_id,
            ],
        )?;
        Ok(())
    }

    /// Close a run that ended with an error; counts stay as they were.
    pub fn fail_scrape_run(&self, run_id: i64, error: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE scrape_runs SET finished_at = ?, status = 'failed', stop_reason = ? WHERE id = ?",
            params![Utc::now().naive_utc(), error, run_id],
        )?;
        Ok(())
    }

    /// Status and stop reason of a logged run.
    pub fn scrape_run_status(&self, run_id: i64) -> Result<Option<(String, Option<String>)>> {
        Ok(self
            .conn
            .query_row(
                "SELECT status, stop_reason FROM scrape_runs WHERE id = ?",
                params![run_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?)
    }
}

const SWIMMER_SELECT: &str = r#"
    SELECT external_id, name, gender, birth_year, club_name, lpin_license, federation_license,
           participations, personal_bests
    FROM swimmers"#;

struct SwimmerRow {
    external_id: i64,
    name: Option<String>,
    gender: String,
    birth_year: i32,
    club_name: String,
    lpin_license: Option<String>,
    federation_license: Option<String>,
    participations: String,
    personal_bests: String,
}

fn swimmer_row(r: &duckdb::Row<'_>) -> duckdb::Result<SwimmerRow> {
    Ok(SwimmerRow {
        external_id: r.get(0)?,
        name: r.get(1)?,
        gender: r.get(2)?,
        birth_year: r.get(3)?,
        club_name: r.get(4)?,
        lpin_license: r.get(5)?,
        federation_license: r.get(6)?,
        participations: r.get(7)?,
        personal_bests: r.get(8)?,
    })
}

impl SwimmerRow {
    fn into_record(self) -> Result<SwimmerRecord> {
        let participations: Vec<Participation> = serde_json::from_str(&self.participations)
            .with_context(|| format!("participations of swimmer {}", self.external_id))?;
        let personal_bests: Vec<PersonalBest> = serde_json::from_str(&self.personal_bests)
            .with_context(|| format!("personal bests of swimmer {}", self.external_id))?;

        Ok(SwimmerRecord {
            external_id: self.external_id as u32,
            name: self.name.unwrap_or_default(),
            gender: self.gender,
            birth_year: self.birth_year,
            club_name: self.club_name,
            lpin_license_number: self.lpin_license.unwrap_or_default(),
            federation_license_number: self.federation_license.unwrap_or_default(),
            participations,
            personal_bests,
        })
    }
}

impl RecordSink for Repository {
    fn store_clubs(&mut self, clubs: &[ClubRecord]) -> Result<usize> {
        let n = self.upsert_clubs(clubs)?;
        info!("{} clubs stored", n);
        Ok(n)
    }

    fn store_swimmer(&mut self, swimmer: &SwimmerRecord) -> Result<()> {
        self.upsert_swimmer(swimmer)?;
        Ok(())
    }
}

/// What the crawl writes into: the database, or nothing in degraded mode.
pub enum Store {
    Database(Repository),
    Discard(DiscardSink),
}

impl Store {
    pub fn sink(&mut self) -> &mut dyn RecordSink {
        match self {
            Store::Database(repo) => repo,
            Store::Discard(discard) => discard,
        }
    }

    pub fn repository(&self) -> Option<&Repository> {
        match self {
            Store::Database(repo) => Some(repo),
            Store::Discard(_) => None,
        }
    }
}

/// Open the configured store, or fall back to [`DiscardSink`] when allowed.
pub fn open_store(path: &Path, run_migrations: bool, require_store: bool) -> Result<Store> {
    let opened = Repository::open(path).and_then(|repo| {
        if run_migrations {
            repo.run_migrations()?;
        }
        Ok(repo)
    });

    match opened {
        Ok(repo) => Ok(Store::Database(repo)),
        Err(e) if !require_store => {
            warn!("Store unavailable ({:#}); continuing without persistence", e);
            Ok(Store::Discard(DiscardSink::default()))
        }
        Err(e) => Err(e),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, Place, SwimResult, UNKNOWN};
    use chrono::NaiveDate;

    fn repo() -> Repository {
        let repo = Repository::open_in_memory().unwrap();
        repo.run_migrations().unwrap();
        repo
    }

    fn swimmer(id: u32, club: &str) -> SwimmerRecord {
        let day = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        SwimmerRecord {
            external_id: id,
            name: format!("Swimmer {}", id),
            gender: "F".into(),
            birth_year: 2005,
            club_name: club.into(),
            lpin_license_number: "LP-1".into(),
            federation_license_number: "FR-1".into(),
            participations: vec![Participation {
                competition_name: "City Cup".into(),
                date_range: DateRange { start: day, end: day.succ_opt().unwrap() },
                results: vec![SwimResult {
                    style: "50m Freestyle".into(),
                    time: "00:28:50".into(),
                    place: Place::Ranked(2),
                }],
            }],
            personal_bests: vec![PersonalBest {
                style: "50m Freestyle".into(),
                time: "00:28.50".into(),
                competition: "City Cup".into(),
                date: day,
            }],
        }
    }

    #[test]
    fn test_migrations_rerun_cleanly() {
        let repo = repo();
        repo.upsert_swimmer(&swimmer(5, "Delfinul")).unwrap();
        repo.run_migrations().unwrap();
        assert_eq!(repo.load_swimmer(5).unwrap().unwrap().name, "Swimmer 5");
    }

    #[test]
    fn test_swimmer_creates_placeholder_club() {
        let repo = repo();
        let club_id = repo.upsert_swimmer(&swimmer(42, "Aqua Stars")).unwrap();

        assert_eq!(repo.find_club_by_name("Aqua Stars").unwrap(), Some(club_id));
        let clubs = repo.sample_clubs(10).unwrap();
        assert_eq!(clubs.len(), 1);
        assert_eq!(clubs[0].record.city, UNKNOWN);
        assert_eq!(clubs[0].member_count, 1);
        assert_eq!(repo.swimmer_club_id(42).unwrap(), Some(club_id));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let repo = repo();
        let record = swimmer(42, "Aqua Stars");
        let first = repo.upsert_swimmer(&record).unwrap();
        let second = repo.upsert_swimmer(&record).unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.swimmer_count().unwrap(), 1);
        assert_eq!(repo.club_count().unwrap(), 1);
        assert_eq!(repo.club_members(first).unwrap(), vec![42]);
        assert_eq!(repo.load_swimmer(42).unwrap(), Some(record));
    }

    #[test]
    fn test_recrawl_overwrites_fields() {
        let repo = repo();
        repo.upsert_swimmer(&swimmer(7, "Delfinul")).unwrap();

        let mut changed = swimmer(7, "Delfinul");
        changed.birth_year = 2006;
        changed.name = "Renamed".into();
        changed.participations.clear();
        repo.upsert_swimmer(&changed).unwrap();

        let stored = repo.load_swimmer(7).unwrap().unwrap();
        assert_eq!(stored.birth_year, 2006);
        assert_eq!(stored.name, "Renamed");
        assert!(stored.participations.is_empty());
        assert_eq!(repo.swimmer_count().unwrap(), 1);
    }

    #[test]
    fn test_listing_club_is_reused_by_swimmers() {
        let repo = repo();
        let club = ClubRecord {
            name: "CSM Cluj".into(),
            city: "Cluj".into(),
            address: "Str. Apei 1".into(),
            phone: "0700".into(),
            email: "a@b.ro".into(),
            website: "csm.ro".into(),
            coach: "Pop".into(),
        };
        repo.upsert_clubs(std::slice::from_ref(&club)).unwrap();
        repo.upsert_clubs(std::slice::from_ref(&club)).unwrap();
        let club_id = repo.upsert_swimmer(&swimmer(3, "CSM Cluj")).unwrap();

        assert_eq!(repo.club_count().unwrap(), 1);
        let stored = repo.sample_clubs(1).unwrap().remove(0);
        assert_eq!(stored.id, club_id);
        assert_eq!(stored.record, club);
    }

    #[test]
    fn test_members_accumulate() {
        let repo = repo();
        let club_id = repo.upsert_swimmer(&swimmer(2, "Olimpia")).unwrap();
        repo.upsert_swimmer(&swimmer(1, "Olimpia")).unwrap();
        repo.add_member(club_id, 1).unwrap();

        assert_eq!(repo.club_members(club_id).unwrap(), vec![1, 2]);
        assert_eq!(repo.max_external_id().unwrap(), Some(2));
        let ids: Vec<u32> = repo.list_swimmers().unwrap().iter().map(|s| s.external_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_scrape_run_log() {
        let repo = repo();
        let run = repo.begin_scrape_run().unwrap();
        assert_eq!(repo.scrape_run_status(run).unwrap(), Some(("running".to_string(), None)));
        repo.finish_scrape_run(run, 20, 10, 10, "max-consecutive-failures").unwrap();
        assert_eq!(
            repo.scrape_run_status(run).unwrap(),
            Some(("finished".to_string(), Some("max-consecutive-failures".to_string())))
        );
    }

    #[test]
    fn test_failed_run_is_closed() {
        let repo = repo();
        let run = repo.begin_scrape_run().unwrap();
        repo.fail_scrape_run(run, "disk full").unwrap();
        assert_eq!(
            repo.scrape_run_status(run).unwrap(),
            Some(("failed".to_string(), Some("disk full".to_string())))
        );
        assert_eq!(repo.scrape_run_status(run + 100).unwrap(), None);
    }

    #[test]
    fn test_optional_store_degrades() {
        let dir = tempfile::tempdir().unwrap();
        // Parent "directory" is a plain file, so the store cannot be created.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let db_path = blocker.join("lpin.duckdb");

        let mut store = open_store(&db_path, true, false).unwrap();
        assert!(store.repository().is_none());
        store.sink().store_swimmer(&swimmer(1, "X")).unwrap();
        assert_eq!(store.sink().store_clubs(&[ClubRecord::placeholder("X")]).unwrap(), 0);

        assert!(open_store(&db_path, true, true).is_err());
    }

    #[test]
    fn test_store_opens_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir.path().join("lpin.duckdb"), true, true).unwrap();
        store.sink().store_swimmer(&swimmer(3, "Delfinul")).unwrap();
        let repo = store.repository().unwrap();
        assert_eq!(repo.swimmer_count().unwrap(), 1);
    }
}
