//! Batch-mode sink: the whole crawl as one JSON array on disk, resumable.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::models::{ClubRecord, SwimmerRecord};
use crate::storage::RecordSink;

pub struct JsonFileSink {
    path: PathBuf,
    swimmers: Vec<SwimmerRecord>,
    save_every: usize,
    stored_this_run: usize,
}

impl JsonFileSink {
    /// Open `path`, loading previously saved swimmers if the file exists.
    pub fn open(path: &Path, save_every: usize) -> Result<Self> {
        let swimmers: Vec<SwimmerRecord> = if path.exists() {
            let text = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
            serde_json::from_str(&text).with_context(|| format!("parse {:?}", path))?
        } else {
            Vec::new()
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Could not create dir {:?}", parent))?;
        }

        info!("Loaded {} existing swimmers from {:?}", swimmers.len(), path);
        Ok(Self {
            path: path.to_path_buf(),
            swimmers,
            save_every: save_every.max(1),
            stored_this_run: 0,
        })
    }

    /// First id not yet covered: `max(existing) + 1`. `None` for an empty file,
    /// or when the file already reaches the last possible id.
    pub fn resume_id(&self) -> Option<u32> {
        self.swimmers.iter().map(|s| s.external_id).max().and_then(|id| id.checked_add(1))
    }

    pub fn swimmers(&self) -> &[SwimmerRecord] {
        &self.swimmers
    }

    /// Rewrite the whole file. Written beside the target and renamed over it.
    pub fn save(&self) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let file = fs::File::create(&tmp).with_context(|| format!("create {:?}", tmp))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, &self.swimmers)
            .with_context(|| format!("write {:?}", tmp))?;
        out.flush().with_context(|| format!("flush {:?}", tmp))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("replace {:?}", self.path))?;
        debug!("Saved {} swimmers to {:?}", self.swimmers.len(), self.path);
        Ok(())
    }
}

impl RecordSink for JsonFileSink {
    fn store_clubs(&mut self, clubs: &[ClubRecord]) -> Result<usize> {
        info!("{} clubs found; the JSON artifact holds swimmers only", clubs.len());
        Ok(0)
    }

    fn store_swimmer(&mut self, swimmer: &SwimmerRecord) -> Result<()> {
        match self.swimmers.iter_mut().find(|s| s.external_id == swimmer.external_id) {
            Some(existing) => *existing = swimmer.clone(),
            None => self.swimmers.push(swimmer.clone()),
        }

        self.stored_this_run += 1;
        if self.stored_this_run % self.save_every == 0 {
            info!("Saving after {} successful extractions", self.stored_this_run);
            self.save()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.save()?;
        info!("Final data saved ({} swimmers)", self.swimmers.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swimmer(id: u32) -> SwimmerRecord {
        SwimmerRecord {
            external_id: id,
            name: format!("Swimmer {}", id),
            gender: "M".into(),
            birth_year: 2010,
            club_name: "Delfinul".into(),
            lpin_license_number: String::new(),
            federation_license_number: String::new(),
            participations: vec![],
            personal_bests: vec![],
        }
    }

    fn saved_ids(path: &Path) -> Vec<u32> {
        let text = fs::read_to_string(path).unwrap();
        let saved: Vec<SwimmerRecord> = serde_json::from_str(&text).unwrap();
        saved.iter().map(|s| s.external_id).collect()
    }

    #[test]
    fn test_fresh_file_has_no_resume_point() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::open(&dir.path().join("out/swimmers.json"), 10).unwrap();
        assert_eq!(sink.resume_id(), None);
        assert!(dir.path().join("out").is_dir());
    }

    #[test]
    fn test_saves_on_cadence_and_at_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swimmers.json");
        let mut sink = JsonFileSink::open(&path, 2).unwrap();

        sink.store_swimmer(&swimmer(1)).unwrap();
        assert!(!path.exists());
        sink.store_swimmer(&swimmer(2)).unwrap();
        assert_eq!(saved_ids(&path), vec![1, 2]);

        sink.store_swimmer(&swimmer(3)).unwrap();
        assert_eq!(saved_ids(&path), vec![1, 2]);
        sink.finish().unwrap();
        assert_eq!(saved_ids(&path), vec![1, 2, 3]);
    }

    #[test]
    fn test_resume_from_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swimmers.json");
        {
            let mut sink = JsonFileSink::open(&path, 10).unwrap();
            for id in [4, 9, 6] {
                sink.store_swimmer(&swimmer(id)).unwrap();
            }
            sink.finish().unwrap();
        }

        let sink = JsonFileSink::open(&path, 10).unwrap();
        assert_eq!(sink.swimmers().len(), 3);
        assert_eq!(sink.resume_id(), Some(10));
    }

    #[test]
    fn test_resume_at_last_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonFileSink::open(&dir.path().join("s.json"), 10).unwrap();
        sink.store_swimmer(&swimmer(u32::MAX)).unwrap();
        assert_eq!(sink.resume_id(), None);
    }

    #[test]
    fn test_name_survives_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let mut sink = JsonFileSink::open(&path, 10).unwrap();
        let mut named = swimmer(8);
        named.name = "Ana Ionescu".into();
        sink.store_swimmer(&named).unwrap();
        sink.finish().unwrap();

        let reloaded = JsonFileSink::open(&path, 10).unwrap();
        assert_eq!(reloaded.swimmers()[0], named);
    }

    #[test]
    fn test_older_artifact_without_names_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let legacy = r#"[{"external_id": 3, "gender": "M", "birth_year": 2010, "club_name": "Delfinul",
            "lpin_license_number": "", "federation_license_number": "",
            "participations": [], "personal_bests": []}]"#;
        fs::write(&path, legacy).unwrap();

        let sink = JsonFileSink::open(&path, 10).unwrap();
        assert_eq!(sink.swimmers()[0].name, "");
        assert_eq!(sink.resume_id(), Some(4));
    }

    #[test]
    fn test_same_id_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonFileSink::open(&dir.path().join("s.json"), 10).unwrap();
        sink.store_swimmer(&swimmer(5)).unwrap();

        let mut newer = swimmer(5);
        newer.birth_year = 2011;
        sink.store_swimmer(&newer).unwrap();

        assert_eq!(sink.swimmers().len(), 1);
        assert_eq!(sink.swimmers()[0].birth_year, 2011);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "{not json").unwrap();
        assert!(JsonFileSink::open(&path, 10).is_err());
    }
}
