//! Flat-file persistence under one data directory. Everything is pretty
//! JSON so the files stay diffable and hand-editable. A file that fails to
//! parse is treated as absent rather than aborting the run; a file that
//! cannot be read at all is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::models::{FetchStatus, History, LiveFeed, Snapshot, SourcesCache};

pub const SNAPSHOT_FILE: &str = "snapshot.json";
pub const HISTORY_FILE: &str = "history.json";
pub const FEED_FILE: &str = "live_feed.json";
pub const CACHE_FILE: &str = "sources_cache.json";
pub const STATUS_FILE: &str = "fetch_status.json";
pub const ARCHIVE_DIR: &str = "archive";

pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Could not create data dir {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.data_dir.join(name);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Could not read {}", path.display()))
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!("Ignoring unreadable file - path={} error={}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.data_dir.join(name);
        let bytes = serde_json::to_vec_pretty(value)
            .with_context(|| format!("Could not serialize {name}"))?;
        fs::write(&path, bytes)
            .with_context(|| format!("Could not write {}", path.display()))
    }

    pub fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        self.read_json(SNAPSHOT_FILE)
    }

    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.write_json(SNAPSHOT_FILE, snapshot)
    }

    pub fn load_history(&self) -> Result<History> {
        Ok(self.read_json(HISTORY_FILE)?.unwrap_or_default())
    }

    pub fn save_history(&self, history: &History) -> Result<()> {
        self.write_json(HISTORY_FILE, history)
    }

    pub fn load_feed(&self) -> Result<LiveFeed> {
        Ok(self.read_json(FEED_FILE)?.unwrap_or_default())
    }

    pub fn save_feed(&self, feed: &LiveFeed) -> Result<()> {
        self.write_json(FEED_FILE, feed)
    }

    pub fn load_cache(&self) -> Result<SourcesCache> {
        Ok(self.read_json(CACHE_FILE)?.unwrap_or_default())
    }

    pub fn save_cache(&self, cache: &SourcesCache) -> Result<()> {
        self.write_json(CACHE_FILE, cache)
    }

    pub fn load_status(&self) -> Result<Option<FetchStatus>> {
        self.read_json(STATUS_FILE)
    }

    pub fn save_status(&self, status: &FetchStatus) -> Result<()> {
        self.write_json(STATUS_FILE, status)
    }

    /// Copy of the day's snapshot under archive/YYYY-MM-DD/, keyed by the
    /// ET civil date so one directory means one dashboard day.
    pub fn archive_snapshot(&self, snapshot: &Snapshot, et_date: NaiveDate) -> Result<PathBuf> {
        let dir = self
            .data_dir
            .join(ARCHIVE_DIR)
            .join(et_date.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Could not create archive dir {}", dir.display()))?;
        let path = dir.join(SNAPSHOT_FILE);
        let bytes = serde_json::to_vec_pretty(snapshot).context("Could not serialize snapshot")?;
        fs::write(&path, bytes)
            .with_context(|| format!("Could not write {}", path.display()))?;
        Ok(path)
    }
}
