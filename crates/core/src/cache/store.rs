//! File-backed result cache.
//!
//! One JSON file per key, `<root>/<key>.json`. Writes go to a temporary
//! file in the same directory which is then renamed over the final path,
//! so a concurrent reader sees either the previous entry or the new one.
//!
//! Reads fail open: a missing, expired, corrupt, or unreadable entry is
//! reported as absent and the caller fetches afresh.

use std::fmt::Debug;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::entry::{CacheEntry, FORMAT_VERSION};
use super::CacheKey;
use crate::{Article, Error};

/// Source of wall-clock time for expiry checks.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result of looking up a key, before collapsing to hit/absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(Box<CacheEntry>),
    Missing,
    Expired,
    /// Bytes on disk that do not decode to a current-format entry for this key.
    Corrupt,
    /// The file exists but could not be read.
    Unreadable,
}

/// Result cache rooted at a directory.
#[derive(Clone, Debug)]
pub struct CacheStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Open a cache rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| Error::Storage(format!("cannot create cache root {}: {e}", root.display())))?;

        Ok(Self { root, clock: Arc::new(SystemClock) })
    }

    /// Replace the clock used for timestamps and expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the entry for `key`.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Persist `result` under `key`, replacing any existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the entry cannot be written.
    pub async fn save(&self, key: &CacheKey, result: &Article, ttl_seconds: u64) -> Result<(), Error> {
        let entry = CacheEntry::new(key.clone(), result.clone(), ttl_seconds, self.clock.now());
        let bytes = serde_json::to_vec(&entry).map_err(|e| Error::Storage(format!("cannot encode entry: {e}")))?;

        let root = self.root.clone();
        let path = self.entry_path(key);

        tokio::task::spawn_blocking(move || -> Result<(), Error> {
            let mut tmp = tempfile::Builder::new()
                .prefix(".entry-")
                .suffix(".tmp")
                .tempfile_in(&root)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| Error::Storage(e.error.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Storage(format!("cache write task failed: {e}")))??;

        tracing::debug!(key = %key, ttl_seconds, "cache entry written");
        Ok(())
    }

    /// Load the entry for `key` if it exists, decodes, and has not expired.
    pub async fn load(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.lookup(key).await {
            Lookup::Hit(entry) => Some(*entry),
            _ => None,
        }
    }

    /// Look up `key`, distinguishing the reasons an entry is absent.
    pub async fn lookup(&self, key: &CacheKey) -> Lookup {
        let path = self.entry_path(key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(key = %key, "cache miss");
                return Lookup::Missing;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache entry unreadable, treating as miss");
                return Lookup::Unreadable;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache entry corrupt, treating as miss");
                return Lookup::Corrupt;
            }
        };

        if entry.format_version != FORMAT_VERSION || &entry.key != key {
            tracing::warn!(
                key = %key,
                format_version = entry.format_version,
                "cache entry has incompatible format or key, treating as miss"
            );
            return Lookup::Corrupt;
        }

        if entry.is_expired(self.clock.now()) {
            tracing::debug!(key = %key, ttl_seconds = entry.ttl_seconds, "cache entry expired");
            return Lookup::Expired;
        }

        tracing::debug!(key = %key, "cache hit");
        Lookup::Hit(Box::new(entry))
    }
}
