//! Persisted cache record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CacheKey;
use crate::Article;

/// Format marker written into every entry. Entries carrying another
/// value are treated as absent.
pub const FORMAT_VERSION: u32 = 1;

/// One cached extraction result.
///
/// Entries are never mutated in place; a refresh overwrites the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub format_version: u32,
    pub key: CacheKey,
    pub created_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub payload: Article,
}

impl CacheEntry {
    pub fn new(key: CacheKey, payload: Article, ttl_seconds: u64, created_at: DateTime<Utc>) -> Self {
        Self { format_version: FORMAT_VERSION, key, created_at, ttl_seconds, payload }
    }

    /// Whether the entry's age at `now` exceeds its TTL.
    ///
    /// An entry exactly `ttl_seconds` old is still valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age_ms = (now - self.created_at).num_milliseconds();
        let ttl_ms = i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX).saturating_mul(1000);
        age_ms > ttl_ms
    }
}
