//! File-backed result cache.
//!
//! - Deterministic SHA-256 keys derived from normalized request parameters
//! - One JSON entry per key with creation time, TTL and a format marker
//! - Atomic writes (temp file + rename) and fail-open reads

pub mod entry;
pub mod key;
pub mod store;

pub use entry::{CacheEntry, FORMAT_VERSION};
pub use key::{CacheKey, derive_key};
pub use store::{CacheStore, Clock, Lookup, SystemClock};
