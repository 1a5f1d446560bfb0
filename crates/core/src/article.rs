//! Article record returned by the article endpoint and stored in the cache.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cache::CacheKey;

/// Normalized article content and metadata for one fetched page.
///
/// Field order is the wire order of the JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Stable identifier for a (final URL, effective parameters) pair.
    pub id: String,
    /// Final URL after redirects.
    pub url: String,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    /// HTML fragment of the main content element.
    pub content: Option<String>,
    /// Plain-text rendering of `content`.
    pub text_content: Option<String>,
    /// Character count of `text_content`.
    pub length: Option<usize>,
    pub lang: Option<String>,
    pub dir: Option<String>,
    pub published_time: Option<String>,
    /// Raw page HTML, only when requested with `full-content`.
    pub full_content: Option<String>,
    /// Extraction timestamp (RFC 3339, UTC).
    pub date: String,
    /// The raw request parameters, echoed back.
    pub query: BTreeMap<String, String>,
    /// Open Graph and Twitter card tags, keyed like `og_title`.
    pub meta: Option<BTreeMap<String, String>>,
    pub result_uri: String,
    pub screenshot_uri: Option<String>,
}

/// Derive the article id from the final URL and the request's cache key.
///
/// The id is the first 128 bits of SHA-256 over both, hex-encoded.
pub fn article_id(final_url: &str, key: &CacheKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(final_url.as_bytes());
    hasher.update(b"\n");
    hasher.update(key.as_str().as_bytes());
    hex::encode(&hasher.finalize()[..16])
}

/// URI under which an article can be referenced.
pub fn result_uri(id: &str) -> String {
    format!("api://article/{id}")
}
