//! Deterministic cache key derivation.
//!
//! The normalized parameters are written out in a fixed field order, one
//! `name=value` line per field, then hashed with SHA-256. Strings are
//! written escaped and quoted so no value can spill into the next line.
//!
//! `cache` and `cache-ttl` only govern how the cache is read and are left
//! out of the key, so an uncached request writes the entry a later cached
//! request will find.

use std::fmt::{self, Display, Write};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::params::RequestParameters;

/// Placeholder written for unset optional fields.
const UNSET: &str = "~";

/// Hex-encoded SHA-256 fingerprint of a normalized parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CacheKey(String);

impl CacheKey {
    /// Length of the hex rendering.
    pub const LEN: usize = 64;

    /// Accept a lowercase 64-character hex string.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == Self::LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CacheKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid cache key: {value:?}"))
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Derive the cache key for a normalized parameter set.
pub fn derive_key(params: &RequestParameters) -> CacheKey {
    let mut hasher = Sha256::new();
    hasher.update(canonical_form(params).as_bytes());
    CacheKey(hex::encode(hasher.finalize()))
}

/// Fixed-order textual rendering of every content-affecting field.
fn canonical_form(p: &RequestParameters) -> String {
    let mut out = String::new();
    let mut field = |name: &str, value: &dyn Display| {
        let _ = writeln!(out, "{name}={value}");
    };

    field("url", &quoted(&p.url));
    field("full-content", &p.full_content);
    field("screenshot", &p.screenshot);
    field("user-scripts", &list(&p.user_scripts));
    field("user-scripts-timeout", &p.user_scripts_timeout);
    field("incognito", &p.incognito);
    field("timeout", &p.timeout);
    field("wait-until", &p.wait_until);
    field("sleep", &p.sleep);
    field("resource", &list(&p.resource));
    field("viewport-width", &optional(p.viewport_width));
    field("viewport-height", &optional(p.viewport_height));
    field("screen-width", &optional(p.screen_width));
    field("screen-height", &optional(p.screen_height));
    field("device", &quoted(&p.device));
    field("scroll-down", &p.scroll_down);
    field("ignore-https-errors", &p.ignore_https_errors);
    field("user-agent", &quoted(&p.user_agent));
    field("locale", &quoted(&p.locale));
    field("timezone", &quoted(&p.timezone));
    field("http-credentials", &quoted(&p.http_credentials));
    field(
        "extra-http-headers",
        &list(p.extra_http_headers.iter().map(|(name, value)| format!("{name}:{value}"))),
    );

    out
}

fn quoted(s: &str) -> String {
    format!("{s:?}")
}

fn list<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let rendered: Vec<String> = items.into_iter().map(|item| quoted(item.as_ref())).collect();
    format!("[{}]", rendered.join(","))
}

fn optional(value: Option<u32>) -> String {
    value.map_or_else(|| UNSET.to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::params::normalize;

    fn params(query: &str) -> RequestParameters {
        let raw: BTreeMap<String, String> = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        normalize(&raw, &BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_key_stability() {
        let p = params("url=https://example.com");
        assert_eq!(derive_key(&p), derive_key(&p.clone()));
    }

    #[test]
    fn test_key_format() {
        let key = derive_key(&params("url=https://example.com"));
        assert_eq!(key.as_str().len(), CacheKey::LEN);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(CacheKey::parse(key.as_str()), Some(key));
    }

    #[test]
    fn test_key_ignores_parameter_order_and_boolean_spelling() {
        let a = params("url=https://example.com&full-content=true&sleep=100&incognito=no");
        let b = params("incognito=FALSE&sleep=100&full-content=1&url=https://example.com");
        assert_eq!(derive_key(&a), derive_key(&b));
    }

    #[test]
    fn test_key_ignores_cache_read_policy() {
        let a = params("url=https://example.com");
        let b = params("url=https://example.com&cache=true&cache-ttl=5");
        assert_eq!(derive_key(&a), derive_key(&b));
    }

    #[test]
    fn test_key_matches_explicit_defaults() {
        let implicit = params("url=https://example.com");
        let explicit = params("url=https://example.com&timeout=60000&wait-until=domcontentloaded&incognito=true");
        assert_eq!(derive_key(&implicit), derive_key(&explicit));
    }

    #[test]
    fn test_key_differs_per_field() {
        let base = "url=https://example.com";
        let variants = [
            "url=https://example.org",
            "full-content=true",
            "screenshot=true",
            "user-scripts=a.js",
            "user-scripts-timeout=10",
            "incognito=false",
            "timeout=1000",
            "wait-until=load",
            "sleep=5",
            "resource=image",
            "viewport-width=800",
            "viewport-height=600",
            "screen-width=1920",
            "screen-height=1080",
            "device=iPhone",
            "scroll-down=300",
            "ignore-https-errors=false",
            "user-agent=bot",
            "locale=de-DE",
            "timezone=Europe/Berlin",
            "http-credentials=user:pass",
            "extra-http-headers=X-A:1",
        ];

        let mut keys = vec![derive_key(&params(base))];
        for variant in variants {
            let query =
                if variant.starts_with("url=") { variant.to_string() } else { format!("{base}&{variant}") };
            keys.push(derive_key(&params(&query)));
        }

        let unique: std::collections::BTreeSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_key_ignores_header_name_case() {
        let upper = params("url=https://example.com&extra-http-headers=X-A:1");
        let lower = params("url=https://example.com&extra-http-headers=x-a:1");
        assert_eq!(derive_key(&upper), derive_key(&lower));
    }

    #[test]
    fn test_key_distinguishes_script_order() {
        let ab = params("url=https://example.com&user-scripts=a.js,b.js");
        let ba = params("url=https://example.com&user-scripts=b.js,a.js");
        assert_ne!(derive_key(&ab), derive_key(&ba));
    }

    #[test]
    fn test_key_zero_viewport_differs_from_unset() {
        let a = params("url=https://example.com&viewport-width=0");
        let b = params("url=https://example.com");
        assert_ne!(derive_key(&a), derive_key(&b));
    }

    #[test]
    fn test_parse_rejects_bad_keys() {
        assert!(CacheKey::parse("abc").is_none());
        assert!(CacheKey::parse(&"G".repeat(64)).is_none());
        assert!(CacheKey::parse(&"A".repeat(64)).is_none());
        assert!(CacheKey::parse(&"a".repeat(64)).is_some());
    }
}
