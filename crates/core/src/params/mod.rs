//! Request parameter normalization.
//!
//! Turns the raw query-string mapping of an article request into a fully
//! resolved [`RequestParameters`] record. Values resolve in three layers
//! (highest wins):
//!
//! 1. The raw request parameter
//! 2. The `DEFAULT_<PARAM>` environment variable
//! 3. The hard-coded default
//!
//! Unusable values fall through to the next layer instead of failing the
//! request. Only a missing or unusable `url` is an error.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Error;

mod parse;
pub mod url;

pub use parse::{env_key, parse_bool, parse_headers, parse_int, parse_list};
pub use url::{UrlError, canonicalize};

/// Every query parameter understood by the article endpoint, in documentation order.
pub const PARAM_NAMES: &[&str] = &[
    "url",
    "cache",
    "full-content",
    "screenshot",
    "user-scripts",
    "user-scripts-timeout",
    "incognito",
    "timeout",
    "wait-until",
    "sleep",
    "resource",
    "viewport-width",
    "viewport-height",
    "screen-width",
    "screen-height",
    "device",
    "scroll-down",
    "ignore-https-errors",
    "user-agent",
    "locale",
    "timezone",
    "http-credentials",
    "extra-http-headers",
];

pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_DEVICE: &str = "Desktop Chrome";

/// Page-load completion signal the fetch collaborator waits for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    Load,
    #[default]
    DomContentLoaded,
    NetworkIdle,
    Commit,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle => "networkidle",
            WaitUntil::Commit => "commit",
        }
    }
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaitUntil {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "load" => Ok(WaitUntil::Load),
            "domcontentloaded" => Ok(WaitUntil::DomContentLoaded),
            "networkidle" => Ok(WaitUntil::NetworkIdle),
            "commit" => Ok(WaitUntil::Commit),
            _ => Err(()),
        }
    }
}

/// Fully resolved options for one article request.
///
/// Every field holds either the explicit request value or its resolved
/// default; there is no partially-resolved state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParameters {
    /// Canonical target URL.
    pub url: String,
    /// Read from the cache before fetching.
    pub cache: bool,
    /// Lifetime of the cache entry written for this request.
    pub cache_ttl: u64,
    /// Echo the raw page HTML in `fullContent`.
    pub full_content: bool,
    pub screenshot: bool,
    /// User script file names, in execution order.
    pub user_scripts: Vec<String>,
    /// Settle delay after user scripts, in milliseconds.
    pub user_scripts_timeout: u64,
    pub incognito: bool,
    /// Navigation timeout in milliseconds.
    pub timeout: u64,
    pub wait_until: WaitUntil,
    /// Delay after page load, in milliseconds.
    pub sleep: u64,
    /// Allowed resource types (lower-cased).
    pub resource: BTreeSet<String>,
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub device: String,
    /// Pixels to scroll after load.
    pub scroll_down: u64,
    pub ignore_https_errors: bool,
    pub user_agent: String,
    pub locale: String,
    pub timezone: String,
    /// `username:password`, empty when unset.
    pub http_credentials: String,
    pub extra_http_headers: BTreeMap<String, String>,
}

impl RequestParameters {
    /// Navigation timeout, substituting the default for a zero value so a
    /// fetch can never run unbounded.
    pub fn fetch_timeout(&self) -> Duration {
        let ms = if self.timeout == 0 { DEFAULT_TIMEOUT_MS } else { self.timeout };
        Duration::from_millis(ms)
    }
}

/// Normalize raw request parameters against environment defaults.
///
/// `env` holds the `DEFAULT_*` variables captured at startup (see
/// [`env_defaults`]); passing it in keeps this function pure.
///
/// # Errors
///
/// - [`Error::MissingParameter`] when `url` is absent or blank
/// - [`Error::InvalidUrl`] when `url` is not an http(s) URL
pub fn normalize(raw: &BTreeMap<String, String>, env: &BTreeMap<String, String>) -> Result<RequestParameters, Error> {
    let url = raw
        .get("url")
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::MissingParameter("url".into()))?;
    let url = canonicalize(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let r = parse::Resolver::new(raw, env);

    Ok(RequestParameters {
        url: url.to_string(),
        cache: r.bool("cache", false),
        cache_ttl: r.int("cache-ttl", DEFAULT_CACHE_TTL_SECS),
        full_content: r.bool("full-content", false),
        screenshot: r.bool("screenshot", false),
        user_scripts: r.list("user-scripts"),
        user_scripts_timeout: r.int("user-scripts-timeout", 0),
        incognito: r.bool("incognito", true),
        timeout: r.int("timeout", DEFAULT_TIMEOUT_MS),
        wait_until: r.parsed("wait-until", |v| v.parse().ok(), WaitUntil::default()),
        sleep: r.int("sleep", 0),
        resource: r.set("resource"),
        viewport_width: r.optional_u32("viewport-width"),
        viewport_height: r.optional_u32("viewport-height"),
        screen_width: r.optional_u32("screen-width"),
        screen_height: r.optional_u32("screen-height"),
        device: r.string("device", DEFAULT_DEVICE),
        scroll_down: r.int("scroll-down", 0),
        ignore_https_errors: r.bool("ignore-https-errors", true),
        user_agent: r.string("user-agent", ""),
        locale: r.string("locale", ""),
        timezone: r.string("timezone", ""),
        http_credentials: r.string("http-credentials", ""),
        extra_http_headers: r.headers("extra-http-headers"),
    })
}

/// Snapshot every `DEFAULT_*` variable from the process environment.
pub fn env_defaults() -> BTreeMap<String, String> {
    std::env::vars().filter(|(key, _)| key.starts_with("DEFAULT_")).collect()
}
