//! Page fetch collaborators.
//!
//! ### Contract
//! - A [`PageFetcher`] turns a [`FetchRequest`] into the final URL, the page HTML
//!   and optional screenshot bytes.
//! - Navigation, HTTP and user-script failures are [`FetchError`]s; the engine
//!   never retries them.
//! - The orchestrator bounds every call with the request timeout, so fetchers may
//!   be cancelled at any await point.
//!
//! ### Implementations
//! - [`HttpFetcher`]: plain GET via reqwest (no scripts, no screenshots).
//! - `BrowserFetcher` (feature `render`): headless Chromium via chromiumoxide.

pub mod http;
pub mod scripts;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use bytes::Bytes;
use pagefront_core::{Error, RequestParameters, WaitUntil};
use thiserror::Error;

pub use http::{HttpFetcher, HttpFetcherConfig};
pub use scripts::{UserScript, load_user_scripts};

/// Everything a fetcher needs to load one page.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub timeout: Duration,
    pub wait_until: WaitUntil,
    pub sleep: Duration,
    pub scroll_down: u64,
    /// Loaded scripts, in execution order.
    pub user_scripts: Vec<UserScript>,
    /// Settle delay after the last user script.
    pub user_scripts_timeout: Duration,
    pub viewport: Option<(u32, u32)>,
    pub screen: Option<(u32, u32)>,
    /// Device profile name; forwarded but not applied.
    pub device: String,
    pub user_agent: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
    /// `(username, password)` parsed from `user:pass`.
    pub http_credentials: Option<(String, String)>,
    pub extra_headers: BTreeMap<String, String>,
    /// Allowed resource types; forwarded but not enforced.
    pub resource_filter: BTreeSet<String>,
    pub incognito: bool,
    pub ignore_https_errors: bool,
    pub screenshot: bool,
}

impl FetchRequest {
    pub fn from_params(params: &RequestParameters, user_scripts: Vec<UserScript>) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

        Self {
            url: params.url.clone(),
            timeout: params.fetch_timeout(),
            wait_until: params.wait_until,
            sleep: Duration::from_millis(params.sleep),
            scroll_down: params.scroll_down,
            user_scripts,
            user_scripts_timeout: Duration::from_millis(params.user_scripts_timeout),
            viewport: params.viewport_width.zip(params.viewport_height),
            screen: params.screen_width.zip(params.screen_height),
            device: params.device.clone(),
            user_agent: non_empty(&params.user_agent),
            locale: non_empty(&params.locale),
            timezone: non_empty(&params.timezone),
            http_credentials: parse_credentials(&params.http_credentials),
            extra_headers: params.extra_http_headers.clone(),
            resource_filter: params.resource.clone(),
            incognito: params.incognito,
            ignore_https_errors: params.ignore_https_errors,
            screenshot: params.screenshot,
        }
    }
}

/// Split `user:pass` at the first colon; an empty user means no credentials.
fn parse_credentials(raw: &str) -> Option<(String, String)> {
    let (user, pass) = raw.split_once(':').unwrap_or((raw, ""));
    (!user.is_empty()).then(|| (user.to_string(), pass.to_string()))
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A loaded page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub final_url: String,
    pub html: String,
    /// PNG bytes, when a screenshot was requested and supported.
    pub screenshot: Option<Bytes>,
}

/// Errors that can occur while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Failed to launch or connect to the browser.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// Navigation or network failure.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Response body exceeds the configured limit.
    #[error("response too large: {0} bytes exceeds {1}")]
    TooLarge(u64, u64),

    /// Failed to read the page content.
    #[error("content retrieval failed: {0}")]
    Content(String),

    /// A user script threw or failed to evaluate.
    #[error("user script {name} failed: {message}")]
    Script { name: String, message: String },

    /// The page did not finish loading in time.
    #[error("fetch timeout after {0}ms")]
    Timeout(u64),
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout(ms) => Error::FetchTimeout(ms),
            other => Error::FetchFailed(other.to_string()),
        }
    }
}

/// Fetch-and-render capability consumed by the orchestrator.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `request.url` and return the rendered page.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
