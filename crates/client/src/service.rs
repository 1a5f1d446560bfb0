//! Request orchestration: normalize, consult the cache, fetch, extract, persist.
//!
//! The cache is "always write, optionally read": every fresh extraction is
//! saved, but the cache is only consulted when the request sets `cache`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use pagefront_core::article::{article_id, result_uri};
use pagefront_core::{Article, CacheKey, CacheStore, Error, RequestParameters, derive_key, normalize};

use crate::extract::{Extractor, HtmlExtractor};
use crate::fetch::{FetchRequest, FetchedPage, PageFetcher, load_user_scripts, millis};

/// Whether an article was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An article plus how it was produced.
#[derive(Debug, Clone)]
pub struct ArticleOutcome {
    pub article: Article,
    pub cache: CacheStatus,
    /// Set when the result could not be persisted.
    pub warning: Option<String>,
}

/// Filesystem locations and defaults used by [`ArticleService`].
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// `DEFAULT_*` variables captured at startup.
    pub env_defaults: BTreeMap<String, String>,
    pub user_scripts_dir: PathBuf,
    pub screenshots_dir: PathBuf,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            env_defaults: BTreeMap::new(),
            user_scripts_dir: PathBuf::from("./user_scripts"),
            screenshots_dir: PathBuf::from("./screenshots"),
        }
    }
}

/// Composes normalization, caching, fetching and extraction.
#[derive(Clone)]
pub struct ArticleService {
    store: CacheStore,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn Extractor>,
    options: ServiceOptions,
}

impl ArticleService {
    pub fn new(store: CacheStore, fetcher: Arc<dyn PageFetcher>, options: ServiceOptions) -> Self {
        Self { store, fetcher, extractor: Arc::new(HtmlExtractor::new()), options }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn fetcher_name(&self) -> &'static str {
        self.fetcher.name()
    }

    /// Produce the article for a raw query-parameter mapping.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingParameter`] / [`Error::InvalidUrl`] for an unusable `url`
    /// - [`Error::FetchFailed`] when the fetch collaborator fails
    /// - [`Error::FetchTimeout`] when it does not finish within the request timeout
    ///
    /// A failed cache write is not an error; it is reported in
    /// [`ArticleOutcome::warning`].
    pub async fn get_article(&self, raw: &BTreeMap<String, String>) -> Result<ArticleOutcome, Error> {
        let params = normalize(raw, &self.options.env_defaults)?;
        let key = derive_key(&params);

        if params.cache
            && let Some(entry) = self.store.load(&key).await
        {
            tracing::info!(url = %params.url, key = %key, "serving article from cache");
            return Ok(ArticleOutcome { article: entry.payload, cache: CacheStatus::Hit, warning: None });
        }

        let page = self.fetch(&params).await?;
        let article = self.assemble(raw, &params, &key, page).await;

        let warning = match self.store.save(&key, &article, params.cache_ttl).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to persist article, returning it uncached");
                Some(e.message())
            }
        };

        Ok(ArticleOutcome { article, cache: CacheStatus::Miss, warning })
    }

    /// Invoke the fetch collaborator, bounded by the request timeout.
    async fn fetch(&self, params: &RequestParameters) -> Result<FetchedPage, Error> {
        let scripts = load_user_scripts(&self.options.user_scripts_dir, &params.user_scripts).await;
        let request = FetchRequest::from_params(params, scripts);
        let timeout = request.timeout;

        tracing::info!(url = %request.url, fetcher = self.fetcher.name(), "fetching page");
        let start = Instant::now();

        let page = tokio::time::timeout(timeout, self.fetcher.fetch(&request))
            .await
            .map_err(|_| Error::FetchTimeout(millis(timeout)))??;

        tracing::debug!(
            url = %request.url,
            final_url = %page.final_url,
            elapsed_ms = millis(start.elapsed()),
            "page fetched"
        );
        Ok(page)
    }

    async fn assemble(
        &self, raw: &BTreeMap<String, String>, params: &RequestParameters, key: &CacheKey, page: FetchedPage,
    ) -> Article {
        let extracted = self.extractor.extract(&page.html, &page.final_url);
        let id = article_id(&page.final_url, key);

        let screenshot_uri = match &page.screenshot {
            Some(png) if params.screenshot => self.write_screenshot(key, png).await,
            _ => None,
        };

        Article {
            result_uri: result_uri(&id),
            id,
            url: page.final_url,
            domain: extracted.domain,
            title: extracted.title,
            byline: extracted.byline,
            excerpt: extracted.excerpt,
            site_name: extracted.site_name,
            content: extracted.content,
            text_content: extracted.text_content,
            length: extracted.length,
            lang: extracted.lang,
            dir: extracted.dir,
            published_time: extracted.published_time,
            full_content: params.full_content.then_some(page.html),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            query: raw.clone(),
            meta: extracted.meta,
            screenshot_uri,
        }
    }

    /// Write screenshot bytes to `<screenshots_dir>/<key>.png`.
    ///
    /// Failures are logged and yield no URI.
    async fn write_screenshot(&self, key: &CacheKey, png: &[u8]) -> Option<String> {
        let dir = &self.options.screenshots_dir;
        let file_name = format!("{key}.png");

        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(dir.join(&file_name), png).await
        }
        .await;

        match written {
            Ok(()) => Some(format!("file://screenshots/{file_name}")),
            Err(e) => {
                tracing::warn!(key = %key, dir = %dir.display(), error = %e, "failed to write screenshot");
                None
            }
        }
    }
}
