//! Client code for pagefront.
//!
//! This crate provides the page fetch collaborators, article extraction,
//! and the request orchestrator shared by the server.

pub mod extract;
pub mod fetch;
#[cfg(feature = "render")]
pub mod render;
pub mod service;

pub use extract::{ExtractedArticle, Extractor, HtmlExtractor, extract_article};
pub use fetch::{FetchError, FetchRequest, FetchedPage, HttpFetcher, HttpFetcherConfig, PageFetcher, UserScript};
#[cfg(feature = "render")]
pub use render::{BrowserFetcher, BrowserFetcherConfig};
pub use service::{ArticleOutcome, ArticleService, CacheStatus, ServiceOptions};
