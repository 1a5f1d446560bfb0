//! Article extraction from fetched HTML.
//!
//! Provides a stable extraction abstraction that can be swapped later.
//!
//! ### Content Selection
//! - `<article>`, then `<main>`, then a `div`/`section` with a content-like class,
//!   then `<body>`.
//! - Visible text drops scripts, styles and page chrome (nav, header, footer).
//!
//! ### Metadata
//! - Title, byline, excerpt and site name from `<title>` and `<meta>` tags.
//! - Open Graph and Twitter card tags collected as `og_title`, `twitter_card`, ...
//! - Published time from `<time datetime>` or known meta tags.
//!
//! ### Leniency
//! - Extraction never fails; missing signals become `None`.
//! - Output is a pure function of `(html, final_url)`.

pub mod content;
pub mod meta;

use std::collections::BTreeMap;

use scraper::Html;
use serde::Serialize;
use url::Url;

pub use content::{content_root, visible_text};
pub use meta::PageMeta;

/// Article fields derivable from HTML and the final URL alone.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedArticle {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    /// Outer HTML of the chosen content root.
    pub content: Option<String>,
    pub text_content: Option<String>,
    /// Character count of `text_content`.
    pub length: Option<usize>,
    pub lang: Option<String>,
    pub dir: Option<String>,
    pub published_time: Option<String>,
    /// Social tags; `None` when the page has none.
    pub meta: Option<BTreeMap<String, String>>,
    /// Host of the final URL.
    pub domain: Option<String>,
}

/// Stable extractor trait for article extraction.
///
/// This allows swapping the extraction engine later without changing the orchestrator.
pub trait Extractor: Send + Sync {
    /// Derive article fields from HTML.
    fn extract(&self, html: &str, final_url: &str) -> ExtractedArticle;
}

/// Heuristic extractor built on `scraper`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, html: &str, final_url: &str) -> ExtractedArticle {
        let doc = Html::parse_document(html);
        let meta = PageMeta::from_document(&doc);

        let root = content_root(&doc);
        let text = visible_text(root);
        let (text_content, length) =
            if text.is_empty() { (None, None) } else { (Some(text.clone()), Some(text.chars().count())) };

        ExtractedArticle {
            title: meta.title,
            byline: meta.byline,
            excerpt: meta.excerpt,
            site_name: meta.site_name,
            content: Some(root.html()),
            text_content,
            length,
            lang: meta.lang,
            dir: meta.dir,
            published_time: meta.published_time,
            meta: (!meta.social.is_empty()).then_some(meta.social),
            domain: domain_of(final_url),
        }
    }
}

/// Host component of `url`, if it parses.
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string))
}

/// Extract article fields using the default extractor.
///
/// This is a convenience function that uses the [`HtmlExtractor`].
pub fn extract_article(html: &str, final_url: &str) -> ExtractedArticle {
    HtmlExtractor::new().extract(html, final_url)
}
