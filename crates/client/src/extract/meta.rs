//! `<head>` metadata: title, byline, excerpt, language, publish time and
//! social (Open Graph / Twitter card) tags.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};

static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").expect("valid selector"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static HTML: LazyLock<Selector> = LazyLock::new(|| Selector::parse("html").expect("valid selector"));
static TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time[datetime]").expect("valid selector"));
static ITEMPROP_PUBLISHED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[itemprop="datePublished"]"#).expect("valid selector"));

const SOCIAL_PREFIXES: [&str; 2] = ["og:", "twitter:"];

/// Metadata derived from a parsed document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub lang: Option<String>,
    pub dir: Option<String>,
    pub published_time: Option<String>,
    pub social: BTreeMap<String, String>,
}

impl PageMeta {
    pub fn from_document(doc: &Html) -> Self {
        let named = named_meta(doc);
        let get = |key: &str| named.get(key).cloned();

        let title = doc
            .select(&TITLE)
            .next()
            .and_then(|t| non_empty(&t.text().collect::<String>()))
            .or_else(|| get("og:title"));

        let (lang, dir) = doc
            .select(&HTML)
            .next()
            .map(|html| (html.value().attr("lang").and_then(non_empty), html.value().attr("dir").and_then(non_empty)))
            .unwrap_or_default();

        Self {
            title,
            byline: get("author").or_else(|| get("article:author")),
            excerpt: get("description").or_else(|| get("og:description")),
            site_name: get("og:site_name"),
            lang,
            dir,
            published_time: published_time(doc, &named),
            social: social_tags(doc),
        }
    }
}

/// `<meta>` content keyed by its lower-cased `property` or `name`.
///
/// The first tag for a key wins.
fn named_meta(doc: &Html) -> BTreeMap<String, String> {
    let mut named = BTreeMap::new();
    for el in doc.select(&META) {
        let Some(content) = el.value().attr("content").and_then(non_empty) else {
            continue;
        };
        for attr in ["property", "name"] {
            if let Some(key) = el.value().attr(attr) {
                named.entry(key.trim().to_ascii_lowercase()).or_insert_with(|| content.clone());
            }
        }
    }
    named
}

/// Open Graph and Twitter card tags, keyed with `:` replaced by `_`.
///
/// Later duplicates overwrite earlier ones.
fn social_tags(doc: &Html) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    for el in doc.select(&META) {
        let Some(key) = el.value().attr("property").or_else(|| el.value().attr("name")) else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if !SOCIAL_PREFIXES.iter().any(|prefix| key.starts_with(prefix)) {
            continue;
        }
        if let Some(content) = el.value().attr("content").and_then(non_empty) {
            tags.insert(key.replace(':', "_"), content);
        }
    }
    tags
}

fn published_time(doc: &Html, named: &BTreeMap<String, String>) -> Option<String> {
    doc.select(&TIME)
        .find_map(|t| t.value().attr("datetime").and_then(non_empty))
        .or_else(|| named.get("article:published_time").cloned())
        .or_else(|| named.get("publication_date").cloned())
        .or_else(|| {
            doc.select(&ITEMPROP_PUBLISHED)
                .find_map(|el| el.value().attr("content").or_else(|| el.value().attr("datetime")).and_then(non_empty))
        })
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
