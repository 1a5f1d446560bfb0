//! Main-content selection and visible-text rendering.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static ARTICLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("article").expect("valid selector"));
static MAIN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("main").expect("valid selector"));
static CLASSED_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[class], section[class]").expect("valid selector"));
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("valid selector"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Class-name fragments that mark a content container, highest priority first.
const CONTAINER_CLASSES: [&str; 5] = ["article", "post", "entry", "content", "main-content"];

/// Elements whose text is never part of the visible article text.
const HIDDEN: [&str; 7] = ["script", "style", "noscript", "template", "nav", "header", "footer"];

/// Pick the element most likely to hold the article body.
///
/// Order: `<article>`, `<main>`, a `div`/`section` whose class contains one
/// of [`CONTAINER_CLASSES`], `<body>`, then the document root.
pub fn content_root(doc: &Html) -> ElementRef<'_> {
    doc.select(&ARTICLE)
        .next()
        .or_else(|| doc.select(&MAIN).next())
        .or_else(|| classed_container(doc))
        .or_else(|| doc.select(&BODY).next())
        .unwrap_or_else(|| doc.root_element())
}

fn classed_container(doc: &Html) -> Option<ElementRef<'_>> {
    CONTAINER_CLASSES.iter().find_map(|name| {
        doc.select(&CLASSED_CONTAINER).find(|el| {
            el.value().attr("class").is_some_and(|class| class.to_ascii_lowercase().contains(name))
        })
    })
}

/// Visible text under `root`: one line per non-empty text node, inner
/// whitespace collapsed to single spaces.
pub fn visible_text(root: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    collect_text(root, &mut lines);
    lines.join("\n")
}

fn collect_text(el: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if !HIDDEN.contains(&child_el.value().name()) {
                collect_text(child_el, lines);
            }
        } else if let Some(text) = child.value().as_text() {
            let collapsed = WHITESPACE.replace_all(text, " ");
            let trimmed = collapsed.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
    }
}
