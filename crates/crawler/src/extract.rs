use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::urls::{is_skippable_href, resolve_url};
use crate::{CrawlerError, Result};

static FALLBACK_BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article, main, section, p, h1, h2, h3").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static CANONICAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel="canonical"]"#).unwrap());
static HTML_ROOT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("html").unwrap());
static HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static PUBLISHED_TIME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="article:published_time"]"#).unwrap());
static PUBDATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="pubdate"]"#).unwrap());
static SAILTHRU_DATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="sailthru.date"]"#).unwrap());
static TIME_DATETIME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("time[datetime]").unwrap());

static WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static NEWLINE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

// Blocks shorter than this are treated as navigation chrome rather than
// prose when walking the semantic-tag fallback.
const MIN_BLOCK_CHARS: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub main_content: String,
    pub title: String,
    pub meta_description: String,
    pub canonical_url: String,
    pub language: String,
    pub publication_timestamp: i64,
    pub headings_text: String,
    pub links: Vec<Url>,
}

/// HTML-to-record extraction. Configured selectors win; without them the
/// extractor falls back to a semantic-tag walk.
pub struct Extractor {
    content_selectors: Vec<Selector>,
}

impl Extractor {
    pub fn new(content_tags: &[String]) -> Result<Self> {
        let content_selectors = content_tags
            .iter()
            .map(|tag| {
                Selector::parse(tag).map_err(|_| CrawlerError::InvalidSelector(tag.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { content_selectors })
    }

    pub fn extract(&self, html: &str, page_url: &Url) -> ExtractedPage {
        let doc = Html::parse_document(html);

        ExtractedPage {
            main_content: self.main_content(&doc),
            title: first_text(&doc, &TITLE),
            meta_description: first_attr(&doc, &META_DESCRIPTION, "content"),
            canonical_url: canonical_url(&doc, page_url),
            language: first_attr(&doc, &HTML_ROOT, "lang"),
            publication_timestamp: publication_timestamp(&doc),
            headings_text: headings_text(&doc),
            links: extract_links(&doc, page_url),
        }
    }

    fn main_content(&self, doc: &Html) -> String {
        let mut content = String::new();

        if !self.content_selectors.is_empty() {
            for selector in &self.content_selectors {
                for element in doc.select(selector) {
                    content.push_str(&element.text().collect::<String>());
                    content.push('\n');
                }
            }
        } else {
            for element in doc.select(&FALLBACK_BLOCKS) {
                let text = text_without_chrome(element);
                let text = text.trim();
                if text.chars().count() > MIN_BLOCK_CHARS {
                    content.push_str(text);
                    content.push_str("\n\n");
                }
            }
        }

        let cleaned = WHITESPACE_RUNS.replace_all(&content, " ");
        let cleaned = NEWLINE_RUNS.replace_all(&cleaned, "\n\n");
        cleaned.trim().to_string()
    }
}

/// Collects descendant text while skipping script/style/navigation
/// subtrees and ad containers.
fn text_without_chrome(element: ElementRef) -> String {
    fn walk(element: ElementRef, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => {
                    let skip = matches!(el.name(), "script" | "style" | "nav" | "footer" | "aside")
                        || el.classes().any(|class| class == "adsbygoogle");
                    if skip {
                        continue;
                    }
                    if let Some(child_element) = ElementRef::wrap(child) {
                        walk(child_element, out);
                    }
                }
                _ => {}
            }
        }
    }

    let mut out = String::new();
    walk(element, &mut out);
    out
}

fn first_text(doc: &Html, selector: &Selector) -> String {
    doc.select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn first_attr(doc: &Html, selector: &Selector, attr: &str) -> String {
    doc.select(selector)
        .find_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn canonical_url(doc: &Html, page_url: &Url) -> String {
    let href = first_attr(doc, &CANONICAL, "href");
    if href.is_empty() {
        return String::new();
    }
    match resolve_url(page_url, &href) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => String::new(),
    }
}

fn publication_timestamp(doc: &Html) -> i64 {
    let mut candidate = first_attr(doc, &PUBLISHED_TIME, "content");
    if candidate.is_empty() {
        candidate = first_attr(doc, &PUBDATE, "content");
    }
    if candidate.is_empty() {
        candidate = first_attr(doc, &SAILTHRU_DATE, "content");
    }
    if candidate.is_empty() {
        candidate = first_attr(doc, &TIME_DATETIME, "datetime");
    }
    if candidate.is_empty() {
        return 0;
    }
    parse_publication_date(&candidate).unwrap_or(0)
}

fn parse_publication_date(value: &str) -> Option<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.timestamp());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%SZ") {
        return Some(parsed.and_utc().timestamp());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return parsed
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc().timestamp());
    }
    None
}

fn headings_text(doc: &Html) -> String {
    doc.select(&HEADINGS)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn extract_links(doc: &Html, page_url: &Url) -> Vec<Url> {
    doc.select(&ANCHORS)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| !is_skippable_href(href))
        .filter_map(|href| resolve_url(page_url, href).ok())
        .collect()
}
