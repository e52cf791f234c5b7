use rand::Rng;
use regex::Regex;
use url::Url;

use crate::{CrawlerError, Result};

pub const DEFAULT_USER_AGENT: &str = "GleanerBot/1.0 (+https://example.com/bot)";

/// Resolves a possibly-relative href against a base URL. Absolute inputs
/// pass through unchanged, so the operation is idempotent.
pub fn resolve_url(base: &Url, href: &str) -> std::result::Result<Url, url::ParseError> {
    base.join(href)
}

/// Hrefs that can never become crawl targets: fragment jumps and
/// javascript pseudo-links.
pub fn is_skippable_href(href: &str) -> bool {
    href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:")
}

pub fn same_host(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Suffix match against the configured blocklist, so `b.com` also covers
/// `sub.b.com`.
pub fn is_excluded_host(url: &Url, excluded_domains: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    excluded_domains
        .iter()
        .any(|suffix| !suffix.is_empty() && host.ends_with(suffix.as_str()))
}

pub fn select_user_agent(user_agents: &[String]) -> String {
    if user_agents.is_empty() {
        return DEFAULT_USER_AGENT.to_string();
    }
    let index = rand::rng().random_range(0..user_agents.len());
    user_agents[index].clone()
}

#[derive(Debug, Default)]
pub struct AdPatternSet {
    patterns: Vec<Regex>,
}

impl AdPatternSet {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| CrawlerError::InvalidAdPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, url: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(url))
    }
}
