use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::client::PageFetcher;

/// Per-host robots.txt cache. Entries live for the whole process; a failed
/// fetch or parse is cached as an allow-all sentinel so the host is not
/// re-queried on every task.
pub struct RobotsCache {
    fetcher: Arc<dyn PageFetcher>,
    entries: RwLock<HashMap<String, Arc<RobotsRules>>>,
}

impl RobotsCache {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        let Some(host) = url.host_str().map(str::to_string) else {
            return false;
        };

        {
            let entries = self.entries.read().await;
            if let Some(rules) = entries.get(&host) {
                return rules.allows(url.path(), user_agent);
            }
        }

        let rules = self.fetch_rules(url, user_agent).await;

        // A concurrent worker may have raced us here; the first entry wins.
        let rules = self
            .entries
            .write()
            .await
            .entry(host)
            .or_insert_with(|| Arc::new(rules))
            .clone();

        rules.allows(url.path(), user_agent)
    }

    async fn fetch_rules(&self, url: &Url, user_agent: &str) -> RobotsRules {
        let mut robots_url = url.clone();
        robots_url.set_path("/robots.txt");
        robots_url.set_query(None);
        robots_url.set_fragment(None);

        debug!("Fetching robots.txt from {}", robots_url);

        match self.fetcher.fetch(&robots_url, user_agent).await {
            Ok(page) => RobotsRules::parse(&page.body),
            Err(e) => {
                warn!(
                    "Failed to fetch {}: {}. Assuming allow all.",
                    robots_url, e
                );
                RobotsRules::allow_all()
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RobotsRules {
    groups: Vec<RuleGroup>,
}

#[derive(Debug, Default)]
struct RuleGroup {
    agents: Vec<String>,
    allow: Vec<String>,
    disallow: Vec<String>,
}

impl RobotsRules {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Self {
        let mut groups: Vec<RuleGroup> = Vec::new();
        let mut current: Option<RuleGroup> = None;
        // Consecutive User-agent lines name the same group; any other
        // directive ends the name list.
        let mut accepting_agents = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_ascii_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    if !accepting_agents {
                        if let Some(group) = current.take() {
                            groups.push(group);
                        }
                        current = Some(RuleGroup::default());
                        accepting_agents = true;
                    }
                    if let Some(group) = current.as_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                }
                "allow" => {
                    accepting_agents = false;
                    if let (Some(group), false) = (current.as_mut(), value.is_empty()) {
                        group.allow.push(value.to_string());
                    }
                }
                "disallow" => {
                    accepting_agents = false;
                    // An empty Disallow means allow everything.
                    if let (Some(group), false) = (current.as_mut(), value.is_empty()) {
                        group.disallow.push(value.to_string());
                    }
                }
                _ => {
                    accepting_agents = false;
                }
            }
        }

        if let Some(group) = current.take() {
            groups.push(group);
        }

        Self { groups }
    }

    /// Answers whether `user_agent` may fetch `path`. Groups naming the
    /// agent take precedence over the `*` group; within the selected
    /// groups Allow beats Disallow.
    pub fn allows(&self, path: &str, user_agent: &str) -> bool {
        let agent = user_agent.to_ascii_lowercase();

        let specific: Vec<&RuleGroup> = self
            .groups
            .iter()
            .filter(|group| {
                group
                    .agents
                    .iter()
                    .any(|token| token != "*" && agent.contains(token.as_str()))
            })
            .collect();

        let selected: Vec<&RuleGroup> = if specific.is_empty() {
            self.groups
                .iter()
                .filter(|group| group.agents.iter().any(|token| token == "*"))
                .collect()
        } else {
            specific
        };

        for group in &selected {
            for pattern in &group.allow {
                if path_matches(path, pattern) {
                    return true;
                }
            }
        }
        for group in &selected {
            for pattern in &group.disallow {
                if path_matches(path, pattern) {
                    return false;
                }
            }
        }
        true
    }
}

/// robots.txt pattern match: `*` matches any run of characters, a trailing
/// `$` anchors the pattern to the end of the path.
fn path_matches(path: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    if let Some(anchored) = pattern.strip_suffix('$') {
        if !anchored.contains('*') {
            return path == anchored;
        }
        let (head, tail) = anchored
            .rsplit_once('*')
            .unwrap_or(("", anchored));
        if !path.ends_with(tail) {
            return false;
        }
        return prefix_match(&path[..path.len() - tail.len()], head);
    }
    prefix_match(path, pattern)
}

fn prefix_match(path: &str, pattern: &str) -> bool {
    let mut pos = 0;
    for (i, part) in pattern.split('*').enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !path.starts_with(part) {
                return false;
            }
            pos = part.len();
        } else {
            match path[pos..].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        }
    }
    true
}
