use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio::sync::Notify;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::{HttpClient, PageFetcher};
use crate::config::CrawlConfig;
use crate::document::{content_hash, WebDocument};
use crate::embed::TextEmbedder;
use crate::extract::{ExtractedPage, Extractor};
use crate::robots::RobotsCache;
use crate::sink::DocumentSink;
use crate::urls::{self, AdPatternSet};
use crate::{CrawlerError, Result};

// Bounded frontier: capacity scales with the worker count so bursts of
// discovered links are absorbed without unbounded memory growth.
const QUEUE_CAPACITY_PER_WORKER: usize = 10;

#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: u32,
}

pub struct Crawler {
    config: CrawlConfig,
    seeds: Vec<Url>,
    fetcher: Arc<dyn PageFetcher>,
    robots: RobotsCache,
    sink: Arc<dyn DocumentSink>,
    embedder: Option<Arc<dyn TextEmbedder>>,
    ad_patterns: AdPatternSet,
    extractor: Extractor,
    visited: Mutex<HashSet<String>>,
    // Tasks enqueued but not yet completed (drops included). The pool is
    // done when this reaches zero; a wait-group over workers alone cannot
    // detect that, because workers are also producers.
    in_flight: AtomicUsize,
    work_done: Notify,
}

impl Crawler {
    pub fn new(config: CrawlConfig, sink: Arc<dyn DocumentSink>) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpClient::new()?);
        Self::with_fetcher(config, sink, fetcher)
    }

    /// Same as [`Crawler::new`] but with an injected fetcher, shared by
    /// page and robots.txt retrieval.
    pub fn with_fetcher(
        config: CrawlConfig,
        sink: Arc<dyn DocumentSink>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self> {
        config.validate()?;

        let seeds = config
            .seed_urls
            .iter()
            .map(|seed| {
                Url::parse(seed).map_err(|source| CrawlerError::InvalidSeed {
                    url: seed.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let ad_patterns = AdPatternSet::compile(&config.ad_link_patterns)?;
        let extractor = Extractor::new(&config.content_tags)?;
        let robots = RobotsCache::new(fetcher.clone());

        Ok(Self {
            config,
            seeds,
            fetcher,
            robots,
            sink,
            embedder: None,
            ad_patterns,
            extractor,
            visited: Mutex::new(HashSet::new()),
            in_flight: AtomicUsize::new(0),
            work_done: Notify::new(),
        })
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn TextEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Runs the crawl to completion. Returns once the frontier is drained
    /// and every worker is idle, or shortly after `cancel` fires; either
    /// way no background work remains.
    pub async fn run(self, cancel: CancellationToken) {
        info!("Crawler starting with {} seed(s)", self.seeds.len());

        let crawler = Arc::new(self);
        let capacity = crawler.config.max_concurrency * QUEUE_CAPACITY_PER_WORKER;
        let (tx, rx) = mpsc::channel::<CrawlTask>(capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let stop = CancellationToken::new();

        // Seeds are marked visited and enqueued before any worker starts
        // consuming.
        for seed in crawler.seeds.clone() {
            crawler.enqueue(&tx, CrawlTask { url: seed, depth: 0 });
        }

        if crawler.in_flight.load(Ordering::SeqCst) == 0 {
            info!("No tasks to crawl");
            return;
        }

        let mut workers = Vec::with_capacity(crawler.config.max_concurrency);
        for id in 0..crawler.config.max_concurrency {
            let worker = Worker {
                crawler: crawler.clone(),
                queue: rx.clone(),
                tx: tx.clone(),
                stop: stop.clone(),
            };
            workers.push(tokio::spawn(worker.run(id)));
        }

        loop {
            if crawler.in_flight.load(Ordering::SeqCst) == 0 {
                break;
            }
            tokio::select! {
                _ = crawler.work_done.notified() => {}
                _ = cancel.cancelled() => {
                    info!("Cancellation requested, stopping workers");
                    break;
                }
            }
        }

        // Wake every worker out of its current suspension point; queued
        // tasks left behind are discarded with the channel.
        stop.cancel();
        for handle in workers {
            let _ = handle.await;
        }

        info!("Crawler finished");
    }

    /// Admission control for the frontier: visited-set insertion happens
    /// before the send, so a URL can be enqueued at most once even under
    /// races. A full queue sheds the task instead of blocking, since the
    /// caller may itself be a worker.
    fn enqueue(&self, tx: &Sender<CrawlTask>, task: CrawlTask) -> bool {
        if !self.visited.lock().insert(task.url.to_string()) {
            return false;
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        match tx.try_send(task) {
            Ok(()) => true,
            Err(TrySendError::Full(task)) | Err(TrySendError::Closed(task)) => {
                warn!("Task queue full, dropping link: {}", task.url);
                self.task_finished();
                false
            }
        }
    }

    fn task_finished(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.work_done.notify_one();
        }
    }
}

struct Worker {
    crawler: Arc<Crawler>,
    queue: Arc<tokio::sync::Mutex<Receiver<CrawlTask>>>,
    tx: Sender<CrawlTask>,
    stop: CancellationToken,
}

impl Worker {
    async fn run(self, id: usize) {
        debug!(worker = id, "Worker started");
        loop {
            let task = tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                task = Self::next_task(&self.queue) => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            if task.depth > self.crawler.config.max_depth {
                debug!(worker = id, "Dropping over-depth task: {}", task.url);
                self.crawler.task_finished();
                continue;
            }

            let processed = tokio::select! {
                biased;
                _ = self.stop.cancelled() => false,
                _ = self.process(&task) => true,
            };
            self.crawler.task_finished();

            // Per-worker politeness delay after each page.
            if processed && self.crawler.config.delay_ms > 0 {
                tokio::select! {
                    _ = self.stop.cancelled() => break,
                    _ = sleep(Duration::from_millis(self.crawler.config.delay_ms)) => {}
                }
            }
        }
        debug!(worker = id, "Worker exiting");
    }

    async fn next_task(
        queue: &tokio::sync::Mutex<Receiver<CrawlTask>>,
    ) -> Option<CrawlTask> {
        queue.lock().await.recv().await
    }

    async fn process(&self, task: &CrawlTask) {
        debug!("Crawling [depth {}]: {}", task.depth, task.url);
        let crawler = &self.crawler;

        let user_agent = urls::select_user_agent(&crawler.config.user_agents);

        if !crawler.robots.is_allowed(&task.url, &user_agent).await {
            info!(
                "robots.txt disallows {} for agent {}",
                task.url, user_agent
            );
            return;
        }

        let page = match crawler.fetcher.fetch(&task.url, &user_agent).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to fetch {}: {}", task.url, e);
                return;
            }
        };

        let ExtractedPage {
            main_content,
            title,
            meta_description,
            canonical_url,
            language,
            publication_timestamp,
            headings_text,
            links,
        } = crawler.extractor.extract(&page.body, &task.url);

        if main_content.is_empty() {
            debug!("No main content extracted from {}", task.url);
        }

        let mut content_vector = Vec::new();
        if let Some(embedder) = &crawler.embedder {
            match embedder.embed(&main_content).await {
                Ok(vector) => content_vector = vector,
                Err(e) => warn!("Embedding failed for {}: {}", task.url, e),
            }
        }

        let hash_id = content_hash(&main_content);
        let doc = WebDocument {
            hash_id: hash_id.clone(),
            url: task.url.to_string(),
            html_source: page.body,
            main_content,
            title,
            meta_description,
            canonical_url,
            language,
            publication_timestamp,
            headings_text,
            crawled_at: Utc::now().timestamp(),
            content_vector,
        };

        if let Err(e) = crawler.sink.store(doc).await {
            warn!("Failed to store document for {} ({}): {}", task.url, hash_id, e);
        }

        // Pages at the depth limit are stored but stop link discovery.
        if task.depth < crawler.config.max_depth {
            self.enqueue_links(&task.url, links, task.depth + 1);
        }
    }

    fn enqueue_links(&self, page_url: &Url, links: Vec<Url>, next_depth: u32) {
        for link in links {
            // Discovery is same-origin: the hostname must match the
            // referring page exactly.
            if !urls::same_host(page_url, &link) {
                continue;
            }
            if urls::is_excluded_host(&link, &self.crawler.config.excluded_domains) {
                debug!("Skipping excluded domain link: {}", link);
                continue;
            }
            if self.crawler.ad_patterns.matches(link.as_str()) {
                debug!("Skipping ad link: {}", link);
                continue;
            }
            if self.crawler.enqueue(&self.tx, CrawlTask { url: link, depth: next_depth }) {
                debug!("Queued new link at depth {}", next_depth);
            }
        }
    }
}
