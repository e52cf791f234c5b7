use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use crawler::{CrawlConfig, Crawler, DocumentSink, SinkError, WebDocument};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROSE: &str = "The quick brown fox jumps over the lazy dog while the band \
                     plays on and the crowd keeps watching in complete silence.";

#[derive(Default)]
struct RecordingSink {
    docs: Mutex<Vec<WebDocument>>,
    closed: AtomicBool,
}

impl RecordingSink {
    fn stored(&self) -> Vec<WebDocument> {
        self.docs.lock().unwrap().clone()
    }

    fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.stored().into_iter().map(|d| d.url).collect();
        urls.sort();
        urls
    }
}

#[async_trait]
impl DocumentSink for RecordingSink {
    async fn store(&self, doc: WebDocument) -> Result<(), SinkError> {
        self.docs.lock().unwrap().push(doc);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn config(server: &MockServer, paths: &[&str]) -> CrawlConfig {
    CrawlConfig {
        seed_urls: paths
            .iter()
            .map(|p| format!("{}{}", server.uri(), p))
            .collect(),
        max_depth: 2,
        delay_ms: 0,
        max_concurrency: 4,
        ..CrawlConfig::default()
    }
}

async fn mock_page(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn run_crawl(config: CrawlConfig, sink: Arc<RecordingSink>) {
    let crawler = Crawler::new(config, sink).unwrap();
    tokio::time::timeout(Duration::from_secs(30), crawler.run(CancellationToken::new()))
        .await
        .expect("crawl did not terminate");
}

#[tokio::test]
async fn follows_links_and_resolves_canonical() {
    let server = MockServer::start().await;
    mock_page(&server, "/", r#"<html><body><a href="/b">next</a></body></html>"#.into()).await;
    mock_page(&server, "/b", r#"<html><body><a href="/a/">next</a></body></html>"#.into()).await;
    mock_page(
        &server,
        "/a/",
        r#"<html><head><link rel="canonical" href="/"></head><body>end</body></html>"#.into(),
    )
    .await;

    let sink = Arc::new(RecordingSink::default());
    run_crawl(config(&server, &["/"]), sink.clone()).await;

    assert_eq!(
        sink.urls(),
        vec![
            format!("{}/", server.uri()),
            format!("{}/a/", server.uri()),
            format!("{}/b", server.uri()),
        ]
    );

    let docs = sink.stored();
    let deep = docs
        .iter()
        .find(|d| d.url.ends_with("/a/"))
        .expect("deep page stored");
    assert_eq!(deep.canonical_url, format!("{}/", server.uri()));

    sink.close().await;
    assert!(sink.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn robots_disallow_prevents_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /x"),
        )
        .mount(&server)
        .await;
    mock_page(
        &server,
        "/",
        r#"<body><a href="/x/1">x</a><a href="/y">y</a></body>"#.into(),
    )
    .await;
    mock_page(&server, "/y", "<body>fine</body>".into()).await;
    Mock::given(method("GET"))
        .and(path("/x/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    run_crawl(config(&server, &["/"]), sink.clone()).await;

    assert_eq!(
        sink.urls(),
        vec![format!("{}/", server.uri()), format!("{}/y", server.uri())]
    );
}

#[tokio::test]
async fn robots_failure_is_demoted_to_allow_all_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mock_page(&server, "/", r#"<body><a href="/b">b</a></body>"#.into()).await;
    mock_page(&server, "/b", "<body>b</body>".into()).await;

    let sink = Arc::new(RecordingSink::default());
    run_crawl(config(&server, &["/"]), sink.clone()).await;

    // Both pages stored despite the broken robots.txt, and the sentinel
    // was cached after a single fetch attempt.
    assert_eq!(sink.stored().len(), 2);
}

#[tokio::test]
async fn excluded_domains_are_not_fetched() {
    let server = MockServer::start().await;
    mock_page(&server, "/", r#"<body><a href="/p">p</a></body>"#.into()).await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut cfg = config(&server, &["/"]);
    cfg.excluded_domains = vec!["127.0.0.1".to_string()];

    let sink = Arc::new(RecordingSink::default());
    run_crawl(cfg, sink.clone()).await;

    assert_eq!(sink.stored().len(), 1);
}

#[tokio::test]
async fn ad_links_are_not_fetched() {
    let server = MockServer::start().await;
    mock_page(
        &server,
        "/",
        r#"<body><a href="/ads.html">ad</a><a href="/news.html">news</a></body>"#.into(),
    )
    .await;
    mock_page(&server, "/news.html", "<body>news</body>".into()).await;
    Mock::given(method("GET"))
        .and(path("/ads.html"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut cfg = config(&server, &["/"]);
    cfg.ad_link_patterns = vec![r"ads\.".to_string()];

    let sink = Arc::new(RecordingSink::default());
    run_crawl(cfg, sink.clone()).await;

    assert_eq!(
        sink.urls(),
        vec![
            format!("{}/", server.uri()),
            format!("{}/news.html", server.uri()),
        ]
    );
}

#[tokio::test]
async fn identical_content_yields_identical_hashes() {
    let server = MockServer::start().await;
    let body = format!("<body><p>{PROSE}</p></body>");
    mock_page(&server, "/one", body.clone()).await;
    mock_page(&server, "/two", body).await;

    let sink = Arc::new(RecordingSink::default());
    run_crawl(config(&server, &["/one", "/two"]), sink.clone()).await;

    let docs = sink.stored();
    assert_eq!(docs.len(), 2);
    assert_ne!(docs[0].url, docs[1].url);
    assert_eq!(docs[0].hash_id, docs[1].hash_id);
}

#[tokio::test]
async fn publication_timestamp_reaches_the_sink() {
    let server = MockServer::start().await;
    mock_page(
        &server,
        "/",
        r#"<head><meta property="article:published_time"
            content="2024-05-01T12:00:00Z"></head>"#
            .into(),
    )
    .await;

    let sink = Arc::new(RecordingSink::default());
    run_crawl(config(&server, &["/"]), sink.clone()).await;

    assert_eq!(sink.stored()[0].publication_timestamp, 1_714_564_800);
}

#[tokio::test]
async fn depth_limit_stores_but_stops_discovery() {
    let server = MockServer::start().await;
    mock_page(&server, "/", r#"<body><a href="/d1">d1</a></body>"#.into()).await;
    mock_page(&server, "/d1", r#"<body><a href="/d2">d2</a></body>"#.into()).await;
    Mock::given(method("GET"))
        .and(path("/d2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut cfg = config(&server, &["/"]);
    cfg.max_depth = 1;

    let sink = Arc::new(RecordingSink::default());
    run_crawl(cfg, sink.clone()).await;

    assert_eq!(
        sink.urls(),
        vec![format!("{}/", server.uri()), format!("{}/d1", server.uri())]
    );
}

#[tokio::test]
async fn link_cycles_terminate() {
    let server = MockServer::start().await;
    mock_page(&server, "/", r#"<body><a href="/loop">go</a></body>"#.into()).await;
    mock_page(
        &server,
        "/loop",
        r#"<body><a href="/">back</a><a href="/loop">self</a></body>"#.into(),
    )
    .await;

    let sink = Arc::new(RecordingSink::default());
    run_crawl(config(&server, &["/"]), sink.clone()).await;

    // Every URL is fetched exactly once despite the cycle.
    assert_eq!(sink.stored().len(), 2);
}

#[tokio::test]
async fn fetch_failures_do_not_stall_the_crawl() {
    let server = MockServer::start().await;
    mock_page(
        &server,
        "/",
        r#"<body><a href="/gone">gone</a><a href="/ok">ok</a></body>"#.into(),
    )
    .await;
    mock_page(&server, "/ok", "<body>ok</body>".into()).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    run_crawl(config(&server, &["/"]), sink.clone()).await;

    assert_eq!(
        sink.urls(),
        vec![format!("{}/", server.uri()), format!("{}/ok", server.uri())]
    );
}

#[tokio::test]
async fn cancellation_stops_the_crawl_promptly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<body>slow</body>")
                .set_delay(Duration::from_secs(20)),
        )
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let crawler = Crawler::new(config(&server, &["/"]), sink.clone()).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    crawler.run(cancel).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(sink.stored().is_empty());
}
