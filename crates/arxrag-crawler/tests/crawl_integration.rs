use arxrag_crawler::{
    CategoryStatus, Crawler, CrawlerConfig, FAILURES_FILE, MANIFEST_FILE, read_failures,
    read_manifest,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOMEPAGE: &str = r#"<html><body><ul>
<li><a href="/archive/cs">Computer Science</a>
 (<a id="new-cs" aria-labelledby="new-cs cs" href="/list/cs/new">new</a>,
  <a id="recent-cs" aria-labelledby="recent-cs cs" href="/list/cs/recent">recent</a>)</li>
<li><a href="/archive/math">Mathematics</a>
 (<a id="new-math" aria-labelledby="new-math math" href="/list/math/new">new</a>)</li>
</ul></body></html>"#;

const CS_LISTING: &str = r#"<html><body><dl id="articles">
<dt><a name="item1">[1]</a>
  <a href="/abs/1111.1111" title="Abstract">arXiv:1111.1111</a>
  [<a href="/pdf/1111.1111" title="Download PDF">pdf</a>]
</dt>
<dd><div class="meta">
  <div class="list-title mathjax"><span class="descriptor">Title:</span>
    Title A
  </div>
  <div class="list-authors"><a href="/a/x">X</a>, <a href="/a/y">Y</a></div>
</div></dd>
<dt><a name="item2">[2]</a>
  <a href="/abs/2222.2222" title="Abstract">arXiv:2222.2222</a>
  [<a href="/pdf/2222.2222" title="Download PDF">pdf</a>]
</dt>
<dd><div class="meta">
  <div class="list-title mathjax"><span class="descriptor">Title:</span> Title B</div>
  <div class="list-authors"><a href="/a/z">Z</a></div>
</div></dd>
</dl></body></html>"#;

async fn mount(server: &MockServer, at: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn config(server: &MockServer, data_dir: &std::path::Path) -> CrawlerConfig {
    CrawlerConfig {
        base_url: server.uri(),
        data_dir: data_dir.to_path_buf(),
        category_concurrency: 2,
        pdf_concurrency: 2,
        max_retries: 1,
        retry_backoff_ms: 1,
        ..CrawlerConfig::default()
    }
}

#[tokio::test]
async fn crawl_writes_manifest_and_pdfs() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount(&server, "/", 200, HOMEPAGE).await;
    mount(&server, "/list/cs/new", 200, CS_LISTING).await;
    mount(&server, "/list/math/new", 503, "unavailable").await;
    mount(&server, "/pdf/1111.1111", 200, "%PDF-1.4 a").await;
    mount(&server, "/pdf/2222.2222", 200, "%PDF-1.4 b").await;

    let crawler = Crawler::from_config(config(&server, tmp.path())).unwrap();
    let report = crawler.run().await.unwrap();

    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.failed_categories(), vec!["math"]);
    let cs = report.categories.iter().find(|c| c.category == "cs").unwrap();
    assert_eq!(
        cs.status,
        CategoryStatus::Completed {
            articles: 2,
            downloaded: 2,
            failures: 0,
        }
    );

    let dir = tmp.path().join("cs");
    let manifest = read_manifest(&dir).await.unwrap();
    assert_eq!(manifest[0].title, "Title A");
    assert_eq!(manifest[0].authors, vec!["X", "Y"]);
    assert_eq!(manifest[0].link, format!("{}/pdf/1111.1111", server.uri()));
    assert_eq!(manifest[1].id, "2222.2222");
    assert_eq!(manifest[1].category, "cs");
    assert_eq!(std::fs::read(dir.join("1111.1111.pdf")).unwrap(), b"%PDF-1.4 a");
    assert_eq!(std::fs::read(dir.join("2222.2222.pdf")).unwrap(), b"%PDF-1.4 b");
    assert!(!dir.join(FAILURES_FILE).exists());
    assert!(!tmp.path().join("math").join(MANIFEST_FILE).exists());
}

#[tokio::test]
async fn missing_pdf_is_recorded_as_failure() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount(&server, "/", 200, HOMEPAGE).await;
    mount(&server, "/list/cs/new", 200, CS_LISTING).await;
    mount(&server, "/list/math/new", 200, "<html><body><dl></dl></body></html>").await;
    mount(&server, "/pdf/1111.1111", 200, "%PDF-1.4 a").await;
    mount(&server, "/pdf/2222.2222", 404, "").await;

    let crawler = Crawler::from_config(config(&server, tmp.path())).unwrap();
    let report = crawler.run().await.unwrap();

    assert!(report.failed_categories().is_empty());
    assert_eq!(report.total_articles(), 2);
    assert_eq!(report.total_downloaded(), 1);
    assert_eq!(report.total_failed_downloads(), 1);

    let dir = tmp.path().join("cs");
    assert_eq!(read_manifest(&dir).await.unwrap().len(), 2);
    let failures = read_failures(&dir).await.unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, "2222.2222");
    assert_eq!(failures[0].attempts, 1);
    assert!(!dir.join("2222.2222.pdf").exists());

    let empty = read_manifest(&tmp.path().join("math")).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn server_error_pdf_is_retried() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount(&server, "/", 200, HOMEPAGE).await;
    mount(&server, "/list/cs/new", 200, CS_LISTING).await;
    mount(&server, "/list/math/new", 404, "").await;
    mount(&server, "/pdf/1111.1111", 200, "%PDF-1.4 a").await;
    Mock::given(method("GET"))
        .and(path("/pdf/2222.2222"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(&server, "/pdf/2222.2222", 200, "%PDF-1.4 b").await;

    let crawler = Crawler::from_config(config(&server, tmp.path())).unwrap();
    let report = crawler.run().await.unwrap();

    assert_eq!(report.total_downloaded(), 2);
    assert!(tmp.path().join("cs").join("2222.2222.pdf").exists());
}

#[tokio::test]
async fn unreachable_homepage_fails_run() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = CrawlerConfig {
        base_url: "http://127.0.0.1:1".into(),
        data_dir: tmp.path().to_path_buf(),
        ..CrawlerConfig::default()
    };
    let crawler = Crawler::from_config(cfg).unwrap();
    let err = crawler.run().await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn unreachable_pdf_host_does_not_stop_siblings() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    let listing = CS_LISTING.replace(
        "</dl>",
        r#"<dt><a name="item3">[3]</a>
  <a href="/abs/3333.3333" title="Abstract">arXiv:3333.3333</a>
  [<a href="http://127.0.0.1:1/pdf/3333.3333" title="Download PDF">pdf</a>]
</dt>
<dd><div class="meta">
  <div class="list-title mathjax"><span class="descriptor">Title:</span> Title C</div>
  <div class="list-authors"><a href="/a/w">W</a></div>
</div></dd>
</dl>"#,
    );
    mount(&server, "/", 200, HOMEPAGE).await;
    mount(&server, "/list/cs/new", 200, &listing).await;
    mount(&server, "/list/math/new", 404, "").await;
    mount(&server, "/pdf/1111.1111", 200, "%PDF-1.4 a").await;
    mount(&server, "/pdf/2222.2222", 200, "%PDF-1.4 b").await;

    let cfg = config(&server, tmp.path());
    let max_retries = cfg.max_retries;
    let crawler = Crawler::from_config(cfg).unwrap();
    let report = crawler.run().await.unwrap();

    assert_eq!(report.total_articles(), 3);
    assert_eq!(report.total_downloaded(), 2);
    assert_eq!(report.total_failed_downloads(), 1);

    let dir = tmp.path().join("cs");
    assert!(dir.join("1111.1111.pdf").exists());
    assert!(dir.join("2222.2222.pdf").exists());
    assert!(!dir.join("3333.3333.pdf").exists());

    let failures = read_failures(&dir).await.unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, "3333.3333");
    assert_eq!(failures[0].link, "http://127.0.0.1:1/pdf/3333.3333");
    assert_eq!(failures[0].attempts, max_retries + 1);
}
