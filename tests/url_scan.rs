use std::io::Cursor;

use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use uncloak::config::UrlScanOptions;
use uncloak::scan::UrlScanner;
use uncloak::wordlist::Wordlist;

fn options_for(server_uri: &str, words: &str) -> UrlScanOptions {
    let mut options = UrlScanOptions::new(Url::parse(server_uri).unwrap());
    options.wordlist = Some(Wordlist::from_reader(Cursor::new(words.to_string())));
    options.positive_statuses = vec![200];
    options.extensions = Vec::new();
    options.parallelism = 20;
    options
}

async fn scan(options: UrlScanOptions) -> Vec<String> {
    let mut urls: Vec<String> = UrlScanner::new(options)
        .unwrap()
        .scan()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.url)
        .collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn finds_existing_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login.php"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let urls = scan(options_for(&server.uri(), "login.php")).await;
    assert_eq!(urls, vec![format!("{}/login.php", server.uri())]);
}

#[tokio::test]
async fn follows_redirects_to_hidden_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login.php"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/very-secret-file.php"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/very-secret-file.php"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let urls = scan(options_for(&server.uri(), "login.php")).await;
    assert_eq!(urls, vec![format!("{}/very-secret-file.php", server.uri())]);
}

#[tokio::test]
async fn expands_backup_variants_of_positive_finds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login.php"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login.php~"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut options = options_for(&server.uri(), "login");
    options.extensions = vec!["php".to_string()];
    let urls = scan(options).await;
    assert_eq!(
        urls,
        vec![
            format!("{}/login.php", server.uri()),
            format!("{}/login.php~", server.uri()),
        ]
    );
}

#[tokio::test]
async fn redirect_cycles_terminate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/b"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/a"))
        .mount(&server)
        .await;

    let urls = scan(options_for(&server.uri(), "a")).await;
    assert!(urls.is_empty());
}

#[tokio::test]
async fn suppresses_negative_lengths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("soft 404 error"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/real"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let mut options = options_for(&server.uri(), "page\nreal");
    options.negative_lengths = vec!["soft 404 error".len() as u64];
    let urls = scan(options).await;
    assert_eq!(urls, vec![format!("{}/real", server.uri())]);
}

#[tokio::test]
async fn spider_discovers_linked_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><a href="/hidden.html">deep</a></html>"#.as_bytes(),
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hidden.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>".as_bytes(), "text/html"))
        .mount(&server)
        .await;

    let mut options = options_for(&server.uri(), "");
    options.spider = true;
    let urls = scan(options).await;
    assert_eq!(
        urls,
        vec![
            format!("{}/", server.uri()),
            format!("{}/hidden.html", server.uri()),
        ]
    );
}

#[tokio::test]
async fn extra_headers_are_sent_and_malformed_ones_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secret"))
        .and(header("x-probe", "1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut options = options_for(&server.uri(), "secret");
    options.extra_headers = vec!["X-Probe: 1".to_string(), "not a header".to_string()];
    let urls = scan(options).await;
    assert_eq!(urls, vec![format!("{}/secret", server.uri())]);
}

#[tokio::test]
async fn repeated_scans_are_idempotent() {
    let server = MockServer::start().await;
    for p in ["/admin", "/backup"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
    }

    let first = scan(options_for(&server.uri(), "admin\nbackup\nmissing")).await;
    let second = scan(options_for(&server.uri(), "admin\nbackup\nmissing")).await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn parallelism_does_not_change_the_result_set() {
    let server = MockServer::start().await;
    for p in ["/a", "/b", "/c"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
    }

    let mut serial = options_for(&server.uri(), "a\nb\nc\nd");
    serial.parallelism = 1;
    let mut wide = options_for(&server.uri(), "a\nb\nc\nd");
    wide.parallelism = 32;

    assert_eq!(scan(serial).await, scan(wide).await);
}
