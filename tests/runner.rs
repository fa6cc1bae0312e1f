//! End-to-end runs over mock sites

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wpscraper::runner::run_with;
use wpscraper::{Error, ScanConfig, Target};

const HOMEPAGE: &str = r#"<html><head><meta name="generator" content="WordPress 6.4.2"></head></html>"#;

async fn wordpress_site(stable_tag: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HOMEPAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-content/plugins/akismet/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-content/plugins/akismet/readme.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("=== Akismet ===\nStable tag: {}\n", stable_tag)),
        )
        .mount(&server)
        .await;
    server
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn config(dir: &TempDir, target: Target) -> ScanConfig {
    ScanConfig {
        criteria_path: write_file(dir.path(), "plugins.txt", "akismet; 4.0 - 4.2\n"),
        output: Some(dir.path().join("results.csv")),
        target: Some(target),
        delay: Duration::ZERO,
        root_timeout: Duration::from_secs(2),
        plugin_timeout: Duration::from_secs(2),
        banner: false,
    }
}

#[tokio::test]
async fn vulnerable_plugin_is_reported_and_written() {
    let server = wordpress_site("4.1").await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, Target::Domain(server.uri()));

    let mut console = Vec::new();
    let summary = run_with(&config, &mut console).await.unwrap();
    let console = String::from_utf8(console).unwrap();

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.rows_written, 1);
    assert!(console.contains(&format!("Checking {}", server.uri())));
    assert!(console.contains("WordPress version for"));
    assert!(console.contains("6.4.2"));
    assert!(console.contains("akismet=4.1"));

    let csv = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
    assert_eq!(
        csv,
        format!(
            "url,wordpress_version,plugins\n{},6.4.2,akismet=4.1\n",
            server.uri()
        )
    );
}

#[tokio::test]
async fn no_row_when_nothing_matched() {
    let server = wordpress_site("4.3").await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, Target::Domain(server.uri()));

    let mut console = Vec::new();
    let summary = run_with(&config, &mut console).await.unwrap();
    let console = String::from_utf8(console).unwrap();

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.matched, 0);
    assert_eq!(summary.rows_written, 0);
    // The detected WordPress version is not reported either
    assert!(!console.contains("WordPress version for"));

    let csv = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
    assert_eq!(csv, "url,wordpress_version,plugins\n");
}

#[tokio::test]
async fn domain_list_is_paced() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let list = write_file(
        dir.path(),
        "domains.txt",
        &format!("{0}\n\n{0}\n{0}\n", server.uri()),
    );
    let mut config = config(&dir, Target::DomainList(list));
    config.delay = Duration::from_secs(1);

    let started = Instant::now();
    let summary = run_with(&config, std::io::sink()).await.unwrap();

    assert_eq!(summary.scanned, 3);
    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test]
async fn one_bad_domain_does_not_stop_the_list() {
    let server = wordpress_site("4.2").await;
    let dir = tempfile::tempdir().unwrap();
    let list = write_file(
        dir.path(),
        "domains.txt",
        &format!("ftp://nope.example\nnot a domain\n{}\n", server.uri()),
    );
    let config = config(&dir, Target::DomainList(list));

    let mut console = Vec::new();
    let summary = run_with(&config, &mut console).await.unwrap();
    let console = String::from_utf8(console).unwrap();

    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.rows_written, 1);
    assert!(console.contains("Skipping 'ftp://nope.example'"));
    assert!(console.contains("akismet=4.2"));
}

#[tokio::test]
async fn rows_append_across_runs() {
    let server = wordpress_site("4.0").await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, Target::Domain(server.uri()));

    run_with(&config, std::io::sink()).await.unwrap();
    run_with(&config, std::io::sink()).await.unwrap();

    let csv = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "url,wordpress_version,plugins");
    assert_eq!(lines[1], lines[2]);
}

#[tokio::test]
async fn missing_criteria_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir, Target::Domain("example.com".into()));
    config.criteria_path = dir.path().join("missing.txt");

    let err = run_with(&config, std::io::sink()).await.unwrap_err();
    assert!(matches!(err, Error::CriteriaNotFound(_)));
}

#[tokio::test]
async fn malformed_criteria_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir, Target::Domain("example.com".into()));
    config.criteria_path = write_file(dir.path(), "bad.txt", "akismet 4.0\n");

    let err = run_with(&config, std::io::sink()).await.unwrap_err();
    assert!(matches!(err, Error::MalformedCriteria { line: 1, .. }));
}

#[tokio::test]
async fn unreadable_domain_list_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, Target::DomainList(dir.path().join("absent.txt")));

    let err = run_with(&config, std::io::sink()).await.unwrap_err();
    assert!(matches!(err, Error::DomainList { .. }));
}

#[tokio::test]
async fn output_only_scans_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir, Target::Domain("unused".into()));
    config.target = None;

    let summary = run_with(&config, std::io::sink()).await.unwrap();

    assert_eq!(summary.scanned, 0);
    let csv = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
    assert_eq!(csv, "url,wordpress_version,plugins\n");
}

/// Console that rejects every write
struct BrokenConsole;

impl std::io::Write for BrokenConsole {
    fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn console_failure_does_not_stop_the_run() {
    let first = wordpress_site("4.1").await;
    let second = wordpress_site("4.2").await;
    let dir = tempfile::tempdir().unwrap();
    let list = write_file(
        dir.path(),
        "domains.txt",
        &format!("{}\n{}\n", first.uri(), second.uri()),
    );
    let config = config(&dir, Target::DomainList(list));

    let summary = run_with(&config, BrokenConsole).await.unwrap();

    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.rows_written, 2);
    let csv = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
    assert!(csv.contains("akismet=4.1"));
    assert!(csv.contains("akismet=4.2"));
}

#[tokio::test]
async fn run_can_be_spawned() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&dir, Target::Domain("unused".into()));
    config.target = None;

    let summary = tokio::spawn(async move { wpscraper::run(&config).await })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.scanned, 0);
}
