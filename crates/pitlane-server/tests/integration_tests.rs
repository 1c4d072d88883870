//! # Integration Tests for pitlane-server
//!
//! Drives the router with in-memory requests against a temporary server
//! installation.

use std::fs;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pitlane_cache::{list_entries, RetrievalConfig, RetrievalService};
use pitlane_core::AssetKind;
use pitlane_server::AppState;
use tempfile::TempDir;
use tower::ServiceExt;

struct Installation {
    _temp_dir: TempDir,
    install_root: PathBuf,
    cache_root: PathBuf,
}

impl Installation {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let install_root = temp_dir.path().join("server");
        let cache_root = temp_dir.path().join("cache");

        let installation = Self {
            _temp_dir: temp_dir,
            install_root,
            cache_root,
        };
        installation.add_file(AssetKind::Car, "ferrari_f40", "ui/ui_car.json", r#"{"author":"john"}"#);
        installation.add_file(AssetKind::Car, "ferrari_f40", "data.acd", "data");
        installation.add_file(AssetKind::Track, "monza", "ui/meta_data.json", "{}");
        installation
    }

    fn add_file(&self, kind: AssetKind, name: &str, rel: &str, content: &str) {
        let path = kind.item_dir(&self.install_root, name).join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn service(&self) -> RetrievalService {
        RetrievalService::new(RetrievalConfig {
            install_root: self.install_root.clone(),
            cache_root: self.cache_root.clone(),
        })
    }

    fn app(&self) -> Router {
        pitlane_server::app(AppState::new(self.service()))
    }
}

async fn get(app: Router, uri: &str) -> axum::http::Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: axum::http::Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

// -- Health -------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let response = get(pitlane_server::app(AppState::disabled()), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");
}

// -- Downloads ----------------------------------------------------------------

#[tokio::test]
async fn test_download_returns_zip() {
    let installation = Installation::new();
    let response = get(installation.app(), "/download/cars/ferrari_f40").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/zip"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"ferrari_f40.zip\""
    );

    let mut entries = list_entries(&body_bytes(response).await).unwrap();
    entries.sort();
    assert_eq!(
        entries,
        vec!["ferrari_f40/data.acd", "ferrari_f40/ui/ui_car.json"]
    );
    assert!(installation.cache_root.join("cars/ferrari_f40.zip").is_file());
}

#[tokio::test]
async fn test_zip_suffix_is_stripped() {
    let installation = Installation::new();
    let app = installation.app();

    let plain = body_bytes(get(app.clone(), "/download/tracks/monza").await).await;
    let response = get(app, "/download/tracks/monza.zip").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, plain);
}

#[tokio::test]
async fn test_percent_encoded_name() {
    let installation = Installation::new();
    installation.add_file(AssetKind::Track, "ks nordschleife", "map.png", "png");

    let response = get(installation.app(), "/download/tracks/ks%20nordschleife").await;
    assert_eq!(response.status(), StatusCode::OK);

    let entries = list_entries(&body_bytes(response).await).unwrap();
    assert_eq!(entries, vec!["ks nordschleife/map.png"]);
}

#[tokio::test]
async fn test_repeated_downloads_build_once() {
    let installation = Installation::new();
    let state = AppState::new(installation.service());
    let service = state.retrieval.clone().unwrap();
    let app = pitlane_server::app(state);

    let first = body_bytes(get(app.clone(), "/download/cars/ferrari_f40").await).await;
    let second = body_bytes(get(app, "/download/cars/ferrari_f40").await).await;

    assert_eq!(first, second);
    assert_eq!(service.build_count(), 1);
}

#[tokio::test]
async fn test_missing_item_is_404() {
    let installation = Installation::new();
    let response = get(installation.app(), "/download/cars/nonexistent").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(!installation.cache_root.join("cars").exists());
}

#[tokio::test]
async fn test_unknown_kind_is_404() {
    let installation = Installation::new();
    for uri in ["/download/boats/ferrari_f40", "/download/Cars/ferrari_f40"] {
        let response = get(installation.app(), uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_traversal_names_are_404() {
    let installation = Installation::new();
    for uri in [
        "/download/cars/..",
        "/download/cars/%2E%2E",
        "/download/cars/..%2Fcars",
        "/download/cars/.zip",
    ] {
        let response = get(installation.app(), uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
    assert!(!installation.cache_root.exists());
}

#[tokio::test]
async fn test_disabled_downloads_are_404() {
    let installation = Installation::new();
    let response = get(
        pitlane_server::app(AppState::disabled()),
        "/download/cars/ferrari_f40",
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!installation.cache_root.exists());
}

#[tokio::test]
async fn test_build_failure_is_500() {
    let installation = Installation::new();
    // A regular file where the cache directory should be makes the build fail
    fs::write(&installation.cache_root, "not a directory").unwrap();

    let response = get(installation.app(), "/download/tracks/monza").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(body["error"]["message"], "service error");
}
