//! HTTP-layer integration tests: these drive `routes::build_router` over a
//! real request/response cycle via `axum_test::TestServer`, the same way
//! the teacher's `test/login_test.rs` and `test/godmode_test.rs` drive its
//! own `create_app`. `tests.rs` calls the engines directly and never
//! touches the router; this file is what actually exercises
//! `require_setup_complete`, the `ApiKeyUser`/`SessionUser`/
//! `AuthenticatedUser` extractors, and the `ps_session` cookie path.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;

use crate::config::AppConfig;
use crate::db::sql::SqlDb;
use crate::db::Db;
use crate::middleware::API_KEY_HEADER;
use crate::notify::{LoggingEmailNotifier, LoggingPushNotifier};
use crate::scanner::ScannerHandle;
use crate::state::AppState;
use crate::storage::PhotoStore;

/// Builds a router backed by a fresh tempdir database and file store, the
/// HTTP-layer counterpart to `tests.rs`'s `test_state`.
async fn test_server() -> (TestServer, TempDir) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.sqlite");
    let db = SqlDb::connect(None, db_path.to_str().unwrap()).await.unwrap();
    db.migrate().await.unwrap();

    let storage_path = dir.path().join("photos");
    std::fs::create_dir_all(&storage_path).unwrap();
    let storage = PhotoStore::new(storage_path.clone()).unwrap();

    let config = AppConfig {
        server_address: "127.0.0.1:0".to_string(),
        database_path: db_path.to_string_lossy().to_string(),
        database_url: None,
        photo_storage_path: storage_path,
        api_key: None,
        file_scanner_enabled: false,
        file_scanner_interval_hours: 6,
        file_scanner_auto_start: false,
        max_file_size_mb: 100,
        allowed_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
        auth_timeout_seconds: 60,
        cursor_secret: "test-secret".to_string(),
    };

    let state = AppState {
        db: Arc::new(db),
        storage: Arc::new(storage),
        config: Arc::new(config),
        push: Arc::new(LoggingPushNotifier),
        email: Arc::new(LoggingEmailNotifier),
        thumbnail_semaphore: AppState::thumbnail_semaphore_default(),
        scanner: ScannerHandle::new(),
    };

    let router = crate::routes::build_router(state);
    let server = TestServer::new(router).expect("failed to create TestServer");
    (server, dir)
}

#[tokio::test]
#[serial]
async fn health_check_is_reachable_before_setup() {
    let (server, _dir) = test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
#[serial]
async fn api_routes_are_gated_until_setup_completes() {
    let (server, _dir) = test_server().await;
    // No admin exists yet in this fresh database; every `/api/*` route
    // other than `/api/setup/*` must answer 503, not 401 (§6, §7).
    let response = server.get("/api/photos").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
#[serial]
async fn setup_flow_lowercases_email_and_unlocks_the_api() {
    let (server, _dir) = test_server().await;

    let status = server.get("/api/setup/status").await;
    status.assert_status_ok();
    let status_body: serde_json::Value = status.json();
    assert_eq!(status_body["setupComplete"], false);

    let register = server
        .post("/api/setup/register")
        .json(&json!({
            "email": "Admin@Example.com",
            "displayName": "Admin",
            "password": "hunter222222",
        }))
        .await;
    register.assert_status_ok();
    let register_body: serde_json::Value = register.json();
    assert_eq!(
        register_body["email"], "admin@example.com",
        "users.email must be stored lowercased (spec.md: \"email (lowercased, unique)\")"
    );
    let api_key = register_body["apiKey"].as_str().unwrap().to_string();

    // Setup runs exactly once per deployment.
    let second_attempt = server
        .post("/api/setup/register")
        .json(&json!({
            "email": "someone-else@example.com",
            "displayName": "Someone Else",
            "password": "whatever12345",
        }))
        .await;
    second_attempt.assert_status(StatusCode::CONFLICT);

    // The gate lifts once an admin exists.
    let photos = server
        .get("/api/photos")
        .add_header(API_KEY_HEADER.clone(), api_key.parse().unwrap())
        .await;
    photos.assert_status_ok();
    let photos_body: Vec<serde_json::Value> = photos.json();
    assert!(photos_body.is_empty());
}

#[tokio::test]
#[serial]
async fn web_login_session_cookie_authenticates_api_routes() {
    let (server, _dir) = test_server().await;

    let register = server
        .post("/api/setup/register")
        .json(&json!({
            "email": "owner@example.com",
            "displayName": "Owner",
            "password": "hunter222222",
        }))
        .await;
    register.assert_status_ok();
    let api_key = register.json::<serde_json::Value>()["apiKey"].as_str().unwrap().to_string();

    let device = server
        .post("/api/devices/register")
        .add_header(API_KEY_HEADER.clone(), api_key.parse().unwrap())
        .json(&json!({
            "deviceName": "owners-phone",
            "platform": "ios",
            "fcmToken": "fcm-token-123",
        }))
        .await;
    device.assert_status_ok();
    let device_id = device.json::<serde_json::Value>()["id"].as_str().unwrap().to_string();

    let initiate = server
        .post("/api/web/auth/initiate")
        .json(&json!({ "email": "owner@example.com" }))
        .await;
    initiate.assert_status_ok();
    let request_id = initiate.json::<serde_json::Value>()["requestId"].as_str().unwrap().to_string();

    let respond = server
        .post("/api/web/auth/respond")
        .add_header(API_KEY_HEADER.clone(), api_key.parse().unwrap())
        .json(&json!({ "requestId": request_id, "approved": true, "deviceId": device_id }))
        .await;
    respond.assert_status_ok();

    let poll = server.get(&format!("/api/web/auth/status/{request_id}")).await;
    poll.assert_status_ok();
    let poll_body: serde_json::Value = poll.json();
    assert_eq!(poll_body["status"], "approved");
    assert!(poll_body["sessionToken"].as_str().is_some(), "the first poll after approval must carry a session token");

    let set_cookie = poll
        .headers()
        .get(axum::http::header::SET_COOKIE)
        .expect("an approved poll must set the session cookie")
        .to_str()
        .unwrap()
        .to_string();
    let cookie_pair = set_cookie.split(';').next().unwrap().to_string();

    // The session cookie alone — no API key — must now authenticate a
    // regular data route (§6: "either an X-API-Key header ... or a
    // session cookie").
    let photos = server.get("/api/photos").add_header(axum::http::header::COOKIE, cookie_pair.parse().unwrap()).await;
    photos.assert_status_ok();

    // A second poll must not reissue the token, even though the session
    // stays valid.
    let second_poll = server.get(&format!("/api/web/auth/status/{request_id}")).await;
    second_poll.assert_status_ok();
    let second_poll_body: serde_json::Value = second_poll.json();
    assert_eq!(second_poll_body["status"], "approved");
    assert!(second_poll_body["sessionToken"].is_null());
}
