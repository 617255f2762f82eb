//! End-to-end tests exercising the core engines together against a real
//! (file-backed, not `:memory:` — see `test_state` for why) SQLite
//! database and a scratch file store. One file per cross-cutting
//! scenario rather than per module, since these are integration tests
//! of how C1/C2/C5/C6/C7/C8 cooperate, not unit tests of any one of
//! them (those live alongside their modules).

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::sql::SqlDb;
use crate::db::{ClaimTarget, Db};
use crate::notify::{LoggingEmailNotifier, LoggingPushNotifier};
use crate::scanner::ScannerHandle;
use crate::state::AppState;
use crate::storage::PhotoStore;
use photosync_shared::entities::{Device, OrphanStatus, Platform, User};

/// A tiny 1x1 JPEG — enough for the hashing/dedup paths; too small for
/// the `image` crate to decode, which is fine since thumbnailing runs
/// off the request path and its failure is silently absorbed (§4.4).
const TINY_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9];

/// Builds an isolated `AppState` backed by a fresh SQLite file in a
/// scratch directory. Deliberately not `:memory:`: `SqlDb::connect` pools
/// up to 10 connections, and SQLite's `:memory:` URI gives each
/// connection its own empty database unless a shared-cache URI is used —
/// a file-backed DB in a tempdir sidesteps that entirely.
async fn test_state() -> (AppState, TempDir) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.sqlite");
    let db = SqlDb::connect(None, db_path.to_str().unwrap()).await.unwrap();
    db.migrate().await.unwrap();

    let storage_path = dir.path().join("photos");
    std::fs::create_dir_all(&storage_path).unwrap();
    let storage = PhotoStore::new(storage_path).unwrap();

    let config = AppConfig {
        server_address: "127.0.0.1:0".to_string(),
        database_path: db_path.to_string_lossy().to_string(),
        database_url: None,
        photo_storage_path: dir.path().join("photos"),
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
    (state, dir)
}

async fn create_user(state: &AppState, email: &str) -> User {
    let user = User {
        id: Uuid::now_v7(),
        email: email.to_string(),
        display_name: "Test User".to_string(),
        api_key_hash: crate::auth::hash_token("unused"),
        password_hash: Some(crate::auth::hash_password("correct horse battery staple").unwrap()),
        is_admin: true,
        is_active: true,
        created_at: Utc::now(),
    };
    state.db.create_user(&user).await.unwrap();
    user
}

async fn create_device(state: &AppState, user_id: Uuid, name: &str) -> Device {
    let device = Device {
        id: Uuid::now_v7(),
        user_id,
        device_name: name.to_string(),
        platform: Platform::Ios,
        fcm_token: None,
        registered_at: Utc::now(),
        last_seen_at: Utc::now(),
        is_active: true,
    };
    state.db.create_device(&device).await.unwrap();
    device
}

#[tokio::test]
async fn duplicate_upload_by_hash_is_flagged_not_reinserted() {
    let (state, _dir) = test_state().await;
    let user = create_user(&state, "a@example.com").await;

    let first = crate::ingestion::ingest_photo(&state, user.id, None, "photo.jpg", None, Bytes::from_static(TINY_JPEG)).await.unwrap();
    assert!(!first.is_duplicate);

    let second = crate::ingestion::ingest_photo(&state, user.id, None, "photo-renamed.jpg", None, Bytes::from_static(TINY_JPEG)).await.unwrap();
    assert!(second.is_duplicate);
    assert_eq!(second.photo.id, first.photo.id);

    let all = state.db.list_photos(user.id, 0, 10).await.unwrap();
    assert_eq!(all.len(), 1, "a duplicate upload must not create a second row");
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_any_write() {
    let (state, _dir) = test_state().await;
    let user = create_user(&state, "b@example.com").await;

    let err = crate::ingestion::ingest_photo(&state, user.id, None, "payload.exe", None, Bytes::from_static(TINY_JPEG)).await.unwrap_err();
    assert!(matches!(err, crate::errors::AppError::BadRequest(_)));
    assert!(state.db.list_photos(user.id, 0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn delta_pages_are_cursor_ordered_and_exhaustive() {
    let (state, _dir) = test_state().await;
    let user = create_user(&state, "c@example.com").await;
    let device = create_device(&state, user.id, "phone").await;

    for i in 0..5u8 {
        let bytes = Bytes::from(vec![0xFF, 0xD8, 0xFF, i, 0xFF, 0xD9]);
        crate::ingestion::ingest_photo(&state, user.id, Some(device.id), &format!("p{i}.jpg"), None, bytes).await.unwrap();
    }

    let mut seen = std::collections::HashSet::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = crate::sync::delta(&state, user.id, device.id, cursor.as_deref(), 2, None).await.unwrap();
        for (photo, _origin) in &page.photos {
            assert!(seen.insert(photo.id), "delta pages must not repeat a photo");
        }
        if !page.has_more {
            break;
        }
        cursor = page.cursor;
    }
    assert_eq!(seen.len(), 5);
}

#[tokio::test]
async fn malformed_cursor_is_a_bad_request_not_a_panic() {
    let (state, _dir) = test_state().await;
    let user = create_user(&state, "d@example.com").await;
    let device = create_device(&state, user.id, "phone").await;

    let err = crate::sync::delta(&state, user.id, device.id, Some("not-a-real-cursor"), 10, None).await.unwrap_err();
    assert!(matches!(err, crate::errors::AppError::BadRequest(_)));
}

#[tokio::test]
async fn claim_legacy_refuses_a_device_owned_by_another_user() {
    let (state, _dir) = test_state().await;
    let owner = create_user(&state, "owner@example.com").await;
    let intruder = create_user(&state, "intruder@example.com").await;
    let owners_device = create_device(&state, owner.id, "owners-phone").await;

    let err = crate::sync::claim_legacy(&state, intruder.id, owners_device.id, ClaimTarget::All).await.unwrap_err();
    assert!(matches!(err, crate::errors::AppError::Forbidden));
}

#[tokio::test]
async fn web_login_is_approved_once_and_session_token_issued_once() {
    let (state, _dir) = test_state().await;
    let user = create_user(&state, "e@example.com").await;
    let device = create_device(&state, user.id, "phone").await;

    let request = crate::auth_broker::initiate_web_login(&state, user.id, "127.0.0.1".into(), "test-agent".into()).await.unwrap();

    let did_resolve = crate::auth_broker::respond(&state, request.id, true, device.id).await.unwrap();
    assert!(did_resolve);

    let second_attempt = crate::auth_broker::respond(&state, request.id, false, device.id).await.unwrap();
    assert!(!second_attempt, "a second responder must not be able to override the first decision");

    let (_req, outcome) = crate::auth_broker::poll_web_auth_status(&state, request.id, "127.0.0.1".into(), "test-agent".into()).await.unwrap();
    let token = match outcome {
        crate::auth_broker::PollOutcome::Approved { session_token: Some(t) } => t,
        _ => panic!("expected an approved outcome carrying a session token on first poll"),
    };
    assert_eq!(token.len(), 64);

    let (_req, outcome2) = crate::auth_broker::poll_web_auth_status(&state, request.id, "127.0.0.1".into(), "test-agent".into()).await.unwrap();
    assert!(matches!(outcome2, crate::auth_broker::PollOutcome::Approved { session_token: None }), "a later poll must not reissue a session token");

    let authenticated = crate::auth_broker::authenticate_session(&state, &token).await.unwrap();
    assert_eq!(authenticated.unwrap().id, user.id);
}

#[tokio::test]
async fn email_reset_locks_out_after_three_wrong_codes() {
    let (state, _dir) = test_state().await;
    let user = create_user(&state, "f@example.com").await;

    crate::auth_broker::initiate_email_reset(&state, &user.email).await.unwrap();

    for _ in 0..3 {
        let err = crate::auth_broker::verify_email_reset(&state, &user.email, "000000", "new-password-1").await.unwrap_err();
        assert!(matches!(err, crate::errors::AppError::Unauthorized), "a wrong code should be Unauthorized, not Gone, while attempts remain");
    }

    let err = crate::auth_broker::verify_email_reset(&state, &user.email, "000000", "new-password-1").await.unwrap_err();
    assert!(matches!(err, crate::errors::AppError::Gone(_)), "the fourth attempt must be Gone regardless of correctness");
}

#[tokio::test]
async fn device_registration_is_idempotent_by_name() {
    let (state, _dir) = test_state().await;
    let user = create_user(&state, "g@example.com").await;

    let first = create_device(&state, user.id, "kitchen-tablet").await;

    let mut updated = first.clone();
    updated.fcm_token = Some("fresh-token".to_string());
    let existing = state.db.get_device_by_name_for_user(user.id, "kitchen-tablet").await.unwrap().unwrap();
    assert_eq!(existing.id, first.id);
    state.db.update_device(&updated).await.unwrap();

    let devices = state.db.list_active_devices_for_user(user.id).await.unwrap();
    assert_eq!(devices.len(), 1, "registering the same device name twice must update, not duplicate");
    assert_eq!(devices[0].fcm_token.as_deref(), Some("fresh-token"));
}

#[tokio::test]
async fn scanner_preserves_an_ignored_orphan_status_across_rescans() {
    let (state, _dir) = test_state().await;

    let photos_dir = state.config.photo_storage_path.clone();
    let orphan_path = photos_dir.join("2026").join("01");
    tokio::fs::create_dir_all(&orphan_path).await.unwrap();
    tokio::fs::write(orphan_path.join("mystery.jpg"), b"not a real photo but nonempty").await.unwrap();

    let first = state.scanner.try_scan(state.db.clone(), photos_dir.clone()).await.unwrap().unwrap();
    assert_eq!(first.orphans_found, 1);

    let orphans = state.db.list_orphans(None).await.unwrap();
    assert_eq!(orphans.len(), 1);
    let mut ignored = orphans[0].clone();
    ignored.status = OrphanStatus::Ignored;
    state.db.upsert_orphan(&ignored).await.unwrap();

    state.scanner.try_scan(state.db.clone(), photos_dir).await.unwrap().unwrap();

    let orphans_after = state.db.list_orphans(None).await.unwrap();
    assert_eq!(orphans_after.len(), 1);
    assert_eq!(orphans_after[0].status, OrphanStatus::Ignored, "an operator's ignore decision must survive a rescan");
}

#[tokio::test]
async fn scanner_flags_a_photo_row_whose_file_went_missing() {
    let (state, _dir) = test_state().await;
    let user = create_user(&state, "h@example.com").await;

    let outcome = crate::ingestion::ingest_photo(&state, user.id, None, "gone.jpg", None, Bytes::from_static(TINY_JPEG)).await.unwrap();
    state.storage.delete(&outcome.photo.stored_path).await.unwrap();

    let photos_dir = state.config.photo_storage_path.clone();
    state.scanner.try_scan(state.db.clone(), photos_dir).await.unwrap().unwrap();

    let conflicts = state.db.list_conflicts(None).await.unwrap();
    assert!(
        conflicts.iter().any(|c| c.photo_id == outcome.photo.id && c.conflict_type == photosync_shared::entities::ConflictType::PhotoIdMismatch),
        "a missing stored file must surface as a conflict for operator attention"
    );
}
