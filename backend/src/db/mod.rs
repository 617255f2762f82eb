//! Storage Layer (C1): repository contracts shared by both backends.
//!
//! Two backends satisfy [`Db`]: an embedded single-file SQLite database
//! (selected by `DATABASE_PATH`) and a networked Postgres database
//! (selected when `DATABASE_URL` is set). Both are driven through
//! `sqlx::Any` so the query layer is written once (see `sql.rs`) — the
//! same pattern the teacher used to keep one trait in front of swappable
//! backends (`db::DatabaseInterface` in front of `ArangoDb`).

pub mod sql;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use photosync_shared::entities::*;
use uuid::Uuid;

/// Cursor position for `(uploaded_at, id)` ordered pagination (§4.1, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoCursor {
    pub uploaded_at: DateTime<Utc>,
    pub id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CursorPageResult {
    pub photos: Vec<Photo>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CountByOrigin {
    pub total: i64,
    pub by_device: std::collections::HashMap<Uuid, i64>,
    pub legacy: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ClaimLegacyOutcome {
    pub claimed: u64,
    pub already_claimed: u64,
    pub failed: u64,
}

/// Which photo IDs a `ClaimLegacy` call should touch.
pub enum ClaimTarget {
    All,
    Ids(Vec<Uuid>),
}

#[async_trait]
pub trait Db: Send + Sync {
    // -- users --------------------------------------------------------
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user_by_api_key_hash(&self, hash: &str) -> Result<Option<User>>;
    async fn update_user(&self, user: &User) -> Result<()>;
    async fn list_users(&self, skip: i64, take: i64) -> Result<Vec<User>>;

    // -- devices --------------------------------------------------------
    async fn create_device(&self, device: &Device) -> Result<()>;
    async fn get_device_by_id(&self, id: Uuid) -> Result<Option<Device>>;
    async fn get_device_by_name_for_user(&self, user_id: Uuid, device_name: &str) -> Result<Option<Device>>;
    async fn update_device(&self, device: &Device) -> Result<()>;
    async fn list_active_devices_for_user(&self, user_id: Uuid) -> Result<Vec<Device>>;
    async fn delete_devices_for_user(&self, user_id: Uuid) -> Result<()>;

    // -- photos --------------------------------------------------------
    async fn create_photo(&self, photo: &Photo) -> Result<()>;
    async fn get_photo_by_id(&self, id: Uuid) -> Result<Option<Photo>>;
    async fn get_photo_by_hash(&self, hash: &str) -> Result<Option<Photo>>;
    async fn get_photos_by_hashes(&self, hashes: &[String]) -> Result<Vec<String>>;
    async fn list_photos(&self, user_id: Uuid, skip: i64, take: i64) -> Result<Vec<Photo>>;
    async fn delete_photo(&self, id: Uuid) -> Result<()>;
    async fn update_photo_thumbnails(
        &self,
        id: Uuid,
        small: Option<&str>,
        medium: Option<&str>,
        large: Option<&str>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<()>;
    async fn count_photos_for_user(&self, user_id: Uuid) -> Result<i64>;
    async fn max_uploaded_at_for_user(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>>;

    async fn cursor_page(
        &self,
        user_id: Uuid,
        cursor: Option<PhotoCursor>,
        limit: u32,
        since: Option<DateTime<Utc>>,
    ) -> Result<CursorPageResult>;

    async fn count_by_origin(&self, user_id: Uuid) -> Result<CountByOrigin>;

    async fn claim_legacy(
        &self,
        user_id: Uuid,
        device_id: Uuid,
        target: ClaimTarget,
    ) -> Result<ClaimLegacyOutcome>;

    async fn list_all_stored_paths(&self) -> Result<Vec<(Uuid, String)>>;

    // -- auth requests --------------------------------------------------
    async fn create_auth_request(&self, req: &AuthRequest) -> Result<()>;
    async fn get_auth_request(&self, id: Uuid) -> Result<Option<AuthRequest>>;
    /// Compare-and-set: only succeeds from `pending` and only if `now < expires_at`.
    /// Returns `true` if this call performed the transition (first-writer-wins, §4.7).
    async fn resolve_auth_request(
        &self,
        id: Uuid,
        approve: bool,
        device_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool>;
    /// Marks that the approved token has been handed to the browser once (so a
    /// second poll of the same approved request doesn't re-issue it).
    async fn mark_auth_request_token_issued(&self, id: Uuid) -> Result<()>;
    async fn auth_request_token_issued(&self, id: Uuid) -> Result<bool>;

    // -- delete requests --------------------------------------------------
    async fn create_delete_request(&self, req: &DeleteRequest) -> Result<()>;
    async fn get_delete_request(&self, id: Uuid) -> Result<Option<DeleteRequest>>;
    async fn resolve_delete_request(
        &self,
        id: Uuid,
        approve: bool,
        device_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    // -- web sessions --------------------------------------------------
    async fn create_session(&self, session: &WebSession) -> Result<()>;
    async fn get_session(&self, id: &str) -> Result<Option<WebSession>>;
    async fn touch_session(&self, id: &str, now: DateTime<Utc>) -> Result<()>;
    async fn deactivate_session(&self, id: &str) -> Result<()>;

    // -- password reset --------------------------------------------------
    async fn create_password_reset_token(&self, token: &PasswordResetToken) -> Result<()>;
    async fn get_active_reset_token_for_user(&self, user_id: Uuid) -> Result<Option<PasswordResetToken>>;
    async fn record_reset_attempt(&self, id: Uuid, now: DateTime<Utc>) -> Result<()>;
    async fn mark_reset_token_used(&self, id: Uuid) -> Result<()>;
    async fn revoke_reset_tokens_for_user(&self, user_id: Uuid) -> Result<()>;

    // -- device sync state --------------------------------------------------
    async fn upsert_sync_state(&self, state: &DeviceSyncState) -> Result<()>;
    async fn get_sync_state(&self, device_id: Uuid) -> Result<Option<DeviceSyncState>>;

    // -- orphans / conflicts (C8) --------------------------------------------------
    async fn upsert_orphan(&self, orphan: &OrphanFile) -> Result<()>;
    async fn get_orphan_by_path(&self, path: &str) -> Result<Option<OrphanFile>>;
    async fn list_orphans(&self, status: Option<OrphanStatus>) -> Result<Vec<OrphanFile>>;

    async fn upsert_conflict(&self, conflict: &FileConflict) -> Result<()>;
    async fn list_conflicts(&self, status: Option<ConflictStatus>) -> Result<Vec<FileConflict>>;

    /// Runs the idempotent schema migration. Safe to call on every boot (§6).
    async fn migrate(&self) -> Result<()>;
}
