//! `sqlx::Any`-backed implementation of [`Db`]. One query layer drives both
//! the embedded SQLite file (`DATABASE_PATH`) and a networked Postgres
//! instance (`DATABASE_URL`) — the same "one trait, swappable backend"
//! shape as the teacher's `ArangoDb` behind `DatabaseInterface`, just with
//! the backend choice made at connect time instead of at compile time.
//!
//! All columns are kept backend-portable on purpose: timestamps are stored
//! as RFC 3339 text, booleans as 0/1 integers, ids as text. This avoids any
//! divergence between SQLite's dynamic typing and Postgres's static typing.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use photosync_shared::entities::*;
use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::{AnyPool, Row, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::{ClaimLegacyOutcome, ClaimTarget, CountByOrigin, CursorPageResult, Db, PhotoCursor};

pub struct SqlDb {
    pool: AnyPool,
}

fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn b(v: bool) -> i64 {
    if v { 1 } else { 0 }
}

impl SqlDb {
    /// Connects using a Postgres URL (`database_url`) when present, else
    /// opens/creates the embedded SQLite file at `database_path` (§6).
    pub async fn connect(database_url: Option<&str>, database_path: &str) -> Result<Self> {
        install_default_drivers();
        let url = match database_url {
            Some(url) => url.to_string(),
            None => format!("sqlite://{database_path}?mode=rwc"),
        };
        let pool = AnyPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await?;
        Ok(Self { pool })
    }

    fn row_to_user(row: &sqlx::any::AnyRow) -> Result<User> {
        Ok(User {
            id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            api_key_hash: row.try_get("api_key_hash")?,
            password_hash: row.try_get("password_hash")?,
            is_admin: row.try_get::<i64, _>("is_admin")? != 0,
            is_active: row.try_get::<i64, _>("is_active")? != 0,
            created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        })
    }

    fn row_to_device(row: &sqlx::any::AnyRow) -> Result<Device> {
        let platform_str: String = row.try_get("platform")?;
        Ok(Device {
            id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
            user_id: Uuid::parse_str(row.try_get::<String, _>("user_id")?.as_str())?,
            device_name: row.try_get("device_name")?,
            platform: Platform::parse(&platform_str).ok_or_else(|| anyhow!("bad platform"))?,
            fcm_token: row.try_get("fcm_token")?,
            registered_at: parse_ts(&row.try_get::<String, _>("registered_at")?)?,
            last_seen_at: parse_ts(&row.try_get::<String, _>("last_seen_at")?)?,
            is_active: row.try_get::<i64, _>("is_active")? != 0,
        })
    }

    fn row_to_photo(row: &sqlx::any::AnyRow) -> Result<Photo> {
        let user_id: Option<String> = row.try_get("user_id")?;
        let origin_device_id: Option<String> = row.try_get("origin_device_id")?;
        let exif_date: Option<String> = row.try_get("exif_date_taken")?;
        Ok(Photo {
            id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
            original_filename: row.try_get("original_filename")?,
            stored_path: row.try_get("stored_path")?,
            file_hash: row.try_get("file_hash")?,
            file_size: row.try_get("file_size")?,
            date_taken: parse_ts(&row.try_get::<String, _>("date_taken")?)?,
            uploaded_at: parse_ts(&row.try_get::<String, _>("uploaded_at")?)?,
            user_id: user_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            origin_device_id: origin_device_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            thumbnail_small_path: row.try_get("thumbnail_small_path")?,
            thumbnail_medium_path: row.try_get("thumbnail_medium_path")?,
            thumbnail_large_path: row.try_get("thumbnail_large_path")?,
            width: row.try_get::<Option<i64>, _>("width")?.map(|v| v as u32),
            height: row.try_get::<Option<i64>, _>("height")?.map(|v| v as u32),
            orientation: row.try_get::<i64, _>("orientation")? as u16,
            exif: ExifData {
                camera_make: row.try_get("camera_make")?,
                camera_model: row.try_get("camera_model")?,
                lens_model: row.try_get("lens_model")?,
                focal_length: row.try_get("focal_length")?,
                aperture: row.try_get("aperture")?,
                shutter_speed: row.try_get("shutter_speed")?,
                iso: row.try_get::<Option<i64>, _>("iso")?.map(|v| v as u32),
                orientation: row.try_get::<i64, _>("orientation")? as u16,
                latitude: row.try_get("latitude")?,
                longitude: row.try_get("longitude")?,
                altitude: row.try_get("altitude")?,
                date_taken: exif_date.map(|s| parse_ts(&s)).transpose()?,
            },
        })
    }

    fn row_to_auth_request(row: &sqlx::any::AnyRow) -> Result<AuthRequest> {
        let status: String = row.try_get("status")?;
        let request_type: String = row.try_get("request_type")?;
        let responded_device_id: Option<String> = row.try_get("responded_device_id")?;
        let responded_at: Option<String> = row.try_get("responded_at")?;
        Ok(AuthRequest {
            id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
            user_id: Uuid::parse_str(row.try_get::<String, _>("user_id")?.as_str())?,
            status: AuthRequestStatus::parse(&status).ok_or_else(|| anyhow!("bad status"))?,
            created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
            expires_at: parse_ts(&row.try_get::<String, _>("expires_at")?)?,
            responded_at: responded_at.map(|s| parse_ts(&s)).transpose()?,
            responded_device_id: responded_device_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            request_type: AuthRequestType::parse(&request_type).ok_or_else(|| anyhow!("bad request_type"))?,
            new_password_hash: row.try_get("new_password_hash")?,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
        })
    }

    fn row_to_delete_request(row: &sqlx::any::AnyRow) -> Result<DeleteRequest> {
        let status: String = row.try_get("status")?;
        let responded_device_id: Option<String> = row.try_get("responded_device_id")?;
        let responded_at: Option<String> = row.try_get("responded_at")?;
        let photo_ids: String = row.try_get("photo_ids")?;
        Ok(DeleteRequest {
            id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
            user_id: Uuid::parse_str(row.try_get::<String, _>("user_id")?.as_str())?,
            status: AuthRequestStatus::parse(&status).ok_or_else(|| anyhow!("bad status"))?,
            created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
            expires_at: parse_ts(&row.try_get::<String, _>("expires_at")?)?,
            responded_at: responded_at.map(|s| parse_ts(&s)).transpose()?,
            responded_device_id: responded_device_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            photo_ids: if photo_ids.is_empty() {
                vec![]
            } else {
                photo_ids
                    .split(',')
                    .map(Uuid::parse_str)
                    .collect::<std::result::Result<Vec<_>, _>>()?
            },
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
        })
    }

    fn row_to_session(row: &sqlx::any::AnyRow) -> Result<WebSession> {
        let auth_request_id: Option<String> = row.try_get("auth_request_id")?;
        Ok(WebSession {
            id: row.try_get("id")?,
            user_id: Uuid::parse_str(row.try_get::<String, _>("user_id")?.as_str())?,
            auth_request_id: auth_request_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
            expires_at: parse_ts(&row.try_get::<String, _>("expires_at")?)?,
            last_activity_at: parse_ts(&row.try_get::<String, _>("last_activity_at")?)?,
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            is_active: row.try_get::<i64, _>("is_active")? != 0,
        })
    }

    fn row_to_reset_token(row: &sqlx::any::AnyRow) -> Result<PasswordResetToken> {
        let last_attempt_at: Option<String> = row.try_get("last_attempt_at")?;
        Ok(PasswordResetToken {
            id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
            user_id: Uuid::parse_str(row.try_get::<String, _>("user_id")?.as_str())?,
            code_hash: row.try_get("code_hash")?,
            email: row.try_get("email")?,
            expires_at: parse_ts(&row.try_get::<String, _>("expires_at")?)?,
            used: row.try_get::<i64, _>("used")? != 0,
            attempts: row.try_get::<i64, _>("attempts")? as u32,
            last_attempt_at: last_attempt_at.map(|s| parse_ts(&s)).transpose()?,
            ip_address: row.try_get("ip_address")?,
        })
    }

    fn row_to_sync_state(row: &sqlx::any::AnyRow) -> Result<DeviceSyncState> {
        let last_sync_at: Option<String> = row.try_get("last_sync_at")?;
        let last_sync_photo_id: Option<String> = row.try_get("last_sync_photo_id")?;
        Ok(DeviceSyncState {
            device_id: Uuid::parse_str(row.try_get::<String, _>("device_id")?.as_str())?,
            last_sync_at: last_sync_at.map(|s| parse_ts(&s)).transpose()?,
            last_sync_photo_id: last_sync_photo_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            sync_version: row.try_get("sync_version")?,
            created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
            updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
        })
    }

    fn row_to_orphan(row: &sqlx::any::AnyRow) -> Result<OrphanFile> {
        let status: String = row.try_get("status")?;
        let embedded_photo_id: Option<String> = row.try_get("embedded_photo_id")?;
        let embedded_user_id: Option<String> = row.try_get("embedded_user_id")?;
        let embedded_device_id: Option<String> = row.try_get("embedded_device_id")?;
        let embedded_uploaded_at: Option<String> = row.try_get("embedded_uploaded_at")?;
        Ok(OrphanFile {
            id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
            file_path: row.try_get("file_path")?,
            file_size: row.try_get("file_size")?,
            file_hash: row.try_get("file_hash")?,
            discovered_at: parse_ts(&row.try_get::<String, _>("discovered_at")?)?,
            embedded_photo_id: embedded_photo_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            embedded_user_id: embedded_user_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            embedded_device_id: embedded_device_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            embedded_hash: row.try_get("embedded_hash")?,
            embedded_uploaded_at: embedded_uploaded_at.map(|s| parse_ts(&s)).transpose()?,
            status: OrphanStatus::parse(&status).ok_or_else(|| anyhow!("bad status"))?,
        })
    }

    fn row_to_conflict(row: &sqlx::any::AnyRow) -> Result<FileConflict> {
        let conflict_type: String = row.try_get("conflict_type")?;
        let status: String = row.try_get("status")?;
        Ok(FileConflict {
            id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
            photo_id: Uuid::parse_str(row.try_get::<String, _>("photo_id")?.as_str())?,
            file_path: row.try_get("file_path")?,
            conflict_type: ConflictType::parse(&conflict_type).ok_or_else(|| anyhow!("bad conflict_type"))?,
            db_value: row.try_get("db_value")?,
            file_value: row.try_get("file_value")?,
            status: ConflictStatus::parse(&status).ok_or_else(|| anyhow!("bad status"))?,
            discovered_at: parse_ts(&row.try_get::<String, _>("discovered_at")?)?,
        })
    }
}

#[async_trait]
impl Db for SqlDb {
    async fn migrate(&self) -> Result<()> {
        for stmt in SCHEMA_STATEMENTS {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    // -- users --------------------------------------------------------
    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, display_name, api_key_hash, password_hash, is_admin, is_active, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.api_key_hash)
        .bind(&user.password_hash)
        .bind(b(user.is_admin))
        .bind(b(user.is_active))
        .bind(ts(user.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn get_user_by_api_key_hash(&self, hash: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE api_key_hash = ?")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "UPDATE users SET email = ?, display_name = ?, api_key_hash = ?, password_hash = ?, is_admin = ?, is_active = ? WHERE id = ?",
        )
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.api_key_hash)
        .bind(&user.password_hash)
        .bind(b(user.is_admin))
        .bind(b(user.is_active))
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_users(&self, skip: i64, take: i64) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at ASC LIMIT ? OFFSET ?")
            .bind(take)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_user).collect()
    }

    // -- devices --------------------------------------------------------
    async fn create_device(&self, device: &Device) -> Result<()> {
        sqlx::query(
            "INSERT INTO devices (id, user_id, device_name, platform, fcm_token, registered_at, last_seen_at, is_active) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(device.id.to_string())
        .bind(device.user_id.to_string())
        .bind(&device.device_name)
        .bind(device.platform.as_str())
        .bind(&device.fcm_token)
        .bind(ts(device.registered_at))
        .bind(ts(device.last_seen_at))
        .bind(b(device.is_active))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_device_by_id(&self, id: Uuid) -> Result<Option<Device>> {
        let row = sqlx::query("SELECT * FROM devices WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_device).transpose()
    }

    async fn get_device_by_name_for_user(&self, user_id: Uuid, device_name: &str) -> Result<Option<Device>> {
        let row = sqlx::query("SELECT * FROM devices WHERE user_id = ? AND device_name = ?")
            .bind(user_id.to_string())
            .bind(device_name)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_device).transpose()
    }

    async fn update_device(&self, device: &Device) -> Result<()> {
        sqlx::query(
            "UPDATE devices SET device_name = ?, platform = ?, fcm_token = ?, last_seen_at = ?, is_active = ? WHERE id = ?",
        )
        .bind(&device.device_name)
        .bind(device.platform.as_str())
        .bind(&device.fcm_token)
        .bind(ts(device.last_seen_at))
        .bind(b(device.is_active))
        .bind(device.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_active_devices_for_user(&self, user_id: Uuid) -> Result<Vec<Device>> {
        let rows = sqlx::query("SELECT * FROM devices WHERE user_id = ? AND is_active = 1")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_device).collect()
    }

    async fn delete_devices_for_user(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM devices WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -- photos --------------------------------------------------------
    async fn create_photo(&self, photo: &Photo) -> Result<()> {
        sqlx::query(
            "INSERT INTO photos (id, original_filename, stored_path, file_hash, file_size, date_taken, uploaded_at, user_id, origin_device_id, \
             thumbnail_small_path, thumbnail_medium_path, thumbnail_large_path, width, height, orientation, \
             camera_make, camera_model, lens_model, focal_length, aperture, shutter_speed, iso, latitude, longitude, altitude, exif_date_taken) \
             VALUES (?,?,?,?,?,?,?,?,?, ?,?,?,?,?,?, ?,?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(photo.id.to_string())
        .bind(&photo.original_filename)
        .bind(&photo.stored_path)
        .bind(&photo.file_hash)
        .bind(photo.file_size)
        .bind(ts(photo.date_taken))
        .bind(ts(photo.uploaded_at))
        .bind(photo.user_id.map(|u| u.to_string()))
        .bind(photo.origin_device_id.map(|d| d.to_string()))
        .bind(&photo.thumbnail_small_path)
        .bind(&photo.thumbnail_medium_path)
        .bind(&photo.thumbnail_large_path)
        .bind(photo.width.map(|w| w as i64))
        .bind(photo.height.map(|h| h as i64))
        .bind(photo.orientation as i64)
        .bind(&photo.exif.camera_make)
        .bind(&photo.exif.camera_model)
        .bind(&photo.exif.lens_model)
        .bind(photo.exif.focal_length)
        .bind(photo.exif.aperture)
        .bind(&photo.exif.shutter_speed)
        .bind(photo.exif.iso.map(|v| v as i64))
        .bind(photo.exif.latitude)
        .bind(photo.exif.longitude)
        .bind(photo.exif.altitude)
        .bind(photo.exif.date_taken.map(ts))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_photo_by_id(&self, id: Uuid) -> Result<Option<Photo>> {
        let row = sqlx::query("SELECT * FROM photos WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_photo).transpose()
    }

    async fn get_photo_by_hash(&self, hash: &str) -> Result<Option<Photo>> {
        let row = sqlx::query("SELECT * FROM photos WHERE file_hash = ?")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_photo).transpose()
    }

    async fn get_photos_by_hashes(&self, hashes: &[String]) -> Result<Vec<String>> {
        if hashes.is_empty() {
            return Ok(vec![]);
        }
        let placeholders = hashes.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query_str = format!("SELECT file_hash FROM photos WHERE file_hash IN ({placeholders})");
        let mut q = sqlx::query(&query_str);
        for h in hashes {
            q = q.bind(h);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(|r| Ok(r.try_get::<String, _>("file_hash")?)).collect()
    }

    async fn list_photos(&self, user_id: Uuid, skip: i64, take: i64) -> Result<Vec<Photo>> {
        let rows = sqlx::query(
            "SELECT * FROM photos WHERE user_id = ? ORDER BY uploaded_at ASC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(user_id.to_string())
        .bind(take)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_photo).collect()
    }

    async fn delete_photo(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_photo_thumbnails(
        &self,
        id: Uuid,
        small: Option<&str>,
        medium: Option<&str>,
        large: Option<&str>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE photos SET thumbnail_small_path = ?, thumbnail_medium_path = ?, thumbnail_large_path = ?, width = ?, height = ? WHERE id = ?",
        )
        .bind(small)
        .bind(medium)
        .bind(large)
        .bind(width.map(|w| w as i64))
        .bind(height.map(|h| h as i64))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_photos_for_user(&self, user_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS c FROM photos WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("c")?)
    }

    async fn max_uploaded_at_for_user(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT MAX(uploaded_at) AS m FROM photos WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        let m: Option<String> = row.try_get("m")?;
        m.map(|s| parse_ts(&s)).transpose()
    }

    async fn cursor_page(
        &self,
        user_id: Uuid,
        cursor: Option<PhotoCursor>,
        limit: u32,
        since: Option<DateTime<Utc>>,
    ) -> Result<CursorPageResult> {
        // Fetch one extra row to detect `has_more` without a second COUNT query.
        let fetch_limit = (limit as i64) + 1;
        let rows = match (cursor, since) {
            (Some(c), Some(s)) => {
                sqlx::query(
                    "SELECT * FROM photos WHERE user_id = ? AND uploaded_at >= ? \
                     AND (uploaded_at > ? OR (uploaded_at = ? AND id > ?)) \
                     ORDER BY uploaded_at ASC, id ASC LIMIT ?",
                )
                .bind(user_id.to_string())
                .bind(ts(s))
                .bind(ts(c.uploaded_at))
                .bind(ts(c.uploaded_at))
                .bind(c.id.to_string())
                .bind(fetch_limit)
                .fetch_all(&self.pool)
                .await?
            }
            (Some(c), None) => {
                sqlx::query(
                    "SELECT * FROM photos WHERE user_id = ? \
                     AND (uploaded_at > ? OR (uploaded_at = ? AND id > ?)) \
                     ORDER BY uploaded_at ASC, id ASC LIMIT ?",
                )
                .bind(user_id.to_string())
                .bind(ts(c.uploaded_at))
                .bind(ts(c.uploaded_at))
                .bind(c.id.to_string())
                .bind(fetch_limit)
                .fetch_all(&self.pool)
                .await?
            }
            (None, Some(s)) => {
                sqlx::query(
                    "SELECT * FROM photos WHERE user_id = ? AND uploaded_at >= ? ORDER BY uploaded_at ASC, id ASC LIMIT ?",
                )
                .bind(user_id.to_string())
                .bind(ts(s))
                .bind(fetch_limit)
                .fetch_all(&self.pool)
                .await?
            }
            (None, None) => {
                sqlx::query("SELECT * FROM photos WHERE user_id = ? ORDER BY uploaded_at ASC, id ASC LIMIT ?")
                    .bind(user_id.to_string())
                    .bind(fetch_limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        let mut photos: Vec<Photo> = rows.iter().map(Self::row_to_photo).collect::<Result<_>>()?;
        let has_more = photos.len() as i64 > limit as i64;
        photos.truncate(limit as usize);
        Ok(CursorPageResult { photos, has_more })
    }

    async fn count_by_origin(&self, user_id: Uuid) -> Result<CountByOrigin> {
        let total_row = sqlx::query("SELECT COUNT(*) AS c FROM photos WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = total_row.try_get("c")?;

        let legacy_row = sqlx::query("SELECT COUNT(*) AS c FROM photos WHERE user_id = ? AND origin_device_id IS NULL")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        let legacy: i64 = legacy_row.try_get("c")?;

        let rows = sqlx::query(
            "SELECT origin_device_id, COUNT(*) AS c FROM photos WHERE user_id = ? AND origin_device_id IS NOT NULL GROUP BY origin_device_id",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        let mut by_device = HashMap::new();
        for row in rows {
            let device_id: String = row.try_get("origin_device_id")?;
            let count: i64 = row.try_get("c")?;
            by_device.insert(Uuid::parse_str(&device_id)?, count);
        }

        Ok(CountByOrigin { total, by_device, legacy })
    }

    async fn claim_legacy(&self, user_id: Uuid, device_id: Uuid, target: ClaimTarget) -> Result<ClaimLegacyOutcome> {
        let mut tx: Transaction<'_, sqlx::Any> = self.pool.begin().await?;
        let outcome = match target {
            ClaimTarget::All => {
                let result = sqlx::query(
                    "UPDATE photos SET origin_device_id = ? WHERE user_id = ? AND origin_device_id IS NULL",
                )
                .bind(device_id.to_string())
                .bind(user_id.to_string())
                .execute(&mut *tx)
                .await?;
                ClaimLegacyOutcome {
                    claimed: result.rows_affected(),
                    already_claimed: 0,
                    failed: 0,
                }
            }
            ClaimTarget::Ids(ids) => {
                let mut outcome = ClaimLegacyOutcome::default();
                for photo_id in ids {
                    let row = sqlx::query("SELECT user_id, origin_device_id FROM photos WHERE id = ?")
                        .bind(photo_id.to_string())
                        .fetch_optional(&mut *tx)
                        .await?;
                    let Some(row) = row else {
                        outcome.failed += 1;
                        continue;
                    };
                    let owner: Option<String> = row.try_get("user_id")?;
                    if owner.as_deref() != Some(user_id.to_string().as_str()) {
                        // Not owned by the requesting user: conservative "failed" (§9).
                        outcome.failed += 1;
                        continue;
                    }
                    let origin: Option<String> = row.try_get("origin_device_id")?;
                    if origin.is_some() {
                        outcome.already_claimed += 1;
                        continue;
                    }
                    sqlx::query("UPDATE photos SET origin_device_id = ? WHERE id = ?")
                        .bind(device_id.to_string())
                        .bind(photo_id.to_string())
                        .execute(&mut *tx)
                        .await?;
                    outcome.claimed += 1;
                }
                outcome
            }
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn list_all_stored_paths(&self) -> Result<Vec<(Uuid, String)>> {
        let rows = sqlx::query("SELECT id, stored_path FROM photos").fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| Ok((Uuid::parse_str(&r.try_get::<String, _>("id")?)?, r.try_get::<String, _>("stored_path")?)))
            .collect()
    }

    // -- auth requests --------------------------------------------------
    async fn create_auth_request(&self, req: &AuthRequest) -> Result<()> {
        sqlx::query(
            "INSERT INTO auth_requests (id, user_id, status, created_at, expires_at, responded_at, responded_device_id, request_type, new_password_hash, ip_address, user_agent, token_issued) \
             VALUES (?,?,?,?,?,?,?,?,?,?,?,0)",
        )
        .bind(req.id.to_string())
        .bind(req.user_id.to_string())
        .bind(req.status.as_str())
        .bind(ts(req.created_at))
        .bind(ts(req.expires_at))
        .bind(req.responded_at.map(ts))
        .bind(req.responded_device_id.map(|d| d.to_string()))
        .bind(req.request_type.as_str())
        .bind(&req.new_password_hash)
        .bind(&req.ip_address)
        .bind(&req.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_auth_request(&self, id: Uuid) -> Result<Option<AuthRequest>> {
        let row = sqlx::query("SELECT * FROM auth_requests WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_auth_request).transpose()
    }

    async fn resolve_auth_request(&self, id: Uuid, approve: bool, device_id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let new_status = if approve { AuthRequestStatus::Approved } else { AuthRequestStatus::Denied };
        let result = sqlx::query(
            "UPDATE auth_requests SET status = ?, responded_at = ?, responded_device_id = ? \
             WHERE id = ? AND status = 'pending' AND ? < expires_at",
        )
        .bind(new_status.as_str())
        .bind(ts(now))
        .bind(device_id.to_string())
        .bind(id.to_string())
        .bind(ts(now))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_auth_request_token_issued(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE auth_requests SET token_issued = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn auth_request_token_issued(&self, id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT token_issued FROM auth_requests WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("token_issued")? != 0)
    }

    // -- delete requests --------------------------------------------------
    async fn create_delete_request(&self, req: &DeleteRequest) -> Result<()> {
        let photo_ids = req.photo_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
        sqlx::query(
            "INSERT INTO delete_requests (id, user_id, status, created_at, expires_at, responded_at, responded_device_id, photo_ids, ip_address, user_agent) \
             VALUES (?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(req.id.to_string())
        .bind(req.user_id.to_string())
        .bind(req.status.as_str())
        .bind(ts(req.created_at))
        .bind(ts(req.expires_at))
        .bind(req.responded_at.map(ts))
        .bind(req.responded_device_id.map(|d| d.to_string()))
        .bind(photo_ids)
        .bind(&req.ip_address)
        .bind(&req.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_delete_request(&self, id: Uuid) -> Result<Option<DeleteRequest>> {
        let row = sqlx::query("SELECT * FROM delete_requests WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_delete_request).transpose()
    }

    async fn resolve_delete_request(&self, id: Uuid, approve: bool, device_id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let new_status = if approve { AuthRequestStatus::Approved } else { AuthRequestStatus::Denied };
        let result = sqlx::query(
            "UPDATE delete_requests SET status = ?, responded_at = ?, responded_device_id = ? \
             WHERE id = ? AND status = 'pending' AND ? < expires_at",
        )
        .bind(new_status.as_str())
        .bind(ts(now))
        .bind(device_id.to_string())
        .bind(id.to_string())
        .bind(ts(now))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- web sessions --------------------------------------------------
    async fn create_session(&self, session: &WebSession) -> Result<()> {
        sqlx::query(
            "INSERT INTO web_sessions (id, user_id, auth_request_id, created_at, expires_at, last_activity_at, ip_address, user_agent, is_active) \
             VALUES (?,?,?,?,?,?,?,?,?)",
        )
        .bind(&session.id)
        .bind(session.user_id.to_string())
        .bind(session.auth_request_id.map(|r| r.to_string()))
        .bind(ts(session.created_at))
        .bind(ts(session.expires_at))
        .bind(ts(session.last_activity_at))
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(b(session.is_active))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<WebSession>> {
        let row = sqlx::query("SELECT * FROM web_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn touch_session(&self, id: &str, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE web_sessions SET last_activity_at = ? WHERE id = ?")
            .bind(ts(now))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn deactivate_session(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE web_sessions SET is_active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -- password reset --------------------------------------------------
    async fn create_password_reset_token(&self, token: &PasswordResetToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO password_reset_tokens (id, user_id, code_hash, email, expires_at, used, attempts, last_attempt_at, ip_address) \
             VALUES (?,?,?,?,?,?,?,?,?)",
        )
        .bind(token.id.to_string())
        .bind(token.user_id.to_string())
        .bind(&token.code_hash)
        .bind(&token.email)
        .bind(ts(token.expires_at))
        .bind(b(token.used))
        .bind(token.attempts as i64)
        .bind(token.last_attempt_at.map(ts))
        .bind(&token.ip_address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_active_reset_token_for_user(&self, user_id: Uuid) -> Result<Option<PasswordResetToken>> {
        let row = sqlx::query(
            "SELECT * FROM password_reset_tokens WHERE user_id = ? AND used = 0 ORDER BY expires_at DESC LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_reset_token).transpose()
    }

    async fn record_reset_attempt(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE password_reset_tokens SET attempts = attempts + 1, last_attempt_at = ? WHERE id = ?")
            .bind(ts(now))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_reset_token_used(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE password_reset_tokens SET used = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke_reset_tokens_for_user(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE password_reset_tokens SET used = 1 WHERE user_id = ? AND used = 0")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -- device sync state --------------------------------------------------
    async fn upsert_sync_state(&self, state: &DeviceSyncState) -> Result<()> {
        let existing = self.get_sync_state(state.device_id).await?;
        if existing.is_some() {
            sqlx::query(
                "UPDATE device_sync_state SET last_sync_at = ?, last_sync_photo_id = ?, sync_version = ?, updated_at = ? WHERE device_id = ?",
            )
            .bind(state.last_sync_at.map(ts))
            .bind(state.last_sync_photo_id.map(|p| p.to_string()))
            .bind(state.sync_version)
            .bind(ts(state.updated_at))
            .bind(state.device_id.to_string())
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "INSERT INTO device_sync_state (device_id, last_sync_at, last_sync_photo_id, sync_version, created_at, updated_at) VALUES (?,?,?,?,?,?)",
            )
            .bind(state.device_id.to_string())
            .bind(state.last_sync_at.map(ts))
            .bind(state.last_sync_photo_id.map(|p| p.to_string()))
            .bind(state.sync_version)
            .bind(ts(state.created_at))
            .bind(ts(state.updated_at))
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn get_sync_state(&self, device_id: Uuid) -> Result<Option<DeviceSyncState>> {
        let row = sqlx::query("SELECT * FROM device_sync_state WHERE device_id = ?")
            .bind(device_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_sync_state).transpose()
    }

    // -- orphans / conflicts --------------------------------------------------
    async fn upsert_orphan(&self, orphan: &OrphanFile) -> Result<()> {
        let existing = self.get_orphan_by_path(&orphan.file_path).await?;
        if let Some(existing) = existing {
            sqlx::query(
                "UPDATE orphan_files SET file_size = ?, file_hash = ?, discovered_at = ?, embedded_photo_id = ?, embedded_user_id = ?, embedded_device_id = ?, embedded_hash = ?, embedded_uploaded_at = ?, status = ? WHERE id = ?",
            )
            .bind(orphan.file_size)
            .bind(&orphan.file_hash)
            .bind(ts(orphan.discovered_at))
            .bind(orphan.embedded_photo_id.map(|p| p.to_string()))
            .bind(orphan.embedded_user_id.map(|u| u.to_string()))
            .bind(orphan.embedded_device_id.map(|d| d.to_string()))
            .bind(&orphan.embedded_hash)
            .bind(orphan.embedded_uploaded_at.map(ts))
            .bind(orphan.status.as_str())
            .bind(existing.id.to_string())
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "INSERT INTO orphan_files (id, file_path, file_size, file_hash, discovered_at, embedded_photo_id, embedded_user_id, embedded_device_id, embedded_hash, embedded_uploaded_at, status) \
                 VALUES (?,?,?,?,?,?,?,?,?,?,?)",
            )
            .bind(orphan.id.to_string())
            .bind(&orphan.file_path)
            .bind(orphan.file_size)
            .bind(&orphan.file_hash)
            .bind(ts(orphan.discovered_at))
            .bind(orphan.embedded_photo_id.map(|p| p.to_string()))
            .bind(orphan.embedded_user_id.map(|u| u.to_string()))
            .bind(orphan.embedded_device_id.map(|d| d.to_string()))
            .bind(&orphan.embedded_hash)
            .bind(orphan.embedded_uploaded_at.map(ts))
            .bind(orphan.status.as_str())
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn get_orphan_by_path(&self, path: &str) -> Result<Option<OrphanFile>> {
        let row = sqlx::query("SELECT * FROM orphan_files WHERE file_path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_orphan).transpose()
    }

    async fn list_orphans(&self, status: Option<OrphanStatus>) -> Result<Vec<OrphanFile>> {
        let rows = match status {
            Some(s) => {
                sqlx::query("SELECT * FROM orphan_files WHERE status = ? ORDER BY discovered_at DESC")
                    .bind(s.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM orphan_files ORDER BY discovered_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(Self::row_to_orphan).collect()
    }

    async fn upsert_conflict(&self, conflict: &FileConflict) -> Result<()> {
        let existing = sqlx::query("SELECT id FROM file_conflicts WHERE photo_id = ? AND conflict_type = ?")
            .bind(conflict.photo_id.to_string())
            .bind(conflict.conflict_type.as_str())
            .fetch_optional(&self.pool)
            .await?;
        if let Some(row) = existing {
            let id: String = row.try_get("id")?;
            sqlx::query(
                "UPDATE file_conflicts SET file_path = ?, db_value = ?, file_value = ?, status = ?, discovered_at = ? WHERE id = ?",
            )
            .bind(&conflict.file_path)
            .bind(&conflict.db_value)
            .bind(&conflict.file_value)
            .bind(conflict.status.as_str())
            .bind(ts(conflict.discovered_at))
            .bind(id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "INSERT INTO file_conflicts (id, photo_id, file_path, conflict_type, db_value, file_value, status, discovered_at) VALUES (?,?,?,?,?,?,?,?)",
            )
            .bind(conflict.id.to_string())
            .bind(conflict.photo_id.to_string())
            .bind(&conflict.file_path)
            .bind(conflict.conflict_type.as_str())
            .bind(&conflict.db_value)
            .bind(&conflict.file_value)
            .bind(conflict.status.as_str())
            .bind(ts(conflict.discovered_at))
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn list_conflicts(&self, status: Option<ConflictStatus>) -> Result<Vec<FileConflict>> {
        let rows = match status {
            Some(s) => {
                sqlx::query("SELECT * FROM file_conflicts WHERE status = ? ORDER BY discovered_at DESC")
                    .bind(s.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM file_conflicts ORDER BY discovered_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(Self::row_to_conflict).collect()
    }
}

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        api_key_hash TEXT NOT NULL UNIQUE,
        password_hash TEXT,
        is_admin INTEGER NOT NULL,
        is_active INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS devices (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        device_name TEXT NOT NULL,
        platform TEXT NOT NULL,
        fcm_token TEXT,
        registered_at TEXT NOT NULL,
        last_seen_at TEXT NOT NULL,
        is_active INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS photos (
        id TEXT PRIMARY KEY,
        original_filename TEXT NOT NULL,
        stored_path TEXT NOT NULL,
        file_hash TEXT NOT NULL UNIQUE,
        file_size BIGINT NOT NULL,
        date_taken TEXT NOT NULL,
        uploaded_at TEXT NOT NULL,
        user_id TEXT REFERENCES users(id),
        origin_device_id TEXT REFERENCES devices(id) ON DELETE SET NULL,
        thumbnail_small_path TEXT,
        thumbnail_medium_path TEXT,
        thumbnail_large_path TEXT,
        width INTEGER,
        height INTEGER,
        orientation INTEGER NOT NULL,
        camera_make TEXT,
        camera_model TEXT,
        lens_model TEXT,
        focal_length REAL,
        aperture REAL,
        shutter_speed TEXT,
        iso INTEGER,
        latitude REAL,
        longitude REAL,
        altitude REAL,
        exif_date_taken TEXT
    )",
    "CREATE TABLE IF NOT EXISTS auth_requests (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        responded_at TEXT,
        responded_device_id TEXT,
        request_type TEXT NOT NULL,
        new_password_hash TEXT,
        ip_address TEXT NOT NULL,
        user_agent TEXT NOT NULL,
        token_issued INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS delete_requests (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        responded_at TEXT,
        responded_device_id TEXT,
        photo_ids TEXT NOT NULL,
        ip_address TEXT NOT NULL,
        user_agent TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS web_sessions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        auth_request_id TEXT,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        last_activity_at TEXT NOT NULL,
        ip_address TEXT NOT NULL,
        user_agent TEXT NOT NULL,
        is_active INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS password_reset_tokens (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        code_hash TEXT NOT NULL,
        email TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        used INTEGER NOT NULL,
        attempts INTEGER NOT NULL,
        last_attempt_at TEXT,
        ip_address TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS invite_tokens (
        id TEXT PRIMARY KEY,
        token_hash TEXT NOT NULL,
        created_by TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        used INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS recovery_tokens (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        token_hash TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        used INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS bootstrap_keys (
        id TEXT PRIMARY KEY,
        token_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        used INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS device_sync_state (
        device_id TEXT PRIMARY KEY,
        last_sync_at TEXT,
        last_sync_photo_id TEXT,
        sync_version BIGINT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orphan_files (
        id TEXT PRIMARY KEY,
        file_path TEXT NOT NULL UNIQUE,
        file_size BIGINT NOT NULL,
        file_hash TEXT,
        discovered_at TEXT NOT NULL,
        embedded_photo_id TEXT,
        embedded_user_id TEXT,
        embedded_device_id TEXT,
        embedded_hash TEXT,
        embedded_uploaded_at TEXT,
        status TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS file_conflicts (
        id TEXT PRIMARY KEY,
        photo_id TEXT NOT NULL,
        file_path TEXT NOT NULL,
        conflict_type TEXT NOT NULL,
        db_value TEXT,
        file_value TEXT,
        status TEXT NOT NULL,
        discovered_at TEXT NOT NULL
    )",
];
