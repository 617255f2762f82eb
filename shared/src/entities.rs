//! Persisted domain entities. Storage-backend agnostic: no SQL, no
//! filesystem paths baked in beyond the opaque `stored_path` string that
//! the file store hands back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Some(Platform::Ios),
            "android" => Some(Platform::Android),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthRequestStatus {
    Pending,
    Approved,
    Denied,
    Expired,
}

impl AuthRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthRequestStatus::Pending => "pending",
            AuthRequestStatus::Approved => "approved",
            AuthRequestStatus::Denied => "denied",
            AuthRequestStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AuthRequestStatus::Pending),
            "approved" => Some(AuthRequestStatus::Approved),
            "denied" => Some(AuthRequestStatus::Denied),
            "expired" => Some(AuthRequestStatus::Expired),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, AuthRequestStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthRequestType {
    WebLogin,
    PasswordReset,
}

impl AuthRequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthRequestType::WebLogin => "web_login",
            AuthRequestType::PasswordReset => "password_reset",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "web_login" => Some(AuthRequestType::WebLogin),
            "password_reset" => Some(AuthRequestType::PasswordReset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanStatus {
    Pending,
    Ignored,
    Claimed,
    Deleted,
}

impl OrphanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrphanStatus::Pending => "pending",
            OrphanStatus::Ignored => "ignored",
            OrphanStatus::Claimed => "claimed",
            OrphanStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrphanStatus::Pending),
            "ignored" => Some(OrphanStatus::Ignored),
            "claimed" => Some(OrphanStatus::Claimed),
            "deleted" => Some(OrphanStatus::Deleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    PhotoIdMismatch,
    UserIdMismatch,
    DeviceIdMismatch,
    HashMismatch,
}

impl ConflictType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictType::PhotoIdMismatch => "photo_id_mismatch",
            ConflictType::UserIdMismatch => "user_id_mismatch",
            ConflictType::DeviceIdMismatch => "device_id_mismatch",
            ConflictType::HashMismatch => "hash_mismatch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photo_id_mismatch" => Some(ConflictType::PhotoIdMismatch),
            "user_id_mismatch" => Some(ConflictType::UserIdMismatch),
            "device_id_mismatch" => Some(ConflictType::DeviceIdMismatch),
            "hash_mismatch" => Some(ConflictType::HashMismatch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Pending,
    ResolvedDb,
    ResolvedFile,
    Ignored,
}

impl ConflictStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictStatus::Pending => "pending",
            ConflictStatus::ResolvedDb => "resolved_db",
            ConflictStatus::ResolvedFile => "resolved_file",
            ConflictStatus::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ConflictStatus::Pending),
            "resolved_db" => Some(ConflictStatus::ResolvedDb),
            "resolved_file" => Some(ConflictStatus::ResolvedFile),
            "ignored" => Some(ConflictStatus::Ignored),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub api_key_hash: String,
    pub password_hash: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_name: String,
    pub platform: Platform,
    pub fcm_token: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExifData {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_model: Option<String>,
    pub focal_length: Option<f64>,
    pub aperture: Option<f64>,
    pub shutter_speed: Option<String>,
    pub iso: Option<u32>,
    pub orientation: u16,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub date_taken: Option<DateTime<Utc>>,
}

impl ExifData {
    pub fn default_orientation() -> u16 {
        1
    }
}

/// Missing or malformed EXIF is not fatal (§4.3) — a photo with no usable
/// block still gets `orientation = 1` ("no rotation"), not `0` (which isn't
/// a valid EXIF orientation value at all).
impl Default for ExifData {
    fn default() -> Self {
        Self {
            camera_make: None,
            camera_model: None,
            lens_model: None,
            focal_length: None,
            aperture: None,
            shutter_speed: None,
            iso: None,
            orientation: Self::default_orientation(),
            latitude: None,
            longitude: None,
            altitude: None,
            date_taken: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: Uuid,
    pub original_filename: String,
    pub stored_path: String,
    pub file_hash: String,
    pub file_size: i64,
    pub date_taken: DateTime<Utc>,
    pub uploaded_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub origin_device_id: Option<Uuid>,
    pub thumbnail_small_path: Option<String>,
    pub thumbnail_medium_path: Option<String>,
    pub thumbnail_large_path: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub orientation: u16,
    pub exif: ExifData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: AuthRequestStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responded_device_id: Option<Uuid>,
    pub request_type: AuthRequestType,
    pub new_password_hash: Option<String>,
    pub ip_address: String,
    pub user_agent: String,
}

impl AuthRequest {
    /// Observed status, folding `pending ∧ now >= expires_at` into `expired`
    /// without mutating the stored row (§4.7).
    pub fn effective_status(&self, now: DateTime<Utc>) -> AuthRequestStatus {
        if self.status == AuthRequestStatus::Pending && now >= self.expires_at {
            AuthRequestStatus::Expired
        } else {
            self.status
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: AuthRequestStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responded_device_id: Option<Uuid>,
    pub photo_ids: Vec<Uuid>,
    pub ip_address: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSession {
    pub id: String,
    pub user_id: Uuid,
    pub auth_request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub ip_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteToken {
    pub id: Uuid,
    pub token_hash: String,
    pub created_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapKey {
    pub id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSyncState {
    pub device_id: Uuid,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_photo_id: Option<Uuid>,
    pub sync_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrphanFile {
    pub id: Uuid,
    pub file_path: String,
    pub file_size: i64,
    pub file_hash: Option<String>,
    pub discovered_at: DateTime<Utc>,
    pub embedded_photo_id: Option<Uuid>,
    pub embedded_user_id: Option<Uuid>,
    pub embedded_device_id: Option<Uuid>,
    pub embedded_hash: Option<String>,
    pub embedded_uploaded_at: Option<DateTime<Utc>>,
    pub status: OrphanStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConflict {
    pub id: Uuid,
    pub photo_id: Uuid,
    pub file_path: String,
    pub conflict_type: ConflictType,
    pub db_value: Option<String>,
    pub file_value: Option<String>,
    pub status: ConflictStatus,
    pub discovered_at: DateTime<Utc>,
}
