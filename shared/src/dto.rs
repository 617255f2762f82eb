//! Wire-format DTOs for the HTTP/JSON API (§6). Kept separate from the
//! persisted entities so storage-shape changes don't ripple into the
//! protocol and vice versa. All wire structs use `camelCase` field names,
//! matching the JSON shapes spec.md §6 documents (`storedPath`,
//! `isDuplicate`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: Uuid,
    pub stored_path: String,
    pub uploaded_at: DateTime<Utc>,
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckHashesRequest {
    pub hashes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckHashesResponse {
    pub existing: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginDeviceDto {
    pub id: Uuid,
    pub name: String,
    pub platform: String,
    pub is_current_device: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDto {
    pub id: Uuid,
    pub original_filename: String,
    pub stored_path: String,
    pub file_hash: String,
    pub file_size: i64,
    pub date_taken: DateTime<Utc>,
    pub uploaded_at: DateTime<Utc>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub thumbnail_small_url: Option<String>,
    pub thumbnail_medium_url: Option<String>,
    pub thumbnail_large_url: Option<String>,
    pub origin_device: Option<OriginDeviceDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub total_photos: i64,
    pub device_photos: i64,
    pub other_device_photos: i64,
    pub legacy_photos: i64,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub server_version: i64,
    pub needs_legacy_claim: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDeltaRequest {
    pub device_id: Uuid,
    pub cursor: Option<String>,
    pub limit: u32,
    #[serde(default)]
    pub include_thumbnail_urls: bool,
    pub since_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    pub cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummaryDto {
    pub total_count: i64,
    pub returned_count: i64,
    pub server_version: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDeltaResponse {
    pub photos: Vec<PhotoDto>,
    pub pagination: PaginationDto,
    pub sync: SyncSummaryDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLegacyRequest {
    pub device_id: Uuid,
    #[serde(default)]
    pub claim_all: bool,
    #[serde(default)]
    pub photo_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLegacyResponse {
    pub claimed: u64,
    pub already_claimed: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegisterRequest {
    pub device_name: String,
    pub platform: String,
    pub fcm_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegisterResponse {
    pub id: Uuid,
    pub device_name: String,
    pub platform: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAuthInitiateRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAuthInitiateResponse {
    pub request_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAuthStatusResponse {
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub session_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAuthRespondRequest {
    pub request_id: Uuid,
    pub approved: bool,
    pub device_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailResetInitiateRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailResetVerifyRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneResetInitiateRequest {
    pub email: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneResetInitiateResponse {
    pub request_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneResetStatusResponse {
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountByOriginResponse {
    pub total: i64,
    pub by_device: std::collections::HashMap<Uuid, i64>,
    pub legacy: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatusResponse {
    pub setup_complete: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRegisterResponse {
    pub user_id: Uuid,
    pub email: String,
    pub api_key: String,
}
