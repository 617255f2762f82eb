//! Sync Engine (C6): delta pages ordered by `(uploadedAt, id)`, status
//! summaries, and legacy-photo claiming. Cursors are opaque to the client
//! but not to the server — they carry `(uploaded_at, id)` plus a signature
//! over the server's `cursor_secret` so a client can't forge a cursor that
//! walks another user's library (§4.6, §9 "cursor opaqueness").

use chrono::{DateTime, Utc};
use photosync_shared::entities::{DeviceSyncState, Photo};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::{ClaimLegacyOutcome, ClaimTarget, PhotoCursor};
use crate::errors::AppError;
use crate::state::AppState;

/// `Status(userId, deviceId?)` (§4.6).
pub struct SyncStatus {
    pub total_photos: i64,
    pub device_photos: i64,
    pub other_device_photos: i64,
    pub legacy_photos: i64,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub server_version: i64,
    pub needs_legacy_claim: bool,
}

pub async fn status(state: &AppState, user_id: Uuid, device_id: Option<Uuid>) -> Result<SyncStatus, AppError> {
    let counts = state.db.count_by_origin(user_id).await.map_err(AppError::Internal)?;
    let server_version = state
        .db
        .max_uploaded_at_for_user(user_id)
        .await
        .map_err(AppError::Internal)?
        .map(|t| t.timestamp_millis())
        .unwrap_or(0);

    // A device only "belongs" to this status view if it's actually owned by
    // the caller — an `X-Device-ID` for someone else's device or a stale ID
    // degrades to the no-device view rather than leaking counts (§6, §7).
    let mut device_photos = 0;
    let mut last_sync_at = None;
    let mut device_owned = false;
    if let Some(device_id) = device_id {
        if let Some(device) = state.db.get_device_by_id(device_id).await.map_err(AppError::Internal)? {
            if device.user_id == user_id {
                device_owned = true;
                device_photos = counts.by_device.get(&device_id).copied().unwrap_or(0);
                last_sync_at = state
                    .db
                    .get_sync_state(device_id)
                    .await
                    .map_err(AppError::Internal)?
                    .and_then(|s| s.last_sync_at);
            }
        }
    }

    let other_device_photos = counts.total - device_photos - counts.legacy;

    Ok(SyncStatus {
        total_photos: counts.total,
        device_photos,
        other_device_photos,
        legacy_photos: counts.legacy,
        last_sync_at,
        server_version,
        needs_legacy_claim: counts.legacy > 0 && device_owned,
    })
}

pub struct ResolvedOriginDevice {
    pub id: Uuid,
    pub name: String,
    pub platform: &'static str,
    pub is_current_device: bool,
}

pub struct DeltaPage {
    pub photos: Vec<(Photo, Option<ResolvedOriginDevice>)>,
    pub cursor: Option<String>,
    pub has_more: bool,
    pub total_count: i64,
    pub server_version: i64,
}

/// `Delta(userId, deviceId, cursor?, limit, sinceTimestamp?, ...)` (§4.6).
/// `limit` is clamped server-side; cursors are decoded and re-validated
/// against `cursor_secret` before touching the database.
pub async fn delta(
    state: &AppState,
    user_id: Uuid,
    requesting_device_id: Uuid,
    cursor: Option<&str>,
    limit: u32,
    since: Option<DateTime<Utc>>,
) -> Result<DeltaPage, AppError> {
    const SERVER_MAX_LIMIT: u32 = 500;
    let limit = limit.clamp(1, SERVER_MAX_LIMIT);

    let decoded_cursor = cursor.map(|c| decode_cursor(&state.config.cursor_secret, c)).transpose()?;

    let page = state
        .db
        .cursor_page(user_id, decoded_cursor, limit, since)
        .await
        .map_err(AppError::Internal)?;

    let total_count = state.db.count_photos_for_user(user_id).await.map_err(AppError::Internal)?;
    let server_version = state
        .db
        .max_uploaded_at_for_user(user_id)
        .await
        .map_err(AppError::Internal)?
        .map(|t| t.timestamp_millis())
        .unwrap_or(0);

    let next_cursor = if page.has_more {
        page.photos.last().map(|p| encode_cursor(&state.config.cursor_secret, PhotoCursor { uploaded_at: p.uploaded_at, id: p.id }))
    } else {
        None
    };

    let mut device_cache: HashMap<Uuid, photosync_shared::entities::Device> = HashMap::new();
    let mut resolved = Vec::with_capacity(page.photos.len());
    for photo in page.photos {
        let origin = match photo.origin_device_id {
            None => None,
            Some(device_id) => {
                if !device_cache.contains_key(&device_id) {
                    if let Some(device) = state.db.get_device_by_id(device_id).await.map_err(AppError::Internal)? {
                        device_cache.insert(device_id, device);
                    }
                }
                device_cache.get(&device_id).map(|d| ResolvedOriginDevice {
                    id: d.id,
                    name: d.device_name.clone(),
                    platform: d.platform.as_str(),
                    is_current_device: d.id == requesting_device_id,
                })
            }
        };
        resolved.push((photo, origin));
    }

    let last_photo_id = resolved.last().map(|(p, _)| p.id);
    record_sync_progress(state, requesting_device_id, last_photo_id).await?;

    Ok(DeltaPage { photos: resolved, cursor: next_cursor, has_more: page.has_more, total_count, server_version })
}

/// Records that `device_id` just completed a `Delta` page, so `Status`'s
/// `lastSyncAt` (§4.6) reflects reality instead of staying permanently
/// null. A page that returned nothing still counts as a sync — it confirms
/// the device is caught up — so this runs unconditionally, just without
/// advancing `last_sync_photo_id` when there was nothing new to record.
async fn record_sync_progress(state: &AppState, device_id: Uuid, last_photo_id: Option<Uuid>) -> Result<(), AppError> {
    let now = Utc::now();
    let existing = state.db.get_sync_state(device_id).await.map_err(AppError::Internal)?;
    let sync_state = DeviceSyncState {
        device_id,
        last_sync_at: Some(now),
        last_sync_photo_id: last_photo_id.or_else(|| existing.as_ref().and_then(|s| s.last_sync_photo_id)),
        sync_version: existing.as_ref().map(|s| s.sync_version + 1).unwrap_or(1),
        created_at: existing.as_ref().map(|s| s.created_at).unwrap_or(now),
        updated_at: now,
    };
    state.db.upsert_sync_state(&sync_state).await.map_err(AppError::Internal)
}

/// `ClaimLegacy(userId, deviceId, {claimAll | photoIds})` (§4.6). The
/// device must belong to the caller — claiming into someone else's device
/// would let a caller reassign another user's sync partition.
pub async fn claim_legacy(
    state: &AppState,
    user_id: Uuid,
    device_id: Uuid,
    target: ClaimTarget,
) -> Result<ClaimLegacyOutcome, AppError> {
    let device = state
        .db
        .get_device_by_id(device_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("device not found"))?;
    if device.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    state.db.claim_legacy(user_id, device_id, target).await.map_err(AppError::Internal)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

fn sign(secret: &str, payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Encodes `(uploaded_at, id)` plus a signature into an opaque token.
pub fn encode_cursor(secret: &str, cursor: PhotoCursor) -> String {
    let payload = format!("{}:{}", cursor.uploaded_at.to_rfc3339(), cursor.id);
    let signature = sign(secret, &payload);
    format!("{}.{signature}", hex_encode(payload.as_bytes()))
}

/// Decodes and verifies a cursor produced by [`encode_cursor`]. A forged or
/// corrupted cursor is a `BadRequest`, never a panic or a silent reset to
/// page 1 (§4.6 edge case: "malformed cursor").
pub fn decode_cursor(secret: &str, token: &str) -> Result<PhotoCursor, AppError> {
    let (payload_hex, signature) = token
        .split_once('.')
        .ok_or_else(|| AppError::bad_request("malformed cursor"))?;
    let payload_bytes = hex_decode(payload_hex).ok_or_else(|| AppError::bad_request("malformed cursor"))?;
    let payload = String::from_utf8(payload_bytes).map_err(|_| AppError::bad_request("malformed cursor"))?;

    let expected = sign(secret, &payload);
    if expected != signature {
        return Err(AppError::bad_request("invalid cursor signature"));
    }

    let (uploaded_at_str, id_str) = payload.split_once(':').ok_or_else(|| AppError::bad_request("malformed cursor"))?;
    let uploaded_at = DateTime::parse_from_rfc3339(uploaded_at_str)
        .map_err(|_| AppError::bad_request("malformed cursor"))?
        .with_timezone(&Utc);
    let id = Uuid::parse_str(id_str).map_err(|_| AppError::bad_request("malformed cursor"))?;
    Ok(PhotoCursor { uploaded_at, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_roundtrips() {
        let cursor = PhotoCursor {
            uploaded_at: Utc::now(),
            id: Uuid::now_v7(),
        };
        let token = encode_cursor("secret", cursor);
        let decoded = decode_cursor("secret", &token).unwrap();
        assert_eq!(decoded.id, cursor.id);
    }

    #[test]
    fn tampered_cursor_is_rejected() {
        let cursor = PhotoCursor { uploaded_at: Utc::now(), id: Uuid::now_v7() };
        let mut token = encode_cursor("secret", cursor);
        token.push('0');
        assert!(decode_cursor("secret", &token).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let cursor = PhotoCursor { uploaded_at: Utc::now(), id: Uuid::now_v7() };
        let token = encode_cursor("secret-a", cursor);
        assert!(decode_cursor("secret-b", &token).is_err());
    }

    #[test]
    fn garbage_token_does_not_panic() {
        assert!(decode_cursor("secret", "not-a-cursor").is_err());
        assert!(decode_cursor("secret", "").is_err());
    }
}
