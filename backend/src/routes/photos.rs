//! `/api/photos/*` (§6): upload (C5), hash dedup check, listing, metadata
//! lookup, and deletion. All routes authenticate via [`AuthenticatedUser`] (API key or session cookie, §6).

use axum::body::Bytes as BodyBytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use photosync_shared::dto::{CheckHashesRequest, CheckHashesResponse, OriginDeviceDto, PhotoDto, UploadResponse};
use photosync_shared::entities::Photo;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingestion;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

pub fn photo_to_dto(photo: &Photo, origin: Option<OriginDeviceDto>) -> PhotoDto {
    let url = |path: &Option<String>, size: &str| {
        path.as_ref().map(|_| format!("/api/photos/{}/thumbnail/{size}", photo.id))
    };
    PhotoDto {
        id: photo.id,
        original_filename: photo.original_filename.clone(),
        stored_path: photo.stored_path.clone(),
        file_hash: photo.file_hash.clone(),
        file_size: photo.file_size,
        date_taken: photo.date_taken,
        uploaded_at: photo.uploaded_at,
        width: photo.width,
        height: photo.height,
        thumbnail_small_url: url(&photo.thumbnail_small_path, "small"),
        thumbnail_medium_url: url(&photo.thumbnail_medium_path, "medium"),
        thumbnail_large_url: url(&photo.thumbnail_large_path, "large"),
        origin_device: origin,
    }
}

async fn resolve_origin(state: &AppState, photo: &Photo) -> Result<Option<OriginDeviceDto>, AppError> {
    let Some(device_id) = photo.origin_device_id else { return Ok(None) };
    let device = state.db.get_device_by_id(device_id).await.map_err(AppError::Internal)?;
    Ok(device.map(|d| OriginDeviceDto {
        id: d.id,
        name: d.device_name,
        platform: d.platform.as_str().to_string(),
        is_current_device: false,
    }))
}

/// `POST /api/photos/upload` — multipart: `file`, `originalFilename?`,
/// `dateTaken?` (RFC 3339), `deviceId?` (§6).
pub async fn upload(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    if let Some(len) = headers.get(header::CONTENT_LENGTH).and_then(|v| v.to_str().ok()).and_then(|s| s.parse::<u64>().ok()) {
        // Cheap rejection before buffering a body we already know is too
        // large; the definitive check still happens on the buffered bytes
        // in `ingestion::ingest_photo` (§4.5 step 1).
        if len > state.config.max_file_size_bytes() + 8192 {
            return Err(AppError::bad_request("file exceeds the configured size limit"));
        }
    }

    let mut file_bytes: Option<BodyBytes> = None;
    let mut original_filename: Option<String> = None;
    let mut date_taken: Option<DateTime<Utc>> = None;
    let mut device_id: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::bad_request(e.to_string()))? {
        match field.name().unwrap_or("") {
            "file" => {
                if original_filename.is_none() {
                    original_filename = field.file_name().map(|s| s.to_string());
                }
                file_bytes = Some(field.bytes().await.map_err(|e| AppError::bad_request(e.to_string()))?);
            }
            "originalFilename" => {
                let text = field.text().await.map_err(|e| AppError::bad_request(e.to_string()))?;
                if !text.is_empty() {
                    original_filename = Some(text);
                }
            }
            "dateTaken" => {
                let text = field.text().await.map_err(|e| AppError::bad_request(e.to_string()))?;
                date_taken = DateTime::parse_from_rfc3339(&text).ok().map(|d| d.with_timezone(&Utc));
            }
            "deviceId" => {
                let text = field.text().await.map_err(|e| AppError::bad_request(e.to_string()))?;
                device_id = Uuid::parse_str(&text).ok();
            }
            _ => {}
        }
    }

    let data = file_bytes.ok_or_else(|| AppError::bad_request("missing `file` field"))?;
    let filename = original_filename.ok_or_else(|| AppError::bad_request("missing file name"))?;

    if let Some(device_id) = device_id {
        let device = state.db.get_device_by_id(device_id).await.map_err(AppError::Internal)?;
        if device.map(|d| d.user_id) != Some(user.id) {
            return Err(AppError::bad_request("deviceId does not belong to this user"));
        }
    }

    let outcome = ingestion::ingest_photo(&state, user.id, device_id, &filename, date_taken, data).await?;

    Ok(Json(UploadResponse {
        id: outcome.photo.id,
        stored_path: outcome.photo.stored_path,
        uploaded_at: outcome.photo.uploaded_at,
        is_duplicate: outcome.is_duplicate,
    }))
}

/// `POST /api/photos/check` — set-membership check by hash (§6, §8).
pub async fn check_hashes(
    AuthenticatedUser(_user): AuthenticatedUser,
    State(state): State<AppState>,
    Json(req): Json<CheckHashesRequest>,
) -> Result<Json<CheckHashesResponse>, AppError> {
    if req.hashes.len() > 1000 {
        return Err(AppError::bad_request("at most 1000 hashes per request"));
    }
    let normalized: Vec<String> = req.hashes.iter().map(|h| h.to_ascii_lowercase()).collect();
    let existing = state.db.get_photos_by_hashes(&normalized).await.map_err(AppError::Internal)?;
    let existing_set: std::collections::HashSet<&String> = existing.iter().collect();
    let missing = normalized.iter().filter(|h| !existing_set.contains(h)).cloned().collect();
    Ok(Json(CheckHashesResponse { existing, missing }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_take")]
    take: i64,
}

fn default_take() -> i64 {
    50
}

/// `GET /api/photos?skip=&take=` (§6).
pub async fn list(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<PhotoDto>>, AppError> {
    let take = q.take.clamp(1, 500);
    let skip = q.skip.max(0);
    let photos = state.db.list_photos(user.id, skip, take).await.map_err(AppError::Internal)?;
    let mut out = Vec::with_capacity(photos.len());
    for photo in &photos {
        let origin = resolve_origin(&state, photo).await?;
        out.push(photo_to_dto(photo, origin));
    }
    Ok(Json(out))
}

/// `GET /api/photos/{id}` (§6).
pub async fn get_one(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhotoDto>, AppError> {
    let photo = state.db.get_photo_by_id(id).await.map_err(AppError::Internal)?.ok_or_else(|| AppError::not_found("photo not found"))?;
    if photo.user_id != Some(user.id) {
        return Err(AppError::not_found("photo not found"));
    }
    let origin = resolve_origin(&state, &photo).await?;
    Ok(Json(photo_to_dto(&photo, origin)))
}

/// `DELETE /api/photos/{id}` — removes the row, original file, and
/// thumbnails (§6).
pub async fn delete(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let photo = state.db.get_photo_by_id(id).await.map_err(AppError::Internal)?.ok_or_else(|| AppError::not_found("photo not found"))?;
    if photo.user_id != Some(user.id) {
        return Err(AppError::not_found("photo not found"));
    }

    state.db.delete_photo(id).await.map_err(AppError::Internal)?;
    state.storage.delete(&photo.stored_path).await?;
    if let Some(p) = &photo.thumbnail_small_path {
        state.storage.delete(p).await?;
    }
    if let Some(p) = &photo.thumbnail_medium_path {
        state.storage.delete(p).await?;
    }
    if let Some(p) = &photo.thumbnail_large_path {
        state.storage.delete(p).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/photos/{id}/thumbnail/{size}` — serves the bytes the
/// `thumbnail*Url` fields on [`PhotoDto`] point at. Not itself a §6 table
/// entry, but the table's `thumbnail*Url` fields are dead links without it.
pub async fn thumbnail(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    Path((id, size)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let photo = state.db.get_photo_by_id(id).await.map_err(AppError::Internal)?.ok_or_else(|| AppError::not_found("photo not found"))?;
    if photo.user_id != Some(user.id) {
        return Err(AppError::not_found("photo not found"));
    }
    let path = match size.as_str() {
        "small" => photo.thumbnail_small_path,
        "medium" => photo.thumbnail_medium_path,
        "large" => photo.thumbnail_large_path,
        _ => return Err(AppError::bad_request("unknown thumbnail size")),
    }
    .ok_or_else(|| AppError::not_found("thumbnail not generated yet"))?;

    let bytes = state.storage.get(&path).await?;
    Ok(([(header::CONTENT_TYPE, "image/webp")], bytes))
}
