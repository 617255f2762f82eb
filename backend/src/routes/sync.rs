//! `/api/sync/*` (§6) — thin HTTP wrappers around the Sync Engine
//! (`crate::sync`). All routes authenticate via [`AuthenticatedUser`] (API key or session cookie, §6); device
//! ownership is re-checked here before any device-scoped operation
//! touches the database.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use photosync_shared::dto::{
    ClaimLegacyRequest, ClaimLegacyResponse, PaginationDto, PhotoDto, SyncDeltaRequest, SyncDeltaResponse,
    SyncStatusResponse, SyncSummaryDto,
};
use uuid::Uuid;

use crate::db::ClaimTarget;
use crate::errors::AppError;
use crate::middleware::{AuthenticatedUser, DEVICE_ID_HEADER};
use crate::routes::photos::photo_to_dto;
use crate::state::AppState;
use crate::sync;

fn device_id_header(headers: &HeaderMap) -> Option<Uuid> {
    headers.get(&DEVICE_ID_HEADER).and_then(|v| v.to_str().ok()).and_then(|s| Uuid::parse_str(s).ok())
}

/// `GET /api/sync/status` — optional `X-Device-ID` header (§6).
pub async fn status(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SyncStatusResponse>, AppError> {
    let device_id = device_id_header(&headers);
    let s = sync::status(&state, user.id, device_id).await?;
    Ok(Json(SyncStatusResponse {
        total_photos: s.total_photos,
        device_photos: s.device_photos,
        other_device_photos: s.other_device_photos,
        legacy_photos: s.legacy_photos,
        last_sync_at: s.last_sync_at,
        server_version: s.server_version,
        needs_legacy_claim: s.needs_legacy_claim,
    }))
}

/// `POST /api/sync/photos` — cursor-paginated delta feed (§6).
pub async fn delta(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    Json(req): Json<SyncDeltaRequest>,
) -> Result<Json<SyncDeltaResponse>, AppError> {
    let device = state
        .db
        .get_device_by_id(req.device_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("device not found"))?;
    if device.user_id != user.id {
        return Err(AppError::Forbidden);
    }

    let sync::DeltaPage { photos: page_photos, cursor, has_more, total_count, server_version } =
        sync::delta(&state, user.id, req.device_id, req.cursor.as_deref(), req.limit, req.since_timestamp).await?;

    let returned_count = page_photos.len() as i64;
    let mut photos = Vec::with_capacity(page_photos.len());
    for (photo, origin) in page_photos {
        let origin = origin.map(|o| photosync_shared::dto::OriginDeviceDto {
            id: o.id,
            name: o.name,
            platform: o.platform.to_string(),
            is_current_device: o.is_current_device,
        });
        photos.push(photo_to_dto(&photo, origin));
    }

    Ok(Json(SyncDeltaResponse {
        photos,
        pagination: PaginationDto { cursor, has_more },
        sync: SyncSummaryDto { total_count, returned_count, server_version },
    }))
}

/// `POST /api/sync/claim-legacy` — attaches ownerless photos to a device
/// (§6, §4.6).
pub async fn claim_legacy(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    Json(req): Json<ClaimLegacyRequest>,
) -> Result<Json<ClaimLegacyResponse>, AppError> {
    let target = if req.claim_all { ClaimTarget::All } else { ClaimTarget::Ids(req.photo_ids) };
    let outcome = sync::claim_legacy(&state, user.id, req.device_id, target).await?;
    Ok(Json(ClaimLegacyResponse { claimed: outcome.claimed, already_claimed: outcome.already_claimed, failed: outcome.failed }))
}
