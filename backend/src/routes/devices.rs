//! `POST /api/devices/register` (§6). Registering the same device name
//! twice for the same user updates the FCM token and `lastSeenAt` in
//! place rather than creating a duplicate row (§8).

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use photosync_shared::dto::{DeviceRegisterRequest, DeviceRegisterResponse};
use photosync_shared::entities::{Device, Platform};
use uuid::Uuid;

use crate::errors::AppError;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

pub async fn register(
    AuthenticatedUser(user): AuthenticatedUser,
    State(state): State<AppState>,
    Json(req): Json<DeviceRegisterRequest>,
) -> Result<Json<DeviceRegisterResponse>, AppError> {
    let platform = Platform::parse(&req.platform).ok_or_else(|| AppError::bad_request("unknown platform"))?;
    let now = Utc::now();

    let existing = state.db.get_device_by_name_for_user(user.id, &req.device_name).await.map_err(AppError::Internal)?;

    let device = if let Some(mut device) = existing {
        device.platform = platform;
        device.fcm_token = Some(req.fcm_token.clone());
        device.last_seen_at = now;
        device.is_active = true;
        state.db.update_device(&device).await.map_err(AppError::Internal)?;
        device
    } else {
        let device = Device {
            id: Uuid::now_v7(),
            user_id: user.id,
            device_name: req.device_name.clone(),
            platform,
            fcm_token: Some(req.fcm_token.clone()),
            registered_at: now,
            last_seen_at: now,
            is_active: true,
        };
        state.db.create_device(&device).await.map_err(AppError::Internal)?;
        device
    };

    Ok(Json(DeviceRegisterResponse {
        id: device.id,
        device_name: device.device_name,
        platform: device.platform.as_str().to_string(),
        registered_at: device.registered_at,
    }))
}
