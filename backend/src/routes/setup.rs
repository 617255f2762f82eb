//! `/api/setup/*` — the one-time bootstrap wizard. Before the first
//! admin user exists, every other authenticated endpoint answers 503
//! `SetupIncomplete` (§6, §7); these two routes are how that state ends.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use photosync_shared::dto::{SetupRegisterRequest, SetupRegisterResponse, SetupStatusResponse};
use photosync_shared::entities::User;
use uuid::Uuid;

use crate::auth::{generate_api_key, hash_password};
use crate::errors::AppError;
use crate::state::AppState;

/// `GET /api/setup/status` — unauthenticated; the only question it
/// answers is whether any user has been created yet.
pub async fn status(State(state): State<AppState>) -> Result<Json<SetupStatusResponse>, AppError> {
    let users = state.db.list_users(0, 1).await.map_err(AppError::Internal)?;
    Ok(Json(SetupStatusResponse { setup_complete: !users.is_empty() }))
}

/// `POST /api/setup/register` — creates the first admin user and its
/// API key. Refuses once any user already exists; the bootstrap runs
/// exactly once per deployment.
pub async fn register(State(state): State<AppState>, Json(req): Json<SetupRegisterRequest>) -> Result<Json<SetupRegisterResponse>, AppError> {
    let existing = state.db.list_users(0, 1).await.map_err(AppError::Internal)?;
    if !existing.is_empty() {
        return Err(AppError::Conflict("setup already complete".into()));
    }

    let (api_key, api_key_hash) = generate_api_key();
    let email = req.email.to_lowercase();
    let user = User {
        id: Uuid::now_v7(),
        email: email.clone(),
        display_name: req.display_name,
        api_key_hash,
        password_hash: Some(hash_password(&req.password)?),
        is_admin: true,
        is_active: true,
        created_at: Utc::now(),
    };
    state.db.create_user(&user).await.map_err(AppError::Internal)?;

    Ok(Json(SetupRegisterResponse { user_id: user.id, email: user.email, api_key }))
}
