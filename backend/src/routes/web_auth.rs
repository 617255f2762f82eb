//! `/api/web/auth/*` (§6, §4.7) — the passwordless browser login
//! handshake. `initiate`/`status` are reachable without a session (a
//! browser has none yet); `respond` is the trusted-device side, called
//! with the device's own API key.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use photosync_shared::dto::{WebAuthInitiateRequest, WebAuthInitiateResponse, WebAuthRespondRequest, WebAuthStatusResponse};
use uuid::Uuid;

use crate::auth_broker::{self, PollOutcome};
use crate::errors::AppError;
use crate::middleware::{ApiKeyUser, SESSION_COOKIE};
use crate::state::AppState;

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn client_user_agent(headers: &HeaderMap) -> String {
    headers.get(axum::http::header::USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or("unknown").to_string()
}

/// `POST /api/web/auth/initiate` — a browser names the account it wants
/// to log into; the owner's phone is notified (§4.7).
pub async fn initiate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<WebAuthInitiateRequest>,
) -> Result<Json<WebAuthInitiateResponse>, AppError> {
    let user = state
        .db
        .get_user_by_email(&req.email)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("no such account"))?;

    let request = auth_broker::initiate_web_login(&state, user.id, client_ip(&headers), client_user_agent(&headers)).await?;
    Ok(Json(WebAuthInitiateResponse { request_id: request.id, expires_at: request.expires_at }))
}

/// `GET /api/web/auth/status/{id}` — polled by the browser. Mints and
/// sets the session cookie exactly once, on the first poll to observe
/// approval (§4.7).
pub async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<WebAuthStatusResponse>), AppError> {
    let (request, outcome) = auth_broker::poll_web_auth_status(&state, id, client_ip(&headers), client_user_agent(&headers)).await?;

    let (status_str, session_token) = match outcome {
        PollOutcome::Pending => ("pending", None),
        PollOutcome::Denied => ("denied", None),
        PollOutcome::Expired => ("expired", None),
        PollOutcome::Approved { session_token } => ("approved", session_token),
    };

    let jar = if let Some(token) = &session_token {
        let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        jar.add(cookie)
    } else {
        jar
    };

    Ok((jar, Json(WebAuthStatusResponse { status: status_str.to_string(), expires_at: request.expires_at, session_token })))
}

/// `POST /api/web/auth/respond` — a trusted device approves or denies a
/// pending request (web login or device-approved password reset, both
/// of which share this same FSM) (§4.7).
pub async fn respond(
    ApiKeyUser(user): ApiKeyUser,
    State(state): State<AppState>,
    Json(req): Json<WebAuthRespondRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let device_id = req.device_id.ok_or_else(|| AppError::bad_request("deviceId is required"))?;
    let device = state
        .db
        .get_device_by_id(device_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("device not found"))?;
    if device.user_id != user.id {
        return Err(AppError::Forbidden);
    }

    let request = state
        .db
        .get_auth_request(req.request_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("request not found"))?;
    if request.user_id != user.id {
        return Err(AppError::Forbidden);
    }

    let did_resolve = auth_broker::respond(&state, req.request_id, req.approved, device_id).await?;
    if !did_resolve {
        let now = Utc::now();
        return match request.effective_status(now) {
            photosync_shared::entities::AuthRequestStatus::Expired => Err(AppError::Gone("auth request expired".into())),
            _ => Err(AppError::Conflict("request already resolved".into())),
        };
    }

    Ok(Json(serde_json::json!({ "status": "ok" })))
}
