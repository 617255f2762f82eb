//! `/api/mobile/auth/reset/*` (§6, §4.7) — the two password-reset
//! strategies: an emailed six-digit code, and device-approval for
//! accounts without a reachable email flow.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use photosync_shared::dto::{
    EmailResetInitiateRequest, EmailResetVerifyRequest, PhoneResetInitiateRequest, PhoneResetInitiateResponse,
    PhoneResetStatusResponse,
};
use uuid::Uuid;

use crate::auth_broker;
use crate::errors::AppError;
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

/// `POST /api/mobile/auth/reset/email/initiate` — always returns 200
/// regardless of whether the address is registered (§7, enumeration
/// resistance).
pub async fn email_initiate(State(state): State<AppState>, Json(req): Json<EmailResetInitiateRequest>) -> Result<Json<serde_json::Value>, AppError> {
    auth_broker::initiate_email_reset(&state, &req.email).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// `POST /api/mobile/auth/reset/email/verify` — three wrong codes
/// return `Unauthorized`; the fourth attempt returns `Gone` regardless
/// of correctness (§8 scenario).
pub async fn email_verify(State(state): State<AppState>, Json(req): Json<EmailResetVerifyRequest>) -> Result<Json<serde_json::Value>, AppError> {
    auth_broker::verify_email_reset(&state, &req.email, &req.code, &req.new_password).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

/// `POST /api/mobile/auth/reset/phone/initiate` — stages the new
/// password hash and asks a trusted device to approve the swap (§4.7).
pub async fn phone_initiate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PhoneResetInitiateRequest>,
) -> Result<Json<PhoneResetInitiateResponse>, AppError> {
    let request = auth_broker::initiate_device_reset(&state, &req.email, &req.new_password, client_ip(&headers), client_user_agent(&headers)).await?;
    Ok(Json(PhoneResetInitiateResponse { request_id: request.id, expires_at: request.expires_at }))
}

/// `GET /api/mobile/auth/reset/phone/status/{id}` (§4.7).
pub async fn phone_status(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<PhoneResetStatusResponse>, AppError> {
    let (request, status) = auth_broker::device_reset_status(&state, id).await?;
    Ok(Json(PhoneResetStatusResponse { status: status.as_str().to_string(), expires_at: request.expires_at }))
}

/// `POST /api/mobile/auth/reset/phone/complete/{id}` — finalizes an
/// approved device reset by applying the staged password hash (§4.7).
pub async fn phone_complete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, AppError> {
    let status = auth_broker::complete_device_reset(&state, id).await?;
    Ok(Json(serde_json::json!({ "status": status.as_str() })))
}
