//! Auth Broker (C7): the passwordless web-login handshake, and the two
//! password-reset strategies (email code, trusted-device approval). Every
//! state transition here goes through [`crate::db::Db::resolve_auth_request`]
//! or an equivalent compare-and-set so a slow second responder can never
//! clobber a decision that already landed (§4.7).

use chrono::{DateTime, Duration, Utc};
use photosync_shared::entities::{AuthRequest, AuthRequestStatus, AuthRequestType, PasswordResetToken, User, WebSession};
use uuid::Uuid;

use crate::auth::{generate_numeric_code, generate_session_token, hash_password, hash_reset_code, verify_password, verify_reset_code};
use crate::errors::AppError;
use crate::state::AppState;

const MAX_RESET_ATTEMPTS: u32 = 3;
const RESET_CODE_TTL_MINUTES: i64 = 15;
const SESSION_TTL_HOURS: i64 = 24 * 14;

/// Starts a browser login: a `pending` [`AuthRequest`] the user's own phone
/// will later approve or deny (§4.7).
pub async fn initiate_web_login(
    state: &AppState,
    user_id: Uuid,
    ip_address: String,
    user_agent: String,
) -> Result<AuthRequest, AppError> {
    let now = Utc::now();
    let request = AuthRequest {
        id: Uuid::now_v7(),
        user_id,
        status: AuthRequestStatus::Pending,
        created_at: now,
        expires_at: now + Duration::seconds(state.config.auth_timeout_seconds as i64),
        responded_at: None,
        responded_device_id: None,
        request_type: AuthRequestType::WebLogin,
        new_password_hash: None,
        ip_address,
        user_agent,
    };
    state.db.create_auth_request(&request).await.map_err(AppError::Internal)?;
    notify_all_devices(state, user_id, &request.id.to_string()).await?;
    Ok(request)
}

/// Pushes to every active device of `user_id` that has a registered FCM
/// token, concurrently. A device with no token is silently skipped; a
/// per-device delivery failure is logged and never fails the caller — the
/// browser still polls, and any other device may still approve (§4.7
/// "pushes to all active devices of the user").
async fn notify_all_devices(state: &AppState, user_id: Uuid, request_id: &str) -> Result<(), AppError> {
    let devices = state.db.list_active_devices_for_user(user_id).await.map_err(AppError::Internal)?;
    let sends = devices.into_iter().filter_map(|d| d.fcm_token.map(|token| async move {
        if let Err(e) = state.push.notify_auth_request(&token, request_id).await {
            log::warn!("[auth_broker] push delivery failed for request {request_id}: {e}");
        }
    }));
    futures_util::future::join_all(sends).await;
    Ok(())
}

/// A trusted device answers a pending request. Returns `true` only if this
/// call performed the transition (first responder wins, §4.7).
pub async fn respond(state: &AppState, request_id: Uuid, approve: bool, device_id: Uuid) -> Result<bool, AppError> {
    state
        .db
        .resolve_auth_request(request_id, approve, device_id, Utc::now())
        .await
        .map_err(AppError::Internal)
}

pub enum PollOutcome {
    Pending,
    Denied,
    Expired,
    /// `Approved` carries a session token exactly once — the first poll to
    /// observe the approval. Later polls see `Approved` with no token.
    Approved { session_token: Option<String> },
}

/// Polls a web-login request's status. On the first poll after approval, a
/// session is created and its token handed back; never reissued (§4.7).
pub async fn poll_web_auth_status(state: &AppState, request_id: Uuid, ip_address: String, user_agent: String) -> Result<(AuthRequest, PollOutcome), AppError> {
    let request = state
        .db
        .get_auth_request(request_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("auth request not found"))?;

    let now = Utc::now();
    match request.effective_status(now) {
        AuthRequestStatus::Pending => Ok((request, PollOutcome::Pending)),
        AuthRequestStatus::Denied => Ok((request, PollOutcome::Denied)),
        AuthRequestStatus::Expired => Ok((request, PollOutcome::Expired)),
        AuthRequestStatus::Approved => {
            let already_issued = state.db.auth_request_token_issued(request_id).await.map_err(AppError::Internal)?;
            if already_issued {
                return Ok((request.clone(), PollOutcome::Approved { session_token: None }));
            }
            let session = create_session(state, request.user_id, Some(request_id), ip_address, user_agent).await?;
            state.db.mark_auth_request_token_issued(request_id).await.map_err(AppError::Internal)?;
            Ok((request.clone(), PollOutcome::Approved { session_token: Some(session.id) }))
        }
    }
}

async fn create_session(
    state: &AppState,
    user_id: Uuid,
    auth_request_id: Option<Uuid>,
    ip_address: String,
    user_agent: String,
) -> Result<WebSession, AppError> {
    let now = Utc::now();
    let session = WebSession {
        id: generate_session_token(),
        user_id,
        auth_request_id,
        created_at: now,
        expires_at: now + Duration::hours(SESSION_TTL_HOURS),
        last_activity_at: now,
        ip_address,
        user_agent,
        is_active: true,
    };
    state.db.create_session(&session).await.map_err(AppError::Internal)?;
    Ok(session)
}

/// Looks up a session by cookie value, checks liveness, and touches its
/// activity timestamp. Returns `None` for missing/expired/deactivated
/// sessions without distinguishing which — callers just see "not
/// authenticated" (§7).
pub async fn authenticate_session(state: &AppState, session_id: &str) -> Result<Option<User>, AppError> {
    let Some(session) = state.db.get_session(session_id).await.map_err(AppError::Internal)? else {
        return Ok(None);
    };
    let now = Utc::now();
    if !session.is_active || now >= session.expires_at {
        return Ok(None);
    }
    state.db.touch_session(session_id, now).await.map_err(AppError::Internal)?;
    state.db.get_user_by_id(session.user_id).await.map_err(AppError::Internal)
}

// --- Email-code password reset ------------------------------------------------

pub async fn initiate_email_reset(state: &AppState, email: &str) -> Result<(), AppError> {
    // Always succeeds from the caller's point of view, whether or not the
    // address is registered, so the endpoint can't be used to enumerate
    // accounts (§7).
    let Some(user) = state.db.get_user_by_email(email).await.map_err(AppError::Internal)? else {
        return Ok(());
    };

    state.db.revoke_reset_tokens_for_user(user.id).await.map_err(AppError::Internal)?;

    let code = generate_numeric_code();
    let now = Utc::now();
    let token = PasswordResetToken {
        id: Uuid::now_v7(),
        user_id: user.id,
        code_hash: hash_reset_code(&code)?,
        email: user.email.clone(),
        expires_at: now + Duration::minutes(RESET_CODE_TTL_MINUTES),
        used: false,
        attempts: 0,
        last_attempt_at: None,
        ip_address: String::new(),
    };
    state.db.create_password_reset_token(&token).await.map_err(AppError::Internal)?;
    let _ = state.email.send_reset_code(&user.email, &code).await;
    Ok(())
}

pub async fn verify_email_reset(state: &AppState, email: &str, code: &str, new_password: &str) -> Result<(), AppError> {
    let user = state
        .db
        .get_user_by_email(email)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::bad_request("invalid code"))?;

    let token = state
        .db
        .get_active_reset_token_for_user(user.id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::bad_request("invalid code"))?;

    let now = Utc::now();
    if now >= token.expires_at {
        return Err(AppError::Gone("reset code expired".into()));
    }
    if token.attempts >= MAX_RESET_ATTEMPTS {
        // The third wrong attempt already consumed the token (below); from
        // here on the code is dead regardless of correctness (§8 scenario).
        return Err(AppError::Gone("too many attempts".into()));
    }

    state.db.record_reset_attempt(token.id, now).await.map_err(AppError::Internal)?;
    if !verify_reset_code(code, &token.code_hash)? {
        return Err(AppError::Unauthorized);
    }

    let mut updated = user.clone();
    updated.password_hash = Some(hash_password(new_password)?);
    state.db.update_user(&updated).await.map_err(AppError::Internal)?;
    state.db.mark_reset_token_used(token.id).await.map_err(AppError::Internal)?;
    Ok(())
}

// --- Device-approved ("phone") password reset --------------------------------

/// Starts a reset that a user's own trusted device must approve, rather
/// than an emailed code — for accounts without a reachable email flow
/// (§4.7, §9).
pub async fn initiate_device_reset(
    state: &AppState,
    email: &str,
    new_password: &str,
    ip_address: String,
    user_agent: String,
) -> Result<AuthRequest, AppError> {
    let user = state
        .db
        .get_user_by_email(email)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::bad_request("no such account"))?;

    let now = Utc::now();
    let request = AuthRequest {
        id: Uuid::now_v7(),
        user_id: user.id,
        status: AuthRequestStatus::Pending,
        created_at: now,
        expires_at: now + Duration::seconds(state.config.auth_timeout_seconds as i64),
        responded_at: None,
        responded_device_id: None,
        request_type: AuthRequestType::PasswordReset,
        new_password_hash: Some(hash_password(new_password)?),
        ip_address,
        user_agent,
    };
    state.db.create_auth_request(&request).await.map_err(AppError::Internal)?;
    notify_all_devices(state, user.id, &request.id.to_string()).await?;
    Ok(request)
}

pub async fn device_reset_status(state: &AppState, request_id: Uuid) -> Result<(AuthRequest, AuthRequestStatus), AppError> {
    let request = state
        .db
        .get_auth_request(request_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("request not found"))?;
    let status = request.effective_status(Utc::now());
    Ok((request, status))
}

/// Finalizes an approved device reset by applying the pre-hashed password
/// that was staged at initiation time. A no-op (not an error) if the
/// request isn't in the approved state yet, or has already been applied.
pub async fn complete_device_reset(state: &AppState, request_id: Uuid) -> Result<AuthRequestStatus, AppError> {
    let request = state
        .db
        .get_auth_request(request_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("request not found"))?;

    let status = request.effective_status(Utc::now());
    if status != AuthRequestStatus::Approved {
        return Ok(status);
    }
    if state.db.auth_request_token_issued(request_id).await.map_err(AppError::Internal)? {
        // Already applied by an earlier poll.
        return Ok(status);
    }

    let new_hash = request
        .new_password_hash
        .clone()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("approved reset request missing staged password")))?;
    let mut user = state
        .db
        .get_user_by_id(request.user_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::not_found("user not found"))?;
    user.password_hash = Some(new_hash);
    state.db.update_user(&user).await.map_err(AppError::Internal)?;
    state.db.mark_auth_request_token_issued(request_id).await.map_err(AppError::Internal)?;
    // §4.7: completing a device-approved reset also revokes any outstanding
    // email-code reset tokens for the same user.
    state.db.revoke_reset_tokens_for_user(user.id).await.map_err(AppError::Internal)?;
    Ok(status)
}

pub use verify_password as verify_user_password;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_code_hash_roundtrips() {
        let code = generate_numeric_code();
        let hash = hash_reset_code(&code).unwrap();
        assert!(verify_reset_code(&code, &hash).unwrap());
    }
}
