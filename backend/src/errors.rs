use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use photosync_shared::dto::ErrorResponse;
use thiserror::Error;

/// The error kinds surfaced across the core (spec §7). `Duplicate` is
/// deliberately absent here: a dedup hit is a success path (§4.5), never
/// an `Err`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Gone(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing error")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("object store error: {0}")]
    Store(#[from] object_store::Error),
    #[error("setup incomplete")]
    SetupIncomplete,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Gone(_) => StatusCode::GONE,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::SetupIncomplete => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_)
            | AppError::Database(_)
            | AppError::Bcrypt(_)
            | AppError::Io(_)
            | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal details are logged, never echoed to the client (§7).
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("internal error: {:#}", self);
        } else {
            log::warn!("error response: {} ({})", self, status);
        }
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "internal server error".to_string(),
            _ => self.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
