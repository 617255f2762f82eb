//! Notification Adapters (C9): narrow outbound interfaces for push and
//! email delivery. Production wiring (FCM, SMTP/SES) is out of scope per
//! spec non-goals, but the ambient shape — a trait per channel, a logging
//! stub implementation, and a coarse error classification so callers can
//! decide whether to retry — follows the teacher's habit of keeping
//! external integrations behind a narrow trait (see `services/github.rs`
//! in the teacher for the same shape, dropped here since its content was
//! GitHub-API-specific).

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The destination (device token, email address) is permanently bad;
    /// callers should stop retrying and drop the association.
    #[error("invalid destination: {0}")]
    InvalidTarget(String),
    /// Transport hiccup; callers may retry with backoff.
    #[error("transient delivery failure: {0}")]
    Transient(String),
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn notify_auth_request(&self, device_token: &str, request_id: &str) -> Result<(), NotifyError>;
    async fn notify_delete_request(&self, device_token: &str, request_id: &str) -> Result<(), NotifyError>;
}

#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), NotifyError>;
}

/// Logs instead of calling out to FCM. Used until a real push provider is
/// wired in; never classifies a target as invalid since it never actually
/// dials out.
pub struct LoggingPushNotifier;

#[async_trait]
impl PushNotifier for LoggingPushNotifier {
    async fn notify_auth_request(&self, device_token: &str, request_id: &str) -> Result<(), NotifyError> {
        log::info!("[notify] push auth_request={request_id} to device_token={device_token}");
        Ok(())
    }

    async fn notify_delete_request(&self, device_token: &str, request_id: &str) -> Result<(), NotifyError> {
        log::info!("[notify] push delete_request={request_id} to device_token={device_token}");
        Ok(())
    }
}

/// Logs instead of calling out to an SMTP/SES provider.
pub struct LoggingEmailNotifier;

#[async_trait]
impl EmailNotifier for LoggingEmailNotifier {
    async fn send_reset_code(&self, to: &str, code: &str) -> Result<(), NotifyError> {
        log::info!("[notify] password reset code for {to}: {code}");
        Ok(())
    }
}
