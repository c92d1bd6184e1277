//! Security notifications raised during rotation.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

/// Notification delivery failure. Logged by the caller, never propagated.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// A refresh token was presented from a different origin than it was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginMismatch {
    pub guid: String,
    /// `None` when the principal's email could not be resolved.
    pub email: Option<String>,
    pub issued_origin: String,
    pub presented_origin: String,
}

/// Side channel for possible session hijacking.
#[async_trait]
pub trait SecurityNotifier: Send + Sync {
    async fn origin_mismatch(&self, alert: &OriginMismatch) -> Result<(), NotifyError>;
}

/// Notifier that records alerts as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl SecurityNotifier for LogNotifier {
    async fn origin_mismatch(&self, alert: &OriginMismatch) -> Result<(), NotifyError> {
        warn!(
            guid = %alert.guid,
            email = alert.email.as_deref().unwrap_or("<unknown>"),
            issued_origin = %alert.issued_origin,
            presented_origin = %alert.presented_origin,
            "refresh token presented from a different origin"
        );
        Ok(())
    }
}
