//! Application error types.
//!
//! Every rejection is reported to the client as a bare status code; the
//! underlying cause only goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokenguard_core::TokenError;
use tracing::warn;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Issuance rejected: {0}")]
    IssueRejected(#[source] TokenError),

    #[error("Refresh rejected: {0}")]
    RefreshRejected(#[source] TokenError),

    #[error("Refresh token cookie not found")]
    MissingRefreshCookie,

    #[error("Client origin unavailable")]
    OriginUnavailable,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::IssueRejected(_) | AppError::OriginUnavailable => StatusCode::BAD_REQUEST,
            AppError::RefreshRejected(_) | AppError::MissingRefreshCookie => {
                StatusCode::UNAUTHORIZED
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self, "request rejected");
        status.into_response()
    }
}
