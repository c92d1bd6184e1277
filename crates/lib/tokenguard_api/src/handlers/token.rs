//! Credential issuance and rotation handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use tokenguard_core::store::CredentialStore;
use tracing::info;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extractors::ClientOrigin;
use crate::services::cookies::{REFRESH_COOKIE, with_credentials};

/// `GET /token/{guid}` — issue a fresh pair for an enrolled principal.
pub async fn issue_handler<S: CredentialStore>(
    State(state): State<AppState<S>>,
    Path(guid): Path<String>,
    ClientOrigin(origin): ClientOrigin,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    let pair = state
        .manager
        .issue(&guid, &origin)
        .await
        .map_err(AppError::IssueRejected)?;

    info!(guid = %guid, origin = %origin, "credentials issued");
    Ok((with_credentials(jar, &pair, &state.config), StatusCode::OK))
}

/// `GET /token/refresh` — exchange the refresh cookie for a new pair.
pub async fn refresh_handler<S: CredentialStore>(
    State(state): State<AppState<S>>,
    ClientOrigin(origin): ClientOrigin,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::MissingRefreshCookie)?;

    let pair = state
        .manager
        .refresh(&presented, &origin)
        .await
        .map_err(AppError::RefreshRejected)?;

    info!(origin = %origin, "credentials rotated");
    Ok((with_credentials(jar, &pair, &state.config), StatusCode::OK))
}
