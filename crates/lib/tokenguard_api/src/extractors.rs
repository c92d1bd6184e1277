//! Request extractors.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use tokenguard_core::store::CredentialStore;

use crate::AppState;
use crate::error::AppError;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The caller's network address, as bound into token claims.
///
/// Taken from the TCP peer address (port stripped), or from the first
/// `X-Forwarded-For` entry when [`crate::config::ApiConfig::trust_forwarded_for`] is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin(pub String);

impl<S: CredentialStore> FromRequestParts<AppState<S>> for ClientOrigin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        if state.config.trust_forwarded_for
            && let Some(ip) = forwarded_for(&parts.headers)
        {
            return Ok(ClientOrigin(ip.to_string()));
        }

        let ConnectInfo(addr) = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::OriginUnavailable)?;
        Ok(ClientOrigin(addr.ip().to_string()))
    }
}

/// First syntactically valid IP in `X-Forwarded-For`.
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(X_FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}
