//! Cookie service — build the httpOnly credential cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use time::Duration;
use tokenguard_core::CredentialPair;

use crate::config::ApiConfig;

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Build a credential cookie that lives until `expires_at`.
fn credential_cookie(
    name: &'static str,
    token: &str,
    expires_at: DateTime<Utc>,
    config: &ApiConfig,
) -> Cookie<'static> {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    let mut builder = Cookie::build((name, token.to_string()))
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(max_age));
    if let Some(domain) = &config.cookie_domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

/// Build the access token cookie.
pub fn access_cookie(pair: &CredentialPair, config: &ApiConfig) -> Cookie<'static> {
    credential_cookie(ACCESS_COOKIE, &pair.access_token, pair.access_expires_at, config)
}

/// Build the refresh token cookie.
pub fn refresh_cookie(pair: &CredentialPair, config: &ApiConfig) -> Cookie<'static> {
    credential_cookie(
        REFRESH_COOKIE,
        &pair.refresh_token,
        pair.refresh_expires_at,
        config,
    )
}

/// Add both credential cookies to the jar.
pub fn with_credentials(jar: CookieJar, pair: &CredentialPair, config: &ApiConfig) -> CookieJar {
    jar.add(access_cookie(pair, config))
        .add(refresh_cookie(pair, config))
}
