//! # tokenguard_api
//!
//! HTTP boundary: extracts the caller's origin and refresh cookie, calls the
//! token lifecycle manager and hands the resulting pair back as cookies.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use sqlx::PgPool;
use tokenguard_core::TokenManager;
use tokenguard_core::store::CredentialStore;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::token;

/// Route: issue a pair for a GUID.
pub const GET_TOKEN_GUID: &str = "/token/{guid}";
/// Route: rotate the refresh cookie.
pub const GET_TOKEN_REFRESH: &str = "/token/refresh";

/// Shared application state passed to all handlers.
pub struct AppState<S> {
    /// Token lifecycle manager.
    pub manager: Arc<TokenManager<S>>,
    /// API configuration.
    pub config: ApiConfig,
}

impl<S> AppState<S> {
    pub fn new(manager: TokenManager<S>, config: ApiConfig) -> Self {
        Self {
            manager: Arc::new(manager),
            config,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            config: self.config.clone(),
        }
    }
}

/// Create or upgrade the `principals` table before the router serves traffic.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tokenguard_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router<S: CredentialStore>(state: AppState<S>) -> Router {
    Router::new()
        .route(GET_TOKEN_REFRESH, get(token::refresh_handler::<S>))
        .route(GET_TOKEN_GUID, get(token::issue_handler::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
