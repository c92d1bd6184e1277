//! # tokenguard_core
//!
//! Credential issuance, refresh-token rotation and the persistence contract
//! behind them.

pub mod auth;
pub mod config;
pub mod migrate;
pub mod models;
pub mod store;
pub mod uuid;

pub use auth::TokenError;
pub use auth::manager::TokenManager;
pub use config::{ConfigError, TokenConfig};
pub use models::credential::{Claims, CredentialPair, Principal};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
