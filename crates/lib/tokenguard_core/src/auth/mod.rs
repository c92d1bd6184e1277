//! Credential minting, hashing and refresh-token rotation.
//!
//! [`codec`] signs and verifies token pairs, [`hasher`] derives the stored
//! liveness key of a refresh token, and [`manager`] ties both to a
//! [`crate::store::CredentialStore`].

pub mod codec;
pub mod hasher;
pub mod manager;
pub mod notify;

use thiserror::Error;

use crate::store::StoreError;

/// Per-request token lifecycle errors.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, malformed or expired token.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The presented refresh token does not resolve to a live principal.
    #[error("Unknown refresh credential")]
    UnknownCredential,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Signing or hashing failed. Only reachable through misconfiguration.
    #[error("Crypto error: {0}")]
    Crypto(String),
}
