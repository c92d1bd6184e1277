//! Credential domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A principal record as persisted by the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub guid: String,
    pub email: String,
    /// Hash of the principal's current refresh token.
    pub refresh_hash: String,
}

/// Claims embedded in both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the principal GUID (standard JWT `sub` claim).
    pub sub: String,
    /// Client network address the token was issued to.
    pub origin: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Unique token id.
    pub jti: String,
}

/// A freshly minted access/refresh token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

// Raw tokens stay out of logs.
impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}
