//! Refresh-token hashing via bcrypt.
//!
//! The stored hash doubles as the lookup key for "is this refresh token still
//! live", so it has to be deterministic: the bcrypt salt is derived from the
//! signing secret instead of drawn at random. Tokens are SHA-256 pre-hashed
//! because bcrypt only reads the first 72 bytes and every JWT of a deployment
//! shares the same header prefix.

use bcrypt::Version;
use sha2::{Digest, Sha256};

use super::TokenError;
use crate::config::TokenConfig;

/// Domain separator for the salt derivation.
const SALT_CONTEXT: &[u8] = b"tokenguard/refresh-hash/v1";

/// Deterministic, keyed, cost-bounded hash of refresh tokens.
#[derive(Clone)]
pub struct CredentialHasher {
    salt: [u8; 16],
    cost: u32,
}

impl CredentialHasher {
    pub fn new(secret: &[u8], cost: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(SALT_CONTEXT);
        hasher.update(secret);
        let digest = hasher.finalize();

        let mut salt = [0u8; 16];
        salt.copy_from_slice(&digest[..16]);
        Self { salt, cost }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.signing_secret.as_bytes(), config.hash_cost)
    }

    /// Hash a refresh token for storage and lookup.
    pub fn hash(&self, token: &str) -> Result<String, TokenError> {
        let prehash = format!("{:x}", Sha256::digest(token.as_bytes()));
        bcrypt::hash_with_salt(prehash, self.cost, self.salt)
            .map(|parts| parts.format_for_version(Version::TwoB))
            .map_err(|e| TokenError::Crypto(format!("bcrypt hash: {e}")))
    }
}
