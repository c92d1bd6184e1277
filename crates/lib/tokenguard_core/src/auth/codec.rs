//! JWT credential pairs (HS512).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::TokenError;
use crate::config::TokenConfig;
use crate::models::credential::{Claims, CredentialPair};
use crate::uuid::token_id;

/// Signs and verifies access/refresh token pairs with a shared secret.
#[derive(Clone)]
pub struct CredentialCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl CredentialCodec {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(
            config.signing_secret.as_bytes(),
            config.access_ttl,
            config.refresh_ttl,
        )
    }

    /// Mint an access/refresh pair bound to `guid` and `origin`.
    pub fn issue(&self, guid: &str, origin: &str) -> Result<CredentialPair, TokenError> {
        let now = Utc::now();
        let access_expires_at = now + self.access_ttl;
        let refresh_expires_at = now + self.refresh_ttl;

        let access_token = self.sign(&Claims {
            sub: guid.to_string(),
            origin: origin.to_string(),
            exp: access_expires_at.timestamp(),
            iat: now.timestamp(),
            jti: token_id(),
        })?;
        let refresh_token = self.sign(&Claims {
            sub: guid.to_string(),
            origin: origin.to_string(),
            exp: refresh_expires_at.timestamp(),
            iat: now.timestamp(),
            jti: token_id(),
        })?;

        Ok(CredentialPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Verify signature, structure and expiry, returning the embedded claims.
    ///
    /// A token is expired from its `exp` second onwards.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = true;
        validation.leeway = 0;
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::InvalidToken(e.to_string()))?;

        // jsonwebtoken only rejects `exp < now`.
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::InvalidToken("ExpiredSignature".into()));
        }
        Ok(claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS512), claims, &self.encoding_key)
            .map_err(|e| TokenError::Crypto(format!("jwt encode: {e}")))
    }
}
