//! Token lifecycle configuration.
//!
//! Built once at startup and handed to [`crate::TokenManager::new`].

use chrono::Duration;
use thiserror::Error;

/// Default bcrypt cost for refresh-token hashes.
pub const DEFAULT_HASH_COST: u32 = 10;

/// Startup configuration errors. Fatal; never raised per request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Signing secret is missing or empty")]
    MissingSecret,

    #[error("Invalid TTL: {0:?}")]
    InvalidTtl(String),

    #[error("Invalid hash cost {0}: must be between 4 and 31")]
    InvalidHashCost(u32),
}

/// Signing secret, token lifetimes and hash cost.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC signing secret shared by access and refresh tokens.
    pub signing_secret: String,
    /// Access token lifetime.
    pub access_ttl: Duration,
    /// Refresh token lifetime.
    pub refresh_ttl: Duration,
    /// bcrypt cost used when hashing refresh tokens.
    pub hash_cost: u32,
}

impl TokenConfig {
    /// Build a config from a secret and two duration strings (e.g. `"15m"`, `"168h"`).
    pub fn new(
        signing_secret: impl Into<String>,
        access_ttl: &str,
        refresh_ttl: &str,
    ) -> Result<Self, ConfigError> {
        let signing_secret = signing_secret.into();
        if signing_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self {
            signing_secret,
            access_ttl: parse_ttl(access_ttl)?,
            refresh_ttl: parse_ttl(refresh_ttl)?,
            hash_cost: DEFAULT_HASH_COST,
        })
    }

    /// Override the bcrypt cost.
    pub fn with_hash_cost(mut self, cost: u32) -> Result<Self, ConfigError> {
        if !(4..=31).contains(&cost) {
            return Err(ConfigError::InvalidHashCost(cost));
        }
        self.hash_cost = cost;
        Ok(self)
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}

/// Parse a Go-style duration string such as `15m`, `168h`, `1h30m` or `1.5s`.
///
/// Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. The result must be positive.
pub fn parse_ttl(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidTtl(input.to_string());

    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total_nanos: f64 = 0.0;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return Err(invalid());
        }
        let (number, tail) = rest.split_at(num_len);

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let nanos_per_unit: f64 = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            _ => return Err(invalid()),
        };
        let value: f64 = number.parse().map_err(|_| invalid())?;
        total_nanos += value * nanos_per_unit;
        rest = tail;
    }

    if !total_nanos.is_finite() || total_nanos < 1.0 || total_nanos > i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::nanoseconds(total_nanos.round() as i64))
}
