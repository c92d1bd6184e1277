//! API server configuration.

/// Configuration for the HTTP boundary.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// `Domain` attribute of the credential cookies. Host-only when unset.
    pub cookie_domain: Option<String>,
    /// Mark credential cookies `Secure`.
    pub secure_cookies: bool,
    /// Take the caller origin from `X-Forwarded-For` when present.
    /// Only enable behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            cookie_domain: None,
            secure_cookies: false,
            trust_forwarded_for: false,
        }
    }
}
