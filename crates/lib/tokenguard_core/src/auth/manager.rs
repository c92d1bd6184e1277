//! Token lifecycle manager: enrollment, issuance and refresh-token rotation.
//!
//! A principal moves `Unenrolled → Active(h) → Active(h') → …`; each rotation
//! replaces the stored refresh hash, which is what makes a refresh token
//! redeemable at most once.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::TokenError;
use super::codec::CredentialCodec;
use super::hasher::CredentialHasher;
use super::notify::{LogNotifier, OriginMismatch, SecurityNotifier};
use crate::config::TokenConfig;
use crate::models::credential::{Claims, CredentialPair};
use crate::store::{CredentialStore, UnitOfWork};

/// Issues and rotates credential pairs against a [`CredentialStore`].
///
/// Holds only immutable configuration and the store handle, so a single
/// instance can be shared across request tasks behind an `Arc`.
pub struct TokenManager<S> {
    codec: CredentialCodec,
    hasher: CredentialHasher,
    store: S,
    notifier: Arc<dyn SecurityNotifier>,
}

impl<S: CredentialStore> TokenManager<S> {
    /// Create a manager that reports origin mismatches through [`LogNotifier`].
    pub fn new(config: &TokenConfig, store: S) -> Self {
        Self {
            codec: CredentialCodec::from_config(config),
            hasher: CredentialHasher::from_config(config),
            store,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Replace the security notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn SecurityNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn codec(&self) -> &CredentialCodec {
        &self.codec
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Enroll a brand-new principal and return its first credential pair.
    pub async fn enroll(
        &self,
        guid: &str,
        email: &str,
        origin: &str,
    ) -> Result<CredentialPair, TokenError> {
        let pair = self.codec.issue(guid, origin)?;
        let hash = self.hasher.hash(&pair.refresh_token)?;

        self.store.insert_principal(guid, email, &hash).await?;

        info!(guid, "principal enrolled");
        Ok(pair)
    }

    /// Issue a fresh pair for an enrolled principal, replacing its refresh hash.
    pub async fn issue(&self, guid: &str, origin: &str) -> Result<CredentialPair, TokenError> {
        self.rotate(guid, origin, None).await
    }

    /// Exchange a refresh token for a new pair, invalidating the presented one.
    ///
    /// An origin mismatch raises a security notification in the background;
    /// the rotation never waits for it.
    pub async fn refresh(
        &self,
        presented: &str,
        origin: &str,
    ) -> Result<CredentialPair, TokenError> {
        let claims = self.codec.verify(presented).inspect_err(|e| {
            debug!(error = %e, "refresh token failed verification");
        })?;

        if claims.origin != origin {
            self.report_origin_mismatch(&claims, origin);
        }

        let presented_hash = self.hasher.hash(presented)?;
        let guid = match self.store.lookup_guid_by_hash(&presented_hash).await? {
            Some(guid) if !guid.is_empty() => guid,
            _ => {
                warn!(guid = %claims.sub, "refresh token is not a live credential");
                return Err(TokenError::UnknownCredential);
            }
        };

        self.rotate(&guid, origin, Some(&presented_hash)).await
    }

    /// Mint a pair and persist its refresh hash in one unit of work.
    ///
    /// `expected` guards the replacement against a concurrent rotation of the
    /// same refresh token.
    async fn rotate(
        &self,
        guid: &str,
        origin: &str,
        expected: Option<&str>,
    ) -> Result<CredentialPair, TokenError> {
        let pair = self.codec.issue(guid, origin)?;
        let new_hash = self.hasher.hash(&pair.refresh_token)?;

        let mut tx = self.store.begin().await?;
        if let Err(e) = self
            .store
            .replace_hash(&mut tx, guid, expected, &new_hash)
            .await
        {
            warn!(guid, error = %e, "refresh hash replacement failed, rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(guid, error = %rollback_err, "rollback failed");
            }
            return Err(e.into());
        }
        tx.commit().await.inspect_err(|e| {
            warn!(guid, error = %e, "refresh hash commit failed");
        })?;

        debug!(guid, rotated = expected.is_some(), "credential pair issued");
        Ok(pair)
    }

    /// Fire and forget: lookup and delivery run on a spawned task and their
    /// failures are only logged.
    fn report_origin_mismatch(&self, claims: &Claims, presented_origin: &str) {
        let store = self.store.clone();
        let notifier = Arc::clone(&self.notifier);
        let guid = claims.sub.clone();
        let issued_origin = claims.origin.clone();
        let presented_origin = presented_origin.to_string();

        tokio::spawn(async move {
            let email = match store.lookup_email(&guid).await {
                Ok(email) => email,
                Err(e) => {
                    warn!(guid = %guid, error = %e, "email lookup for origin alert failed");
                    None
                }
            };

            let alert = OriginMismatch {
                guid,
                email,
                issued_origin,
                presented_origin,
            };
            if let Err(e) = notifier.origin_mismatch(&alert).await {
                warn!(guid = %alert.guid, error = %e, "origin mismatch notification failed");
            }
        });
    }
}
