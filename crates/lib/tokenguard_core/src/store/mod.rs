//! Credential store contract.
//!
//! The lifecycle manager talks to durable storage only through
//! [`CredentialStore`]. Hash replacement always runs inside a caller-owned
//! [`UnitOfWork`] so the stored hash and the credential handed back to the
//! client never diverge.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Principal not enrolled: {0}")]
    NotEnrolled(String),

    #[error("Principal already enrolled: {0}")]
    Duplicate(String),

    /// A guarded replacement found a different hash than expected.
    #[error("Concurrent rotation for principal: {0}")]
    Conflict(String),
}

/// Scoped transaction. Dropping it without [`UnitOfWork::commit`] rolls back.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn commit(self) -> Result<(), StoreError>;
    async fn rollback(self) -> Result<(), StoreError>;
}

/// Durable mapping of GUID → {email, current refresh hash}.
///
/// Lookups signal "not found" with `None`; only I/O failures are errors.
/// Clones share the same backing storage.
#[async_trait]
pub trait CredentialStore: Clone + Send + Sync + 'static {
    type Tx: UnitOfWork;

    async fn lookup_email(&self, guid: &str) -> Result<Option<String>, StoreError>;

    async fn lookup_guid_by_hash(&self, hash: &str) -> Result<Option<String>, StoreError>;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Replace the refresh hash of `guid` inside `tx`.
    ///
    /// With `expected` set the write only applies while the stored hash still
    /// equals it, and a miss is reported as [`StoreError::Conflict`]. Without
    /// it a miss means the GUID is unknown ([`StoreError::NotEnrolled`]).
    async fn replace_hash(
        &self,
        tx: &mut Self::Tx,
        guid: &str,
        expected: Option<&str>,
        new_hash: &str,
    ) -> Result<(), StoreError>;

    async fn insert_principal(&self, guid: &str, email: &str, hash: &str)
    -> Result<(), StoreError>;
}
