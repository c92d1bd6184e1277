//! PostgreSQL credential store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::{CredentialStore, StoreError, UnitOfWork};

/// [`CredentialStore`] backed by the `principals` table.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A sqlx transaction. sqlx rolls it back when dropped uncommitted.
#[derive(Debug)]
pub struct PgUnitOfWork(Transaction<'static, Postgres>);

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> Result<(), StoreError> {
        self.0.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.0.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    type Tx = PgUnitOfWork;

    async fn lookup_email(&self, guid: &str) -> Result<Option<String>, StoreError> {
        let email =
            sqlx::query_scalar::<_, String>("SELECT email FROM principals WHERE guid = $1")
                .bind(guid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(email)
    }

    async fn lookup_guid_by_hash(&self, hash: &str) -> Result<Option<String>, StoreError> {
        let guid =
            sqlx::query_scalar::<_, String>("SELECT guid FROM principals WHERE refresh_hash = $1")
                .bind(hash)
                .fetch_optional(&self.pool)
                .await?;
        Ok(guid)
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(PgUnitOfWork(self.pool.begin().await?))
    }

    async fn replace_hash(
        &self,
        tx: &mut Self::Tx,
        guid: &str,
        expected: Option<&str>,
        new_hash: &str,
    ) -> Result<(), StoreError> {
        // The row lock taken by UPDATE serializes racing rotations; the loser
        // re-evaluates the guard after the winner commits and matches nothing.
        let result = sqlx::query(
            "UPDATE principals SET refresh_hash = $2, rotated_at = now() \
             WHERE guid = $1 AND ($3::text IS NULL OR refresh_hash = $3)",
        )
        .bind(guid)
        .bind(new_hash)
        .bind(expected)
        .execute(&mut *tx.0)
        .await?;

        if result.rows_affected() == 0 {
            debug!(guid, guarded = expected.is_some(), "refresh hash replacement matched no row");
            return Err(match expected {
                Some(_) => StoreError::Conflict(guid.to_string()),
                None => StoreError::NotEnrolled(guid.to_string()),
            });
        }
        Ok(())
    }

    async fn insert_principal(
        &self,
        guid: &str,
        email: &str,
        hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO principals (guid, email, refresh_hash) VALUES ($1, $2, $3)")
            .bind(guid)
            .bind(email)
            .bind(hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => StoreError::Duplicate(guid.to_string()),
                _ => StoreError::Database(e),
            })?;
        Ok(())
    }
}
