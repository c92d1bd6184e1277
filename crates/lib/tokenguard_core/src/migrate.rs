//! Schema migrations.
//!
//! The `principals` table holds one row per enrolled GUID with its contact
//! email and the hash of its single live refresh token (unique, so a hash
//! resolves to at most one principal).

use sqlx::PgPool;

/// Apply the embedded migrations from `tokenguard_core/migrations/`.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
