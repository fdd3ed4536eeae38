//! Database migration support.
//!
//! Embeds the SQL migrations from the `migrations/` directory and applies
//! them at startup.

use crate::error::DbError;
use sqlx::PgPool;
use tracing::info;

/// Run all pending migrations against the given pool.
///
/// # Errors
///
/// Returns [`DbError::MigrationFailed`] if any migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    info!("Running database migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(DbError::MigrationFailed)?;
    info!("Database migrations complete");
    Ok(())
}
