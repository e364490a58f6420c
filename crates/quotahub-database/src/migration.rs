//! Database migration runner.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use quotahub_core::error::{AppError, ErrorKind};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// The embedded migrator for the quota schema.
pub fn migrator() -> &'static Migrator {
    &MIGRATOR
}

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Running database migrations...");

    migrator().run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    info!("Database migrations completed successfully");
    Ok(())
}

/// Status of one embedded migration against the database.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Migration version number.
    pub version: i64,
    /// Human-readable description (from the migration filename).
    pub description: String,
    /// Whether the migration has been applied successfully.
    pub applied: bool,
}

/// Report applied/pending state for every embedded migration.
pub async fn migration_status(pool: &PgPool) -> Result<Vec<MigrationStatus>, AppError> {
    // The bookkeeping table does not exist until the first run.
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
         WHERE table_name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| {
        AppError::with_source(ErrorKind::Database, "Failed to check migration table", e)
    })?;

    let applied: Vec<i64> = if table_exists {
        sqlx::query_scalar(
            "SELECT version FROM _sqlx_migrations WHERE success = TRUE ORDER BY version",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to read applied migrations", e)
        })?
    } else {
        Vec::new()
    };

    Ok(migrator()
        .iter()
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_are_present() {
        let versions: Vec<i64> = migrator().iter().map(|m| m.version).collect();
        assert!(versions.contains(&1), "initial schema migration missing");
    }

    #[test]
    fn test_migration_descriptions_come_from_filenames() {
        let initial = migrator()
            .iter()
            .find(|m| m.version == 1)
            .expect("initial migration");
        assert_eq!(initial.description, "create quota records");
    }
}
