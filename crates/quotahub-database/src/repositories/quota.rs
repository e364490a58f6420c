//! PostgreSQL quota repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use quotahub_core::error::{AppError, ErrorKind};
use quotahub_core::result::AppResult;
use quotahub_entity::quota::{EntityKind, QuotaRecord};

use super::QuotaStore;

/// Repository for quota record CRUD against PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgQuotaRepository {
    pool: PgPool,
}

impl PgQuotaRepository {
    /// Create a new quota repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaStore for PgQuotaRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<QuotaRecord>> {
        sqlx::query_as::<_, QuotaRecord>("SELECT * FROM quota_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find quota record", e)
            })
    }

    async fn find_by_entity(
        &self,
        entity_kind: EntityKind,
        entity_id: Uuid,
    ) -> AppResult<Option<QuotaRecord>> {
        sqlx::query_as::<_, QuotaRecord>(
            "SELECT * FROM quota_records WHERE entity_kind = $1 AND entity_id = $2",
        )
        .bind(entity_kind)
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find quota by entity", e)
        })
    }

    async fn find_all(&self, entity_kind: Option<EntityKind>) -> AppResult<Vec<QuotaRecord>> {
        let query = match entity_kind {
            Some(kind) => sqlx::query_as::<_, QuotaRecord>(
                "SELECT * FROM quota_records WHERE entity_kind = $1 \
                 ORDER BY used_units::DOUBLE PRECISION / allocated_units DESC, entity_name ASC",
            )
            .bind(kind),
            None => sqlx::query_as::<_, QuotaRecord>(
                "SELECT * FROM quota_records \
                 ORDER BY used_units::DOUBLE PRECISION / allocated_units DESC, entity_name ASC",
            ),
        };

        query.fetch_all(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list quota records", e)
        })
    }

    async fn insert(&self, record: &QuotaRecord) -> AppResult<QuotaRecord> {
        sqlx::query_as::<_, QuotaRecord>(
            "INSERT INTO quota_records \
             (id, entity_kind, entity_id, entity_name, allocated_units, used_units, \
              warning_threshold_percent, status, version, created_at, last_updated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(record.id)
        .bind(record.entity_kind)
        .bind(record.entity_id)
        .bind(&record.entity_name)
        .bind(record.allocated_units)
        .bind(record.used_units)
        .bind(record.warning_threshold_percent)
        .bind(record.status)
        .bind(record.version)
        .bind(record.created_at)
        .bind(record.last_updated)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::duplicate_quota(
                format!(
                    "A quota already exists for {} {}",
                    record.entity_kind, record.entity_id
                ),
            ),
            _ => AppError::with_source(ErrorKind::Database, "Failed to insert quota record", e),
        })
    }

    async fn update(&self, record: &QuotaRecord, expected_version: i64) -> AppResult<QuotaRecord> {
        let updated = sqlx::query_as::<_, QuotaRecord>(
            "UPDATE quota_records SET \
             entity_name = $2, allocated_units = $3, used_units = $4, \
             warning_threshold_percent = $5, status = $6, \
             version = version + 1, last_updated = NOW() \
             WHERE id = $1 AND version = $7 RETURNING *",
        )
        .bind(record.id)
        .bind(&record.entity_name)
        .bind(record.allocated_units)
        .bind(record.used_units)
        .bind(record.warning_threshold_percent)
        .bind(record.status)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update quota record", e)
        })?;

        match updated {
            Some(r) => Ok(r),
            // Zero rows means either the record is gone or someone else
            // bumped the version since our read. Distinguish the two.
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM quota_records WHERE id = $1)")
                        .bind(record.id)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(|e| {
                            AppError::with_source(
                                ErrorKind::Database,
                                "Failed to check quota record existence",
                                e,
                            )
                        })?;
                if exists {
                    Err(AppError::concurrent_modification(format!(
                        "Quota record {} was modified concurrently; retry with a fresh read",
                        record.id
                    )))
                } else {
                    Err(AppError::not_found(format!(
                        "Quota record {} not found",
                        record.id
                    )))
                }
            }
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM quota_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete quota record", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
