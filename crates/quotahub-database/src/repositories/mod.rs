//! Quota record repositories.

pub mod memory;
pub mod quota;

use async_trait::async_trait;
use uuid::Uuid;

use quotahub_core::result::AppResult;
use quotahub_entity::quota::{EntityKind, QuotaRecord};

pub use memory::InMemoryQuotaStore;
pub use quota::PgQuotaRepository;

/// Narrow repository interface over the durable quota record table.
///
/// The lifecycle manager is written against this trait so that the same
/// engine runs over PostgreSQL in production and over the in-memory store
/// in tests. Every mutation goes through the versioned [`update`] so a
/// stale write fails with `ConcurrentModification` instead of silently
/// winning — a last-writer-wins resize could mask a concurrent usage
/// update.
///
/// [`update`]: QuotaStore::update
#[async_trait]
pub trait QuotaStore: Send + Sync + 'static {
    /// Find a record by its primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<QuotaRecord>>;

    /// Find the active record for an entity, if any.
    async fn find_by_entity(
        &self,
        entity_kind: EntityKind,
        entity_id: Uuid,
    ) -> AppResult<Option<QuotaRecord>>;

    /// List records, optionally restricted to one entity kind, ordered by
    /// utilization descending so the most constrained entities come first.
    async fn find_all(&self, entity_kind: Option<EntityKind>) -> AppResult<Vec<QuotaRecord>>;

    /// Insert a new record. Fails with `DuplicateQuota` if an active
    /// record already exists for the same `(entity_kind, entity_id)`.
    async fn insert(&self, record: &QuotaRecord) -> AppResult<QuotaRecord>;

    /// Write an updated record only if the stored version still equals
    /// `expected_version`; the store bumps the version and `last_updated`.
    /// Fails with `ConcurrentModification` on a version mismatch and
    /// `NotFound` if the record no longer exists.
    async fn update(&self, record: &QuotaRecord, expected_version: i64) -> AppResult<QuotaRecord>;

    /// Delete a record by its primary key. Returns `true` if deleted.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}
