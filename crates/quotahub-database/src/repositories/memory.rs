//! In-memory quota store.
//!
//! Mirrors the PostgreSQL repository's semantics, including the
//! optimistic version check and duplicate-entity rejection, so the
//! lifecycle manager can be exercised in tests without a database.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use quotahub_core::error::AppError;
use quotahub_core::result::AppResult;
use quotahub_entity::quota::{EntityKind, QuotaRecord};

use super::QuotaStore;

/// DashMap-backed quota store with the same contract as the Postgres
/// repository.
#[derive(Debug, Default)]
pub struct InMemoryQuotaStore {
    records: DashMap<Uuid, QuotaRecord>,
}

impl InMemoryQuotaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<QuotaRecord>> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_entity(
        &self,
        entity_kind: EntityKind,
        entity_id: Uuid,
    ) -> AppResult<Option<QuotaRecord>> {
        Ok(self
            .records
            .iter()
            .find(|r| r.entity_kind == entity_kind && r.entity_id == entity_id)
            .map(|r| r.value().clone()))
    }

    async fn find_all(&self, entity_kind: Option<EntityKind>) -> AppResult<Vec<QuotaRecord>> {
        let mut records: Vec<QuotaRecord> = self
            .records
            .iter()
            .filter(|r| entity_kind.is_none_or(|kind| r.entity_kind == kind))
            .map(|r| r.value().clone())
            .collect();

        records.sort_by(|a, b| {
            b.utilization_percent()
                .partial_cmp(&a.utilization_percent())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entity_name.cmp(&b.entity_name))
        });
        Ok(records)
    }

    async fn insert(&self, record: &QuotaRecord) -> AppResult<QuotaRecord> {
        let duplicate = self
            .records
            .iter()
            .any(|r| r.entity_kind == record.entity_kind && r.entity_id == record.entity_id);
        if duplicate {
            return Err(AppError::duplicate_quota(format!(
                "A quota already exists for {} {}",
                record.entity_kind, record.entity_id
            )));
        }

        self.records.insert(record.id, record.clone());
        Ok(record.clone())
    }

    async fn update(&self, record: &QuotaRecord, expected_version: i64) -> AppResult<QuotaRecord> {
        let mut entry = self.records.get_mut(&record.id).ok_or_else(|| {
            AppError::not_found(format!("Quota record {} not found", record.id))
        })?;

        if entry.version != expected_version {
            return Err(AppError::concurrent_modification(format!(
                "Quota record {} was modified concurrently; retry with a fresh read",
                record.id
            )));
        }

        let mut updated = record.clone();
        updated.version = expected_version + 1;
        updated.last_updated = Utc::now();
        *entry = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.records.remove(&id).is_some())
    }
}
