//! Quota lifecycle manager.
//!
//! All mutating operations are read-modify-write against the store with
//! an optimistic version check: a writer holding a stale version fails
//! with `ConcurrentModification` and must retry with a fresh read. Every
//! store call carries the configured timeout and fails with
//! `StoreUnavailable` on expiry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use quotahub_core::config::engine::EngineConfig;
use quotahub_core::error::AppError;
use quotahub_core::result::AppResult;
use quotahub_core::types::pagination::{PageRequest, PageResponse};
use quotahub_database::repositories::QuotaStore;
use quotahub_entity::quota::{
    AllocateQuota, QuotaFilter, QuotaRecord, QuotaStatus, QuotaSummary,
};

use crate::alert::AlertDispatcher;

/// Manages the lifecycle of quota records: allocation, resizing, usage
/// accounting, reset, and deletion, plus the list/summary query paths
/// consumed by dashboards.
#[derive(Clone)]
pub struct QuotaService {
    /// Quota record store.
    store: Arc<dyn QuotaStore>,
    /// Alert dispatcher for status transitions.
    alerts: AlertDispatcher,
    /// Timeout applied to every store call.
    store_timeout: Duration,
    /// Warning threshold used when an allocation does not specify one.
    default_warning_threshold: i16,
}

impl QuotaService {
    /// Create a new quota service.
    pub fn new(store: Arc<dyn QuotaStore>, alerts: AlertDispatcher, config: &EngineConfig) -> Self {
        Self {
            store,
            alerts,
            store_timeout: Duration::from_millis(config.store_timeout_ms),
            default_warning_threshold: config.default_warning_threshold_percent,
        }
    }

    /// Allocate a new quota for an entity.
    ///
    /// Fails with `DuplicateQuota` if the entity already has an active
    /// record and `InvalidAllocation` for a non-positive size or a
    /// threshold outside `[1,100]`. The record starts with zero usage.
    pub async fn allocate(&self, command: AllocateQuota) -> AppResult<QuotaRecord> {
        if command.allocated_units <= 0 {
            return Err(AppError::invalid_allocation(format!(
                "Allocated units must be positive, got {}",
                command.allocated_units
            )));
        }
        let threshold = command
            .warning_threshold_percent
            .unwrap_or(self.default_warning_threshold);
        if !(1..=100).contains(&threshold) {
            return Err(AppError::invalid_allocation(format!(
                "Warning threshold must be between 1 and 100, got {threshold}"
            )));
        }

        // Fast duplicate check; the store's unique index is the final
        // arbiter under concurrent allocation.
        let existing = self
            .store_call(self.store.find_by_entity(command.entity_kind, command.entity_id))
            .await?;
        if existing.is_some() {
            return Err(AppError::duplicate_quota(format!(
                "A quota already exists for {} {}",
                command.entity_kind, command.entity_id
            )));
        }

        let now = Utc::now();
        let record = QuotaRecord {
            id: Uuid::new_v4(),
            entity_kind: command.entity_kind,
            entity_id: command.entity_id,
            entity_name: command.entity_name,
            allocated_units: command.allocated_units,
            used_units: 0,
            warning_threshold_percent: threshold,
            status: QuotaStatus::classify(0, command.allocated_units, threshold)?,
            version: 1,
            created_at: now,
            last_updated: now,
        };

        let created = self.store_call(self.store.insert(&record)).await?;
        info!(
            record_id = %created.id,
            entity_kind = %created.entity_kind,
            entity_id = %created.entity_id,
            allocated_units = created.allocated_units,
            "Quota allocated"
        );
        Ok(created)
    }

    /// Change a quota's allocation, keeping its current usage.
    pub async fn resize(&self, id: Uuid, new_allocated_units: i64) -> AppResult<QuotaRecord> {
        if new_allocated_units <= 0 {
            return Err(AppError::invalid_allocation(format!(
                "Allocated units must be positive, got {new_allocated_units}"
            )));
        }
        let record = self.get(id).await?;
        self.apply_allocation(record, new_allocated_units).await
    }

    /// Grow a quota's allocation by `additional_units`.
    pub async fn extend(&self, id: Uuid, additional_units: i64) -> AppResult<QuotaRecord> {
        if additional_units <= 0 {
            return Err(AppError::invalid_allocation(format!(
                "Additional units must be positive, got {additional_units}"
            )));
        }
        let record = self.get(id).await?;
        let target = record
            .allocated_units
            .checked_add(additional_units)
            .ok_or_else(|| AppError::invalid_allocation("Extension overflows allocation"))?;
        self.apply_allocation(record, target).await
    }

    /// Record an absolute usage value reported by an external meter.
    ///
    /// Usage may exceed the allocation; that is a valid, alertable state.
    pub async fn record_usage(&self, id: Uuid, new_used_units: i64) -> AppResult<QuotaRecord> {
        if new_used_units < 0 {
            return Err(AppError::invalid_usage(format!(
                "Used units must be non-negative, got {new_used_units}"
            )));
        }
        let record = self.get(id).await?;
        self.apply_usage(record, new_used_units).await
    }

    /// Zero a quota's usage counter.
    ///
    /// Distinct from `record_usage` because it is an audited
    /// administrative action: it only resets the accounting number and
    /// never deletes any underlying data.
    pub async fn reset(&self, id: Uuid) -> AppResult<QuotaRecord> {
        let record = self.get(id).await?;
        info!(
            target: "audit",
            record_id = %record.id,
            entity_kind = %record.entity_kind,
            entity_id = %record.entity_id,
            previous_used_units = record.used_units,
            "Quota usage reset"
        );
        self.apply_usage(record, 0).await
    }

    /// Delete a quota record.
    ///
    /// A second delete fails with `NotFound` rather than succeeding
    /// silently, so callers can detect double-submission bugs.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let deleted = self.store_call(self.store.delete(id)).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Quota record {id} not found")));
        }
        info!(target: "audit", record_id = %id, "Quota deleted");
        Ok(())
    }

    /// Fetch one quota record, with its status freshly classified.
    pub async fn get(&self, id: Uuid) -> AppResult<QuotaRecord> {
        let mut record = self
            .store_call(self.store.find_by_id(id))
            .await?
            .ok_or_else(|| AppError::not_found(format!("Quota record {id} not found")))?;
        record.status = record.classify()?;
        Ok(record)
    }

    /// List quota records for table rendering, most utilized first.
    ///
    /// Statuses are recomputed on the way out, and the status filter
    /// applies to the recomputed value, never the persisted column.
    pub async fn list(
        &self,
        filter: QuotaFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<QuotaRecord>> {
        let records = self.fetch_classified(filter).await?;
        let total = records.len() as u64;

        let start = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items: Vec<QuotaRecord> = records
            .into_iter()
            .skip(start)
            .take(page.limit() as usize)
            .collect();

        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    /// Aggregate a dashboard summary over the filtered record set.
    pub async fn summary(&self, filter: QuotaFilter) -> AppResult<QuotaSummary> {
        let records = self.fetch_classified(filter).await?;
        QuotaSummary::aggregate(&records)
    }

    /// Fetch records matching the filter with freshly classified statuses.
    async fn fetch_classified(&self, filter: QuotaFilter) -> AppResult<Vec<QuotaRecord>> {
        let records = self.store_call(self.store.find_all(filter.entity_kind)).await?;
        let mut classified = Vec::with_capacity(records.len());
        for mut record in records {
            record.status = record.classify()?;
            if filter.status.is_none_or(|s| record.status == s) {
                classified.push(record);
            }
        }
        Ok(classified)
    }

    /// Write a new allocation through the versioned update and emit a
    /// transition event if the status changed.
    async fn apply_allocation(
        &self,
        mut record: QuotaRecord,
        new_allocated_units: i64,
    ) -> AppResult<QuotaRecord> {
        let previous_status = record.status;
        record.allocated_units = new_allocated_units;
        record.status = record.classify()?;

        let expected_version = record.version;
        let updated = self.store_call(self.store.update(&record, expected_version)).await?;
        debug!(
            record_id = %updated.id,
            allocated_units = updated.allocated_units,
            status = %updated.status,
            "Quota resized"
        );

        if updated.status != previous_status {
            self.alerts
                .on_transition(&updated, previous_status, updated.status)
                .await;
        }
        Ok(updated)
    }

    /// Write a new usage value through the versioned update and emit a
    /// transition event if the status changed.
    async fn apply_usage(
        &self,
        mut record: QuotaRecord,
        new_used_units: i64,
    ) -> AppResult<QuotaRecord> {
        let previous_status = record.status;
        record.used_units = new_used_units;
        record.status = record.classify()?;

        let expected_version = record.version;
        let updated = self.store_call(self.store.update(&record, expected_version)).await?;
        debug!(
            record_id = %updated.id,
            used_units = updated.used_units,
            status = %updated.status,
            "Quota usage recorded"
        );

        if updated.status != previous_status {
            self.alerts
                .on_transition(&updated, previous_status, updated.status)
                .await;
        }
        Ok(updated)
    }

    /// Run a store call under the configured timeout.
    async fn store_call<T>(
        &self,
        fut: impl Future<Output = AppResult<T>> + Send,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::store_unavailable(format!(
                "Store call did not complete within {}ms",
                self.store_timeout.as_millis()
            ))),
        }
    }
}

impl std::fmt::Debug for QuotaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaService")
            .field("store_timeout", &self.store_timeout)
            .field("default_warning_threshold", &self.default_warning_threshold)
            .finish_non_exhaustive()
    }
}
