//! End-to-end lifecycle tests for the quota engine, run over the
//! in-memory store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use quotahub_core::config::alert::AlertConfig;
use quotahub_core::config::engine::EngineConfig;
use quotahub_core::error::ErrorKind;
use quotahub_core::result::AppResult;
use quotahub_core::types::pagination::PageRequest;
use quotahub_database::repositories::{InMemoryQuotaStore, QuotaStore};
use quotahub_entity::quota::{AllocateQuota, EntityKind, QuotaFilter, QuotaRecord, QuotaStatus};
use quotahub_service::alert::{AlertDispatcher, Notifier, QuotaAlert};
use quotahub_service::quota::QuotaService;

/// Notifier that records every delivered alert for assertions.
#[derive(Debug, Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<QuotaAlert>>,
}

impl RecordingNotifier {
    fn delivered(&self) -> Vec<QuotaAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, alert: &QuotaAlert) -> AppResult<()> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

struct TestEngine {
    service: QuotaService,
    store: Arc<InMemoryQuotaStore>,
    notifier: Arc<RecordingNotifier>,
}

fn engine() -> TestEngine {
    let store = Arc::new(InMemoryQuotaStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let alerts = AlertDispatcher::new(
        &AlertConfig::default(),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );
    let service = QuotaService::new(
        Arc::clone(&store) as Arc<dyn QuotaStore>,
        alerts,
        &EngineConfig::default(),
    );
    TestEngine {
        service,
        store,
        notifier,
    }
}

fn allocate_command(entity_kind: EntityKind, allocated: i64, threshold: i16) -> AllocateQuota {
    AllocateQuota {
        entity_kind,
        entity_id: Uuid::new_v4(),
        entity_name: "org-1".to_string(),
        allocated_units: allocated,
        warning_threshold_percent: Some(threshold),
    }
}

#[tokio::test]
async fn allocate_then_get_round_trip() {
    let engine = engine();
    let created = engine
        .service
        .allocate(allocate_command(EntityKind::Organization, 100, 80))
        .await
        .unwrap();

    assert_eq!(created.used_units, 0);
    assert_eq!(created.status, QuotaStatus::Normal);
    assert_eq!(created.version, 1);

    let fetched = engine.service.get(created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.status, QuotaStatus::Normal);
}

#[tokio::test]
async fn allocate_rejects_invalid_input() {
    let engine = engine();

    let err = engine
        .service
        .allocate(allocate_command(EntityKind::User, 0, 80))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidAllocation);

    let err = engine
        .service
        .allocate(allocate_command(EntityKind::User, 100, 0))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidAllocation);

    let err = engine
        .service
        .allocate(allocate_command(EntityKind::User, 100, 101))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidAllocation);
}

#[tokio::test]
async fn allocate_rejects_duplicate_entity() {
    let engine = engine();
    let command = allocate_command(EntityKind::Department, 100, 80);
    engine.service.allocate(command.clone()).await.unwrap();

    let err = engine.service.allocate(command).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateQuota);
}

#[tokio::test]
async fn escalation_scenario_fires_alerts_edge_triggered() {
    let engine = engine();
    let record = engine
        .service
        .allocate(allocate_command(EntityKind::Organization, 100, 80))
        .await
        .unwrap();

    // 82% -> Warning, one alert.
    let updated = engine.service.record_usage(record.id, 82).await.unwrap();
    assert_eq!(updated.status, QuotaStatus::Warning);
    assert_eq!(engine.notifier.delivered().len(), 1);

    // 96% -> Critical, second alert.
    let updated = engine.service.record_usage(record.id, 96).await.unwrap();
    assert_eq!(updated.status, QuotaStatus::Critical);
    assert_eq!(engine.notifier.delivered().len(), 2);

    // 60% -> Normal, de-escalation is silent.
    let updated = engine.service.record_usage(record.id, 60).await.unwrap();
    assert_eq!(updated.status, QuotaStatus::Normal);
    assert_eq!(engine.notifier.delivered().len(), 2);

    // Resize to 50 with used=60 -> 120% -> Exceeded. One alert even
    // though Warning and Critical were skipped.
    let updated = engine.service.resize(record.id, 50).await.unwrap();
    assert_eq!(updated.status, QuotaStatus::Exceeded);

    let alerts = engine.notifier.delivered();
    assert_eq!(alerts.len(), 3);
    let last = alerts.last().unwrap();
    assert_eq!(last.previous_status, QuotaStatus::Normal);
    assert_eq!(last.new_status, QuotaStatus::Exceeded);
    assert!((last.utilization_percent - 120.0).abs() < 1e-9);
}

#[tokio::test]
async fn reset_zeroes_usage_and_keeps_allocation() {
    let engine = engine();
    let record = engine
        .service
        .allocate(allocate_command(EntityKind::User, 200, 80))
        .await
        .unwrap();
    engine.service.record_usage(record.id, 199).await.unwrap();

    let reset = engine.service.reset(record.id).await.unwrap();
    assert_eq!(reset.used_units, 0);
    assert_eq!(reset.status, QuotaStatus::Normal);
    assert_eq!(reset.allocated_units, 200);
}

#[tokio::test]
async fn extend_grows_allocation() {
    let engine = engine();
    let record = engine
        .service
        .allocate(allocate_command(EntityKind::Department, 100, 80))
        .await
        .unwrap();

    let extended = engine.service.extend(record.id, 50).await.unwrap();
    assert_eq!(extended.allocated_units, 150);

    let err = engine.service.extend(record.id, 0).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidAllocation);

    let err = engine.service.extend(record.id, -10).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidAllocation);
}

#[tokio::test]
async fn record_usage_rejects_negative_units() {
    let engine = engine();
    let record = engine
        .service
        .allocate(allocate_command(EntityKind::User, 100, 80))
        .await
        .unwrap();

    let err = engine.service.record_usage(record.id, -1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidUsage);

    // The rejected write must not touch the record.
    let unchanged = engine.service.get(record.id).await.unwrap();
    assert_eq!(unchanged.used_units, 0);
    assert_eq!(unchanged.version, record.version);
}

#[tokio::test]
async fn resize_rejects_non_positive_allocation() {
    let engine = engine();
    let record = engine
        .service
        .allocate(allocate_command(EntityKind::Department, 100, 80))
        .await
        .unwrap();

    let err = engine.service.resize(record.id, 0).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidAllocation);

    let err = engine.service.resize(record.id, -50).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidAllocation);

    let unchanged = engine.service.get(record.id).await.unwrap();
    assert_eq!(unchanged.allocated_units, 100);
}

#[tokio::test]
async fn mutations_on_missing_record_are_not_found() {
    let engine = engine();
    let id = Uuid::new_v4();

    assert_eq!(
        engine.service.resize(id, 100).await.unwrap_err().kind,
        ErrorKind::NotFound
    );
    assert_eq!(
        engine.service.record_usage(id, 10).await.unwrap_err().kind,
        ErrorKind::NotFound
    );
    assert_eq!(
        engine.service.reset(id).await.unwrap_err().kind,
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn second_delete_is_an_error() {
    let engine = engine();
    let record = engine
        .service
        .allocate(allocate_command(EntityKind::User, 100, 80))
        .await
        .unwrap();

    engine.service.delete(record.id).await.unwrap();
    let err = engine.service.delete(record.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn stale_writer_gets_concurrent_modification() {
    let engine = engine();
    let record = engine
        .service
        .allocate(allocate_command(EntityKind::Organization, 100, 80))
        .await
        .unwrap();

    // Both writers read version 1; the first commits through the service.
    let stale_read = engine.store.find_by_id(record.id).await.unwrap().unwrap();
    engine.service.resize(record.id, 150).await.unwrap();

    let mut stale_write = stale_read.clone();
    stale_write.allocated_units = 300;
    let err = engine
        .store
        .update(&stale_write, stale_read.version)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConcurrentModification);
}

#[tokio::test]
async fn list_filters_by_recomputed_status() {
    let engine = engine();
    let normal = engine
        .service
        .allocate(allocate_command(EntityKind::User, 100, 80))
        .await
        .unwrap();
    let warned = engine
        .service
        .allocate(allocate_command(EntityKind::Organization, 100, 80))
        .await
        .unwrap();
    engine.service.record_usage(warned.id, 85).await.unwrap();

    let warnings = engine
        .service
        .list(
            QuotaFilter::all().with_status(QuotaStatus::Warning),
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(warnings.items.len(), 1);
    assert_eq!(warnings.items[0].id, warned.id);

    let users = engine
        .service
        .list(
            QuotaFilter::all().with_entity_kind(EntityKind::User),
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(users.items.len(), 1);
    assert_eq!(users.items[0].id, normal.id);

    let all = engine
        .service
        .list(QuotaFilter::all(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.total_items, 2);
    // Most utilized first.
    assert_eq!(all.items[0].id, warned.id);
}

#[tokio::test]
async fn summary_rolls_up_filtered_records() {
    let engine = engine();
    let org = engine
        .service
        .allocate(allocate_command(EntityKind::Organization, 100, 80))
        .await
        .unwrap();
    engine.service.record_usage(org.id, 96).await.unwrap();
    engine
        .service
        .allocate(allocate_command(EntityKind::User, 300, 80))
        .await
        .unwrap();

    let summary = engine.service.summary(QuotaFilter::all()).await.unwrap();
    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.total_allocated, 400);
    assert_eq!(summary.total_used, 96);
    assert_eq!(summary.count_by_status.critical, 1);
    assert_eq!(summary.count_by_status.normal, 1);
    assert!((summary.overall_utilization_percent - 24.0).abs() < 1e-9);

    let orgs_only = engine
        .service
        .summary(QuotaFilter::all().with_entity_kind(EntityKind::Organization))
        .await
        .unwrap();
    assert_eq!(orgs_only.record_count, 1);
    assert_eq!(orgs_only.total_allocated, 100);

    let empty = engine
        .service
        .summary(QuotaFilter::all().with_status(QuotaStatus::Exceeded))
        .await
        .unwrap();
    assert_eq!(empty.record_count, 0);
    assert_eq!(empty.overall_utilization_percent, 0.0);
}

/// Store whose every call hangs, for exercising the timeout path.
#[derive(Debug)]
struct StalledStore;

#[async_trait]
impl QuotaStore for StalledStore {
    async fn find_by_id(&self, _id: Uuid) -> AppResult<Option<QuotaRecord>> {
        std::future::pending().await
    }

    async fn find_by_entity(
        &self,
        _entity_kind: EntityKind,
        _entity_id: Uuid,
    ) -> AppResult<Option<QuotaRecord>> {
        std::future::pending().await
    }

    async fn find_all(&self, _entity_kind: Option<EntityKind>) -> AppResult<Vec<QuotaRecord>> {
        std::future::pending().await
    }

    async fn insert(&self, _record: &QuotaRecord) -> AppResult<QuotaRecord> {
        std::future::pending().await
    }

    async fn update(
        &self,
        _record: &QuotaRecord,
        _expected_version: i64,
    ) -> AppResult<QuotaRecord> {
        std::future::pending().await
    }

    async fn delete(&self, _id: Uuid) -> AppResult<bool> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn stalled_store_times_out_as_store_unavailable() {
    let config = EngineConfig {
        store_timeout_ms: 20,
        ..EngineConfig::default()
    };
    let service = QuotaService::new(
        Arc::new(StalledStore),
        AlertDispatcher::with_log_notifier(&AlertConfig::default()),
        &config,
    );

    let err = service.get(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreUnavailable);
    assert!(err.kind.is_retryable());
}
