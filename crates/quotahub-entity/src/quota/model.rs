//! Quota record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use quotahub_core::AppResult;

use super::entity_kind::EntityKind;
use super::status::{self, QuotaStatus};

/// The unit of quota accounting for one entity.
///
/// `allocated_units` and `used_units` are unit-agnostic quantities; they
/// only have to share a unit. Conversion to MB/GB for display is entirely
/// a presentation concern.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuotaRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// Kind of the owning entity.
    pub entity_kind: EntityKind,
    /// Identifier of the owning entity (owned externally).
    pub entity_id: Uuid,
    /// Denormalized display name of the owning entity.
    pub entity_name: String,
    /// Allocated capacity. Always positive.
    pub allocated_units: i64,
    /// Currently used capacity. Non-negative; may exceed the allocation.
    pub used_units: i64,
    /// Warning threshold percentage in `[1,100]`.
    pub warning_threshold_percent: i16,
    /// Denormalized status, rewritten on every mutation. Read paths that
    /// report status recompute it through the classifier instead of
    /// trusting this column.
    pub status: QuotaStatus,
    /// Optimistic-concurrency version, incremented on every update.
    pub version: i64,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub last_updated: DateTime<Utc>,
}

impl QuotaRecord {
    /// Utilization rate as a percentage.
    pub fn utilization_percent(&self) -> f64 {
        status::utilization_percent(self.used_units, self.allocated_units)
    }

    /// Recompute the status from the current counters.
    pub fn classify(&self) -> AppResult<QuotaStatus> {
        QuotaStatus::classify(
            self.used_units,
            self.allocated_units,
            self.warning_threshold_percent,
        )
    }
}

/// Data required to allocate a new quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocateQuota {
    /// Kind of the owning entity.
    pub entity_kind: EntityKind,
    /// Identifier of the owning entity.
    pub entity_id: Uuid,
    /// Display name of the owning entity.
    pub entity_name: String,
    /// Allocated capacity. Must be positive.
    pub allocated_units: i64,
    /// Warning threshold percentage. `None` uses the engine default.
    pub warning_threshold_percent: Option<i16>,
}

/// Filter for quota list and summary queries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QuotaFilter {
    /// Restrict to one entity kind.
    pub entity_kind: Option<EntityKind>,
    /// Restrict to records currently classified into one status.
    pub status: Option<QuotaStatus>,
}

impl QuotaFilter {
    /// Filter matching every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict the filter to an entity kind.
    pub fn with_entity_kind(mut self, kind: EntityKind) -> Self {
        self.entity_kind = Some(kind);
        self
    }

    /// Restrict the filter to a classified status.
    pub fn with_status(mut self, status: QuotaStatus) -> Self {
        self.status = Some(status);
        self
    }
}
