//! Fleet-wide quota rollups for dashboard cards.

use serde::{Deserialize, Serialize};

use quotahub_core::AppResult;

use super::model::QuotaRecord;
use super::status::QuotaStatus;

/// Per-status record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Records classified `Normal`.
    pub normal: u64,
    /// Records classified `Warning`.
    pub warning: u64,
    /// Records classified `Critical`.
    pub critical: u64,
    /// Records classified `Exceeded`.
    pub exceeded: u64,
}

impl StatusCounts {
    /// Count for a given status.
    pub fn get(&self, status: QuotaStatus) -> u64 {
        match status {
            QuotaStatus::Normal => self.normal,
            QuotaStatus::Warning => self.warning,
            QuotaStatus::Critical => self.critical,
            QuotaStatus::Exceeded => self.exceeded,
        }
    }

    fn increment(&mut self, status: QuotaStatus) {
        match status {
            QuotaStatus::Normal => self.normal += 1,
            QuotaStatus::Warning => self.warning += 1,
            QuotaStatus::Critical => self.critical += 1,
            QuotaStatus::Exceeded => self.exceeded += 1,
        }
    }
}

/// Snapshot rollup over a collection of quota records.
///
/// Recomputed in full on every request. The dataset is small (quota
/// records for one organization, hundreds at most), so a maintained
/// running aggregate is not worth its transactional coupling yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaSummary {
    /// Number of records in the snapshot.
    pub record_count: u64,
    /// Sum of allocated units.
    pub total_allocated: i64,
    /// Sum of used units.
    pub total_used: i64,
    /// `total_used / total_allocated * 100`, or `0.0` for an empty
    /// collection or zero total allocation.
    pub overall_utilization_percent: f64,
    /// Per-status record counts, recomputed through the classifier.
    pub count_by_status: StatusCounts,
}

impl QuotaSummary {
    /// Aggregate a collection of quota records.
    ///
    /// Statuses are recomputed per record instead of read from the
    /// persisted column, because usage may have been updated since the
    /// column was last written.
    pub fn aggregate(records: &[QuotaRecord]) -> AppResult<Self> {
        let mut total_allocated: i64 = 0;
        let mut total_used: i64 = 0;
        let mut count_by_status = StatusCounts::default();

        for record in records {
            total_allocated += record.allocated_units;
            total_used += record.used_units;
            count_by_status.increment(record.classify()?);
        }

        let overall_utilization_percent = if total_allocated > 0 {
            (total_used as f64 / total_allocated as f64) * 100.0
        } else {
            0.0
        };

        Ok(Self {
            record_count: records.len() as u64,
            total_allocated,
            total_used,
            overall_utilization_percent,
            count_by_status,
        })
    }
}

impl Default for QuotaSummary {
    fn default() -> Self {
        Self {
            record_count: 0,
            total_allocated: 0,
            total_used: 0,
            overall_utilization_percent: 0.0,
            count_by_status: StatusCounts::default(),
        }
    }
}
