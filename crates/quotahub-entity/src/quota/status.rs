//! Quota status classification.
//!
//! This is the single threshold classifier for the whole application.
//! Every read or write path that reports a status goes through
//! [`QuotaStatus::classify`]; nothing may set a status directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use quotahub_core::{AppError, AppResult};

/// Utilization rate at or above which a record is `Critical`, independent
/// of the configurable warning threshold. Guarantees an early critical
/// signal even when an organization configures a warning threshold of 99%.
pub const CRITICAL_RATE_PERCENT: f64 = 95.0;

/// Utilization rate at or above which a record is `Exceeded`.
pub const EXCEEDED_RATE_PERCENT: f64 = 100.0;

/// Derived urgency classification of a quota record.
///
/// The variant order defines severity: `Normal < Warning < Critical <
/// Exceeded`. A transition to a strictly greater status is an escalation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "quota_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuotaStatus {
    /// Utilization below the warning threshold.
    Normal,
    /// Utilization at or above the warning threshold.
    Warning,
    /// Utilization at or above 95%.
    Critical,
    /// Utilization at or above 100%. Usage exceeding allocation is a
    /// valid, alertable state, not an invariant violation.
    Exceeded,
}

impl QuotaStatus {
    /// Classify a `(used, allocated, warning threshold)` triple.
    ///
    /// Buckets are evaluated in descending severity, so ties resolve to
    /// the more severe bucket. `allocated_units <= 0` is a contract
    /// violation: the lifecycle manager rejects such allocations with
    /// `InvalidAllocation` long before this function can see them.
    pub fn classify(
        used_units: i64,
        allocated_units: i64,
        warning_threshold_percent: i16,
    ) -> AppResult<Self> {
        if allocated_units <= 0 {
            return Err(AppError::validation(
                "classify called with non-positive allocated units",
            ));
        }

        let rate = utilization_percent(used_units, allocated_units);
        if rate >= EXCEEDED_RATE_PERCENT {
            Ok(Self::Exceeded)
        } else if rate >= CRITICAL_RATE_PERCENT {
            Ok(Self::Critical)
        } else if rate >= f64::from(warning_threshold_percent) {
            Ok(Self::Warning)
        } else {
            Ok(Self::Normal)
        }
    }

    /// Whether moving from `previous` to `new` is an escalation.
    ///
    /// Only escalations trigger alerting; de-escalation (for example after
    /// a resize) is silently informative.
    pub fn is_escalation(previous: Self, new: Self) -> bool {
        new > previous
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Exceeded => "exceeded",
        }
    }
}

impl fmt::Display for QuotaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QuotaStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            "exceeded" => Ok(Self::Exceeded),
            _ => Err(AppError::validation(format!(
                "Invalid quota status: '{s}'. Expected one of: normal, warning, critical, exceeded"
            ))),
        }
    }
}

/// Utilization rate as a percentage. Returns `0.0` when `allocated_units`
/// is not positive; callers that treat that as an error check it first.
pub fn utilization_percent(used_units: i64, allocated_units: i64) -> f64 {
    if allocated_units <= 0 {
        return 0.0;
    }
    (used_units as f64 / allocated_units as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_usage_is_normal() {
        for allocated in [1, 100, 1_000_000] {
            assert_eq!(
                QuotaStatus::classify(0, allocated, 80).unwrap(),
                QuotaStatus::Normal
            );
        }
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(
            QuotaStatus::classify(79, 100, 80).unwrap(),
            QuotaStatus::Normal
        );
        assert_eq!(
            QuotaStatus::classify(80, 100, 80).unwrap(),
            QuotaStatus::Warning
        );
        assert_eq!(
            QuotaStatus::classify(95, 100, 80).unwrap(),
            QuotaStatus::Critical
        );
        assert_eq!(
            QuotaStatus::classify(100, 100, 80).unwrap(),
            QuotaStatus::Exceeded
        );
    }

    #[test]
    fn test_over_allocation_is_exceeded_regardless_of_threshold() {
        for threshold in [1, 50, 99, 100] {
            assert_eq!(
                QuotaStatus::classify(120, 100, threshold).unwrap(),
                QuotaStatus::Exceeded
            );
        }
    }

    #[test]
    fn test_critical_ceiling_overrides_high_threshold() {
        // An organization with a 99% warning threshold still gets the
        // fixed 95% critical signal first.
        assert_eq!(
            QuotaStatus::classify(96, 100, 99).unwrap(),
            QuotaStatus::Critical
        );
    }

    #[test]
    fn test_severity_is_monotonic_in_usage() {
        let mut previous = QuotaStatus::Normal;
        for used in 0..=150 {
            let status = QuotaStatus::classify(used, 100, 80).unwrap();
            assert!(status >= previous, "severity decreased at used={used}");
            previous = status;
        }
    }

    #[test]
    fn test_non_positive_allocation_is_rejected() {
        assert!(QuotaStatus::classify(10, 0, 80).is_err());
        assert!(QuotaStatus::classify(10, -5, 80).is_err());
    }

    #[test]
    fn test_escalation_direction() {
        assert!(QuotaStatus::is_escalation(
            QuotaStatus::Normal,
            QuotaStatus::Warning
        ));
        assert!(QuotaStatus::is_escalation(
            QuotaStatus::Normal,
            QuotaStatus::Exceeded
        ));
        assert!(!QuotaStatus::is_escalation(
            QuotaStatus::Critical,
            QuotaStatus::Normal
        ));
        assert!(!QuotaStatus::is_escalation(
            QuotaStatus::Warning,
            QuotaStatus::Warning
        ));
    }
}
