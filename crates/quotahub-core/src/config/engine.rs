//! Quota engine configuration.

use serde::{Deserialize, Serialize};

/// Quota lifecycle engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Timeout in milliseconds applied to every store call. An expired
    /// call fails with `StoreUnavailable` and may be retried by the caller.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
    /// Warning threshold percentage applied when an allocation does not
    /// specify one.
    #[serde(default = "default_warning_threshold")]
    pub default_warning_threshold_percent: i16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout(),
            default_warning_threshold_percent: default_warning_threshold(),
        }
    }
}

fn default_store_timeout() -> u64 {
    5000
}

fn default_warning_threshold() -> i16 {
    80
}
