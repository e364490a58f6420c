//! Alert dispatch configuration.

use serde::{Deserialize, Serialize};

/// Alert dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Whether escalation alerts are dispatched at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Notification channel: `"log"` is the only built-in channel; other
    /// values are reserved for custom `Notifier` implementations wired in
    /// by the embedding application.
    #[serde(default = "default_channel")]
    pub channel: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: default_channel(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_channel() -> String {
    "log".to_string()
}
