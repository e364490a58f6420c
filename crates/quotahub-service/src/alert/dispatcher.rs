//! Alert dispatcher — decides when a status transition becomes a
//! notification.
//!
//! Alerting is edge-triggered on escalation: a transition to any strictly
//! more severe status fires exactly one notification, regardless of how
//! many buckets were skipped. De-escalation never alerts.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use quotahub_core::config::alert::AlertConfig;
use quotahub_core::result::AppResult;
use quotahub_entity::quota::{EntityKind, QuotaRecord, QuotaStatus};

/// Notification payload for an escalated quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaAlert {
    /// The quota record that escalated.
    pub record_id: Uuid,
    /// Kind of the owning entity.
    pub entity_kind: EntityKind,
    /// Identifier of the owning entity.
    pub entity_id: Uuid,
    /// Display name of the owning entity.
    pub entity_name: String,
    /// Status before the mutation.
    pub previous_status: QuotaStatus,
    /// Status after the mutation.
    pub new_status: QuotaStatus,
    /// Utilization rate after the mutation.
    pub utilization_percent: f64,
}

/// Delivery channel for quota alerts.
///
/// Implementations must deliver at least once and tolerate duplicate
/// delivery; the dispatcher never deduplicates.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Deliver one alert.
    async fn notify(&self, alert: &QuotaAlert) -> AppResult<()>;
}

/// Notifier that emits a structured tracing event. The default channel;
/// email/webhook channels are wired in by the embedding application.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, alert: &QuotaAlert) -> AppResult<()> {
        info!(
            target: "quota_alert",
            record_id = %alert.record_id,
            entity_kind = %alert.entity_kind,
            entity_id = %alert.entity_id,
            entity_name = %alert.entity_name,
            previous_status = %alert.previous_status,
            new_status = %alert.new_status,
            utilization_percent = alert.utilization_percent,
            "Quota escalated"
        );
        Ok(())
    }
}

/// Reacts to status-transition events emitted by the lifecycle manager.
#[derive(Clone)]
pub struct AlertDispatcher {
    /// Delivery channel.
    notifier: Arc<dyn Notifier>,
    /// Whether alerting is enabled at all.
    enabled: bool,
}

impl AlertDispatcher {
    /// Create a dispatcher with a custom notifier.
    pub fn new(config: &AlertConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            enabled: config.enabled,
        }
    }

    /// Create a dispatcher with the built-in log notifier.
    pub fn with_log_notifier(config: &AlertConfig) -> Self {
        Self::new(config, Arc::new(LogNotifier))
    }

    /// Create a dispatcher for the channel named in the configuration.
    ///
    /// Only `"log"` is built in; anything else is a configuration error
    /// unless the embedding application wires a custom notifier via
    /// [`AlertDispatcher::new`].
    pub fn from_config(config: &AlertConfig) -> AppResult<Self> {
        match config.channel.as_str() {
            "log" => Ok(Self::with_log_notifier(config)),
            other => Err(quotahub_core::error::AppError::configuration(format!(
                "Unknown alert channel '{other}'; only 'log' is built in"
            ))),
        }
    }

    /// Handle a status transition.
    ///
    /// Notifier failures are logged and swallowed; a broken alert channel
    /// must never fail the mutation that triggered it.
    pub async fn on_transition(
        &self,
        record: &QuotaRecord,
        previous_status: QuotaStatus,
        new_status: QuotaStatus,
    ) {
        if !self.enabled || !QuotaStatus::is_escalation(previous_status, new_status) {
            return;
        }

        let alert = QuotaAlert {
            record_id: record.id,
            entity_kind: record.entity_kind,
            entity_id: record.entity_id,
            entity_name: record.entity_name.clone(),
            previous_status,
            new_status,
            utilization_percent: record.utilization_percent(),
        };

        if let Err(e) = self.notifier.notify(&alert).await {
            warn!(
                record_id = %alert.record_id,
                error = %e,
                "Failed to deliver quota alert"
            );
        }
    }
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
