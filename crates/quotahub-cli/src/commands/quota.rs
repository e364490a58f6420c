//! Quota management CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use dialoguer::Confirm;
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use quotahub_core::error::AppError;
use quotahub_core::types::pagination::PageRequest;
use quotahub_database::repositories::PgQuotaRepository;
use quotahub_entity::quota::{AllocateQuota, EntityKind, QuotaFilter, QuotaRecord, QuotaStatus};
use quotahub_service::alert::AlertDispatcher;
use quotahub_service::quota::QuotaService;

/// Arguments for quota commands
#[derive(Debug, Args)]
pub struct QuotaArgs {
    /// Quota subcommand
    #[command(subcommand)]
    pub command: QuotaCommand,
}

/// Quota subcommands
#[derive(Debug, Subcommand)]
pub enum QuotaCommand {
    /// List quota records, most utilized first
    List {
        /// Restrict to one entity kind (user, department, organization)
        #[arg(long)]
        entity_kind: Option<String>,
        /// Restrict to one status (normal, warning, critical, exceeded)
        #[arg(long)]
        status: Option<String>,
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Items per page
        #[arg(long, default_value_t = 25)]
        page_size: u64,
    },
    /// Show the dashboard summary rollup
    Summary {
        /// Restrict to one entity kind
        #[arg(long)]
        entity_kind: Option<String>,
        /// Restrict to one status
        #[arg(long)]
        status: Option<String>,
    },
    /// Allocate a new quota for an entity
    Allocate {
        /// Entity kind (user, department, organization)
        #[arg(long)]
        entity_kind: String,
        /// Entity ID
        #[arg(long)]
        entity_id: Uuid,
        /// Entity display name
        #[arg(long)]
        name: String,
        /// Allocated units
        #[arg(long)]
        units: i64,
        /// Warning threshold percent (1-100, defaults to the engine setting)
        #[arg(long)]
        warning_threshold: Option<i16>,
    },
    /// Change a quota's allocation
    Resize {
        /// Quota record ID
        id: Uuid,
        /// New allocated units
        #[arg(long)]
        units: i64,
    },
    /// Grow a quota's allocation
    Extend {
        /// Quota record ID
        id: Uuid,
        /// Additional units
        #[arg(long)]
        units: i64,
    },
    /// Record an absolute usage value
    Usage {
        /// Quota record ID
        id: Uuid,
        /// Used units
        #[arg(long)]
        units: i64,
    },
    /// Reset a quota's usage counter to zero
    Reset {
        /// Quota record ID
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Delete a quota record
    Delete {
        /// Quota record ID
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Quota display row
#[derive(Debug, Serialize, Tabled)]
struct QuotaRow {
    /// Record ID
    id: String,
    /// Entity name
    entity: String,
    /// Entity kind
    kind: String,
    /// Allocated units
    allocated: i64,
    /// Used units
    used: i64,
    /// Utilization percentage
    utilization: String,
    /// Warning threshold
    threshold: String,
    /// Classified status
    status: String,
}

impl From<&QuotaRecord> for QuotaRow {
    fn from(record: &QuotaRecord) -> Self {
        Self {
            id: record.id.to_string(),
            entity: record.entity_name.clone(),
            kind: record.entity_kind.to_string(),
            allocated: record.allocated_units,
            used: record.used_units,
            utilization: format!("{:.1}%", record.utilization_percent()),
            threshold: format!("{}%", record.warning_threshold_percent),
            status: record.status.to_string(),
        }
    }
}

/// Execute quota commands
pub async fn execute(args: &QuotaArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let store = Arc::new(PgQuotaRepository::new(pool));
    let alerts = AlertDispatcher::from_config(&config.alert)?;
    let service = QuotaService::new(store, alerts, &config.engine);

    match &args.command {
        QuotaCommand::List {
            entity_kind,
            status,
            page,
            page_size,
        } => {
            let filter = parse_filter(entity_kind.as_deref(), status.as_deref())?;
            let response = service
                .list(filter, &PageRequest::new(*page, *page_size))
                .await?;

            let rows: Vec<QuotaRow> = response.items.iter().map(QuotaRow::from).collect();
            output::print_list(&rows, format);
            if response.total_pages > 1 {
                println!(
                    "Page {} of {} ({} records)",
                    response.page, response.total_pages, response.total_items
                );
            }
            Ok(())
        }
        QuotaCommand::Summary {
            entity_kind,
            status,
        } => {
            let filter = parse_filter(entity_kind.as_deref(), status.as_deref())?;
            let summary = service.summary(filter).await?;
            output::print_item(&summary, format);
            Ok(())
        }
        QuotaCommand::Allocate {
            entity_kind,
            entity_id,
            name,
            units,
            warning_threshold,
        } => {
            let record = service
                .allocate(AllocateQuota {
                    entity_kind: entity_kind.parse::<EntityKind>()?,
                    entity_id: *entity_id,
                    entity_name: name.clone(),
                    allocated_units: *units,
                    warning_threshold_percent: *warning_threshold,
                })
                .await?;
            output::print_success(&format!(
                "Allocated quota {} for {} '{}' ({} units)",
                record.id, record.entity_kind, record.entity_name, record.allocated_units
            ));
            Ok(())
        }
        QuotaCommand::Resize { id, units } => {
            let record = service.resize(*id, *units).await?;
            output::print_success(&format!(
                "Resized quota {} to {} units (status: {})",
                record.id, record.allocated_units, record.status
            ));
            Ok(())
        }
        QuotaCommand::Extend { id, units } => {
            let record = service.extend(*id, *units).await?;
            output::print_success(&format!(
                "Extended quota {} to {} units (status: {})",
                record.id, record.allocated_units, record.status
            ));
            Ok(())
        }
        QuotaCommand::Usage { id, units } => {
            let record = service.record_usage(*id, *units).await?;
            output::print_success(&format!(
                "Recorded {} used units on quota {} (status: {})",
                record.used_units, record.id, record.status
            ));
            Ok(())
        }
        QuotaCommand::Reset { id, yes } => {
            // The reset only zeroes the accounting number; no stored data
            // is deleted.
            if !yes && !confirm(&format!("Reset usage counter of quota {id} to zero?"))? {
                output::print_warning("Aborted");
                return Ok(());
            }
            let record = service.reset(*id).await?;
            output::print_success(&format!("Reset quota {} (status: {})", record.id, record.status));
            Ok(())
        }
        QuotaCommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete quota record {id}?"))? {
                output::print_warning("Aborted");
                return Ok(());
            }
            service.delete(*id).await?;
            output::print_success(&format!("Deleted quota {id}"));
            Ok(())
        }
    }
}

fn parse_filter(entity_kind: Option<&str>, status: Option<&str>) -> Result<QuotaFilter, AppError> {
    Ok(QuotaFilter {
        entity_kind: entity_kind.map(str::parse::<EntityKind>).transpose()?,
        status: status.map(str::parse::<QuotaStatus>).transpose()?,
    })
}

fn confirm(prompt: &str) -> Result<bool, AppError> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Confirmation prompt failed: {e}")))
}
