//! Database migration CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use quotahub_core::error::AppError;
use quotahub_database::migration::MigrationStatus;

/// Arguments for migration commands
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply all pending migrations
    Run,
    /// Show applied and pending migrations
    Status,
}

/// Table row for migration status output
#[derive(Debug, Serialize, Tabled)]
pub struct MigrationRow {
    #[tabled(rename = "Version")]
    pub version: i64,
    #[tabled(rename = "Description")]
    pub description: String,
    #[tabled(rename = "State")]
    pub state: String,
}

impl From<&MigrationStatus> for MigrationRow {
    fn from(status: &MigrationStatus) -> Self {
        Self {
            version: status.version,
            description: status.description.clone(),
            state: if status.applied {
                "applied".to_string()
            } else {
                "pending".to_string()
            },
        }
    }
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;

    match &args.command {
        MigrateCommand::Run => {
            quotahub_database::migration::run_migrations(&pool).await?;
            output::print_success("Migrations applied");
            Ok(())
        }
        MigrateCommand::Status => {
            let statuses = quotahub_database::migration::migration_status(&pool).await?;
            let pending = statuses.iter().filter(|s| !s.applied).count();

            let rows: Vec<MigrationRow> = statuses.iter().map(MigrationRow::from).collect();
            output::print_list(&rows, format);

            if pending > 0 {
                output::print_warning(&format!("{pending} migration(s) pending"));
            } else {
                output::print_success("All migrations applied");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_row_marks_pending_state() {
        let status = MigrationStatus {
            version: 1,
            description: "create quota records".to_string(),
            applied: false,
        };
        let row = MigrationRow::from(&status);
        assert_eq!(row.version, 1);
        assert_eq!(row.state, "pending");
    }

    #[test]
    fn test_migration_row_marks_applied_state() {
        let status = MigrationStatus {
            version: 1,
            description: "create quota records".to_string(),
            applied: true,
        };
        assert_eq!(MigrationRow::from(&status).state, "applied");
    }
}
