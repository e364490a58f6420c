//! Database connectivity CLI commands.

use clap::{Args, Subcommand};

use crate::output;
use quotahub_core::error::AppError;
use quotahub_database::connection::DatabasePool;

/// Arguments for database commands
#[derive(Debug, Args)]
pub struct DbArgs {
    /// Database subcommand
    #[command(subcommand)]
    pub command: DbCommand,
}

/// Database subcommands
#[derive(Debug, Subcommand)]
pub enum DbCommand {
    /// Check database connectivity
    Ping,
}

/// Execute database commands
pub async fn execute(args: &DbArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;

    match &args.command {
        DbCommand::Ping => {
            let pool = DatabasePool::connect(&config.database).await?;
            let healthy = pool.health_check().await?;
            pool.close().await;

            if healthy {
                output::print_success("Database is reachable");
                Ok(())
            } else {
                output::print_warning("Database responded with an unexpected result");
                Err(AppError::database("Health check returned an unexpected result"))
            }
        }
    }
}
