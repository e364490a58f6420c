//! CLI command definitions and dispatch.

pub mod config;
pub mod db;
pub mod migrate;
pub mod quota;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use quotahub_core::error::AppError;

/// QuotaHub — storage and resource quota administration
#[derive(Debug, Parser)]
#[command(name = "quotahub", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (selects config/<env>.toml overlay)
    #[arg(short, long, default_value = "default")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Quota record management
    Quota(quota::QuotaArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Database connectivity checks
    Db(db::DbArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Quota(args) => quota::execute(args, &self.env, self.format).await,
            Commands::Migrate(args) => migrate::execute(args, &self.env, self.format).await,
            Commands::Db(args) => db::execute(args, &self.env).await,
            Commands::Config(args) => config::execute(args, &self.env, self.format).await,
        }
    }
}

/// Helper: load configuration for the given environment
pub fn load_config(env: &str) -> Result<quotahub_core::config::AppConfig, AppError> {
    quotahub_core::config::AppConfig::load(env)
}

/// Helper: create database pool from config
pub async fn create_db_pool(
    config: &quotahub_core::config::AppConfig,
) -> Result<sqlx::PgPool, AppError> {
    let pool = quotahub_database::connection::DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}
