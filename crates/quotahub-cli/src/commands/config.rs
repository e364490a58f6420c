//! Configuration inspection CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use quotahub_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration
    Show,
}

/// Execute config commands
pub async fn execute(args: &ConfigArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(env)?;
            // Never print credentials.
            config.database.url = mask_url(&config.database.url);
            output::print_item(&config, format);
            Ok(())
        }
    }
}

fn mask_url(url: &str) -> String {
    match url.find('@') {
        Some(at_pos) => format!("****@{}", &url[at_pos + 1..]),
        None => url.to_string(),
    }
}
