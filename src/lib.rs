pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::dashboard::OutputFormat;
use crate::core::AssetGroup;
use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Dashboard {
        group: Option<AssetGroup>,
        format: OutputFormat,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("macrodash starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Dashboard { group, format } => cli::dashboard::run(&config, group, format).await,
    }
}
