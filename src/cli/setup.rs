use crate::core::DataSource;
use crate::core::config::{AppConfig, FRED_API_KEY_ENV};
use anyhow::{Context, Result};
use std::path::Path;

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");

/// Creates a default configuration file with example content at the default location
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(path)
}

/// Creates a default configuration file with example content at the specified path
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    println!("Created configuration at {}", path.display());

    let config: AppConfig =
        serde_yaml::from_str(EXAMPLE_CONFIG).context("Failed to parse example config")?;
    if let Some(notice) = fred_key_notice(&config, config.providers.fred_api_key()) {
        println!("{notice}");
    }
    Ok(())
}

/// Reminder shown when FRED instruments are configured but no API key is available.
fn fred_key_notice(config: &AppConfig, api_key: Option<String>) -> Option<String> {
    let fred_instruments = config
        .instruments
        .iter()
        .filter(|i| i.source == DataSource::Fred)
        .count();
    if fred_instruments == 0 || api_key.is_some() {
        return None;
    }
    Some(format!(
        "{fred_instruments} FRED series will show as unavailable until `providers.fred.api_key` \
         or the {FRED_API_KEY_ENV} environment variable is set."
    ))
}
