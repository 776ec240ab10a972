use crate::core::instrument::Instrument;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_FRED_BASE_URL: &str = "https://api.stlouisfed.org";
pub const FRED_API_KEY_ENV: &str = "FRED_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FredProviderConfig {
    #[serde(default = "default_fred_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
}

fn default_fred_base_url() -> String {
    DEFAULT_FRED_BASE_URL.to_string()
}

impl FredProviderConfig {
    /// API key from the config file, falling back to the `FRED_API_KEY` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(api_key_from_env)
    }

    /// Like [`Self::resolve_api_key`], with `fallback` consulted when the file has no key.
    pub fn resolve_api_key_with(&self, fallback: impl FnOnce() -> Option<String>) -> Option<String> {
        non_blank(self.api_key.clone()).or_else(|| non_blank(fallback()))
    }
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.filter(|key| !key.trim().is_empty())
}

fn api_key_from_env() -> Option<String> {
    std::env::var(FRED_API_KEY_ENV).ok()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
    pub fred: Option<FredProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            }),
            fred: Some(FredProviderConfig {
                base_url: DEFAULT_FRED_BASE_URL.to_string(),
                api_key: None,
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn yahoo_base_url(&self) -> &str {
        self.yahoo
            .as_ref()
            .map_or(DEFAULT_YAHOO_BASE_URL, |p| &p.base_url)
    }

    pub fn fred_base_url(&self) -> &str {
        self.fred
            .as_ref()
            .map_or(DEFAULT_FRED_BASE_URL, |p| &p.base_url)
    }

    pub fn fred_api_key(&self) -> Option<String> {
        self.fred_api_key_with(api_key_from_env)
    }

    pub fn fred_api_key_with(&self, fallback: impl FnOnce() -> Option<String>) -> Option<String> {
        match &self.fred {
            Some(fred) => fred.resolve_api_key_with(fallback),
            None => non_blank(fallback()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub instruments: Vec<Instrument>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "macrodash", "macrodash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!(
            instruments = config.instruments.len(),
            "Successfully loaded config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::{AssetClass, DataSource};

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
instruments:
  - name: "Gold"
    symbol: "GC=F"
    source: yahoo
    type: Metals
    spot_price: true
  - name: "USD/EUR"
    symbol: "EUR=X"
    source: yahoo
    type: Currency
  - name: "US 10Y Treasury Yield"
    symbol: "DGS10"
    source: fred
    type: Bond
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.instruments.len(), 3);
        assert_eq!(config.instruments[0].name, "Gold");
        assert_eq!(config.instruments[0].symbol, "GC=F");
        assert_eq!(config.instruments[0].source, DataSource::Yahoo);
        assert_eq!(config.instruments[0].asset_class, AssetClass::Metals);
        assert!(config.instruments[0].spot_price);
        assert!(!config.instruments[1].spot_price);
        assert_eq!(config.instruments[2].source, DataSource::Fred);

        assert_eq!(
            config.providers.yahoo_base_url(),
            "https://query1.finance.yahoo.com"
        );
        assert_eq!(config.providers.fred_base_url(), "https://api.stlouisfed.org");

        let yaml_str_with_providers = r#"
instruments: []
providers:
  yahoo:
    base_url: "http://example.com/yahoo"
  fred:
    api_key: "abc123"
"#;
        let config_with_providers: AppConfig =
            serde_yaml::from_str(yaml_str_with_providers).unwrap();
        assert_eq!(
            config_with_providers.providers.yahoo_base_url(),
            "http://example.com/yahoo"
        );
        assert_eq!(
            config_with_providers.providers.fred_base_url(),
            "https://api.stlouisfed.org"
        );
        assert_eq!(
            config_with_providers.providers.fred_api_key().as_deref(),
            Some("abc123")
        );
    }

    fn fred_config(api_key: Option<&str>) -> FredProviderConfig {
        FredProviderConfig {
            base_url: DEFAULT_FRED_BASE_URL.to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let fred = fred_config(Some("  "));
        assert!(fred.resolve_api_key_with(|| None).is_none());
        assert_eq!(
            fred.resolve_api_key_with(|| Some("from-env".to_string()))
                .as_deref(),
            Some("from-env")
        );
        assert!(fred.resolve_api_key_with(|| Some(" ".to_string())).is_none());
    }

    #[test]
    fn test_config_key_takes_precedence() {
        let fred = fred_config(Some("from-file"));
        assert_eq!(
            fred.resolve_api_key_with(|| Some("from-env".to_string()))
                .as_deref(),
            Some("from-file")
        );

        let providers = ProvidersConfig {
            yahoo: None,
            fred: None,
        };
        assert!(providers.fred_api_key_with(|| None).is_none());
        assert_eq!(
            providers
                .fred_api_key_with(|| Some("from-env".to_string()))
                .as_deref(),
            Some("from-env")
        );
    }

    #[test]
    fn test_missing_config_file() {
        let result = AppConfig::load_from_path("/nonexistent/macrodash/config.yaml");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
