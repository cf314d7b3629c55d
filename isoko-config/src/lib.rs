//! Typed settings for the isoko binaries.
//!
//! Sources are layered: built-in defaults, then a TOML file, then
//! `ISOKO__SECTION__KEY` environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use isoko_core::CurrencyFormat;
use serde::{Deserialize, Serialize};

/// File read when no explicit path is given. Missing is fine.
pub const DEFAULT_CONFIG_PATH: &str = "config/isoko.toml";
const ENV_PREFIX: &str = "ISOKO";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IsokoConfig {
    pub database: DatabaseConfig,
    pub business: BusinessConfig,
    pub currency: CurrencyConfig,
    pub dashboard: DashboardConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessConfig {
    /// Name of the seeded business record every command operates on.
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub code: String,
    pub locale: String,
    pub decimals: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub trend_points: usize,
    pub top_vehicles: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl IsokoConfig {
    /// Load settings, reading `path` if given (it must exist) or
    /// [`DEFAULT_CONFIG_PATH`] if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::with_name(DEFAULT_CONFIG_PATH)
                .format(FileFormat::Toml)
                .required(false),
        };
        let settings = Config::builder()
            .set_default("database.path", "data/isoko.db")?
            .set_default("business.name", "Isoko Trading")?
            .set_default("currency.code", "RWF")?
            .set_default("currency.locale", "en-RW")?
            .set_default("currency.decimals", 0)?
            .set_default("dashboard.trend_points", 30)?
            .set_default("dashboard.top_vehicles", 8)?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .context("failed to assemble configuration sources")?;
        settings
            .try_deserialize()
            .context("configuration does not match the expected schema")
    }

    pub fn currency_format(&self) -> CurrencyFormat {
        CurrencyFormat::new(
            self.currency.code.clone(),
            self.currency.locale.clone(),
            self.currency.decimals,
        )
    }

    /// Effective configuration rendered as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to render configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_without_file_or_env() {
        let config = IsokoConfig::load_with_env(None, Some(HashMap::new())).unwrap();
        assert_eq!(config.database.path, PathBuf::from("data/isoko.db"));
        assert_eq!(config.business.name, "Isoko Trading");
        assert_eq!(config.currency_format(), CurrencyFormat::default());
        assert_eq!(config.dashboard.trend_points, 30);
        assert_eq!(config.dashboard.top_vehicles, 8);
        assert_eq!(config.log.level, "info");
        assert!(!config.log.json);
        assert!(config.log.directory.is_none());
    }

    #[test]
    fn file_then_environment_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("isoko.toml");
        fs::write(
            &path,
            r#"
[business]
name = "Rubavu Depot"

[currency]
locale = "fr-RW"

[dashboard]
trend_points = 14
"#,
        )
        .unwrap();
        let env = HashMap::from([
            ("ISOKO__DASHBOARD__TOP_VEHICLES".to_string(), "3".to_string()),
            ("ISOKO__LOG__JSON".to_string(), "true".to_string()),
        ]);
        let config = IsokoConfig::load_with_env(Some(&path), Some(env)).unwrap();
        assert_eq!(config.business.name, "Rubavu Depot");
        assert_eq!(config.currency.locale, "fr-RW");
        assert_eq!(config.currency.code, "RWF");
        assert_eq!(config.dashboard.trend_points, 14);
        assert_eq!(config.dashboard.top_vehicles, 3);
        assert!(config.log.json);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(IsokoConfig::load_with_env(Some(&missing), Some(HashMap::new())).is_err());
    }

    #[test]
    fn rendered_toml_loads_back() {
        let dir = tempdir().unwrap();
        let config = IsokoConfig::load_with_env(None, Some(HashMap::new())).unwrap();
        let path = dir.path().join("effective.toml");
        fs::write(&path, config.to_toml().unwrap()).unwrap();
        let reloaded = IsokoConfig::load_with_env(Some(&path), Some(HashMap::new())).unwrap();
        assert_eq!(reloaded, config);
    }
}
