//! Configuration loaded from `<home>/config.toml`.
//!
//! `<home>` is the `--home` flag, else `FEEDPACK_HOME`, else `$HOME/.feedpack`.
//! A missing config file means defaults. `FEEDPACK_NAMESPACE` and
//! `FEEDPACK_DATA_DIR` override the file.

use crate::core::error::FeedpackError;
use crate::core::naming::{DEFAULT_MAX_ID_LEN, DEFAULT_NAMESPACE, StoreNaming};
use crate::core::schemas;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "FEEDPACK_HOME";
pub const NAMESPACE_ENV: &str = "FEEDPACK_NAMESPACE";
pub const DATA_DIR_ENV: &str = "FEEDPACK_DATA_DIR";
pub const LOG_ENV: &str = "FEEDPACK_LOG";

const MIN_ID_LEN: usize = 8;
const MAX_ID_LEN: usize = 128;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub namespace: String,
    pub max_id_len: usize,
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            max_id_len: DEFAULT_MAX_ID_LEN,
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub log: LogConfig,
    #[serde(skip)]
    pub home: PathBuf,
}

impl Config {
    pub fn naming(&self) -> StoreNaming {
        StoreNaming::new(&self.storage.namespace, self.storage.max_id_len)
    }

    pub fn data_dir(&self) -> PathBuf {
        match &self.storage.data_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.home.join(dir),
            None => self.home.join(schemas::DATA_DIR_NAME),
        }
    }

    pub fn validate(&self) -> Result<(), FeedpackError> {
        let namespace_re = Regex::new(r"^[a-z0-9][a-z0-9_]*$").unwrap();
        if !namespace_re.is_match(&self.storage.namespace) {
            return Err(FeedpackError::ConfigError(format!(
                "namespace '{}' must be lowercase alphanumerics or '_'",
                self.storage.namespace
            )));
        }
        if !(MIN_ID_LEN..=MAX_ID_LEN).contains(&self.storage.max_id_len) {
            return Err(FeedpackError::ConfigError(format!(
                "max_id_len {} must be between {} and {}",
                self.storage.max_id_len, MIN_ID_LEN, MAX_ID_LEN
            )));
        }
        Ok(())
    }
}

pub fn resolve_home(explicit: Option<&Path>) -> Result<PathBuf, FeedpackError> {
    if let Some(home) = explicit {
        return Ok(home.to_path_buf());
    }
    if let Ok(home) = std::env::var(HOME_ENV) {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    let user_home = std::env::var("HOME").map_err(|_| {
        FeedpackError::ConfigError(format!("neither {} nor HOME is set", HOME_ENV))
    })?;
    Ok(PathBuf::from(user_home).join(".feedpack"))
}

/// Load `<home>/config.toml`, apply environment overrides and validate.
pub fn load_config(home: &Path) -> Result<Config, FeedpackError> {
    let config_path = home.join(schemas::CONFIG_FILE_NAME);
    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)?;
        toml::from_str::<Config>(&content)
            .map_err(|e| FeedpackError::ConfigError(format!("{}: {}", config_path.display(), e)))?
    } else {
        Config::default()
    };
    config.home = home.to_path_buf();

    if let Ok(namespace) = std::env::var(NAMESPACE_ENV) {
        if !namespace.is_empty() {
            config.storage.namespace = namespace;
        }
    }
    if let Ok(data_dir) = std::env::var(DATA_DIR_ENV) {
        if !data_dir.is_empty() {
            config.storage.data_dir = Some(PathBuf::from(data_dir));
        }
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempdir().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.storage.max_id_len, DEFAULT_MAX_ID_LEN);
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.home, tmp.path());
    }

    #[test]
    fn file_values_are_read_and_relative_data_dir_is_under_home() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[storage]\nmax_id_len = 16\ndata_dir = \"stores\"\n\n[log]\nlevel = \"debug\"\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.storage.max_id_len, 16);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.data_dir(), tmp.path().join("stores"));
    }

    #[test]
    fn invalid_namespace_is_rejected() {
        let config = Config {
            storage: StorageConfig {
                namespace: "Bad-NS".to_string(),
                ..StorageConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FeedpackError::ConfigError(_))
        ));
    }

    #[test]
    fn out_of_range_id_length_is_rejected() {
        let config = Config {
            storage: StorageConfig {
                max_id_len: 2,
                ..StorageConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("config.toml"), "[storage\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(FeedpackError::ConfigError(_))
        ));
    }
}
