use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_USER_ID: &str = "default";

const ENV_DATABASE_PATH: &str = "MEALDIARY_DATABASE_PATH";
const ENV_USER_ID: &str = "MEALDIARY_USER_ID";
const ENV_PAGE_SIZE: &str = "MEALDIARY_PAGE_SIZE";

/// Where a setting came from. Later layers win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment => "environment",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    fn default_value(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
        }
    }

    /// Takes `candidate` if present, recording `source`.
    fn overlay(&mut self, candidate: Option<T>, source: ConfigSource) {
        if let Some(value) = candidate {
            self.value = value;
            self.source = source;
        }
    }
}

/// Settings of the `mealdiary` CLI, each tagged with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub database_path: ConfigValue<PathBuf>,
    /// Owner of the diary that commands read and write.
    pub user_id: ConfigValue<String>,
    /// Page size of favorites and set listings.
    pub page_size: ConfigValue<usize>,
    pub legacy_union_merge: ConfigValue<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// On-disk YAML layout. Every key is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct FileLayer {
    database_path: Option<PathBuf>,
    user_id: Option<String>,
    page_size: Option<usize>,
    legacy_union_merge: Option<bool>,
}

impl FileLayer {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        let mut layer: FileLayer = serde_yaml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?;

        if let (Some(db_path), Some(dir)) = (&layer.database_path, path.parent()) {
            if db_path.is_relative() {
                layer.database_path = Some(dir.join(db_path));
            }
        }
        Ok(layer)
    }
}

impl Config {
    /// Defaults, then the config file (if it exists), then environment
    /// variables.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    fn load_with_env<E>(config_path: Option<PathBuf>, env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config = Self::defaults();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let file = FileLayer::read(&path)?;
            config.database_path.overlay(file.database_path, ConfigSource::File);
            config.user_id.overlay(file.user_id, ConfigSource::File);
            config.page_size.overlay(file.page_size, ConfigSource::File);
            config
                .legacy_union_merge
                .overlay(file.legacy_union_merge, ConfigSource::File);
            config.config_file = Some(path);
        }

        config
            .database_path
            .overlay(env(ENV_DATABASE_PATH).map(PathBuf::from), ConfigSource::Environment);
        config
            .user_id
            .overlay(env(ENV_USER_ID), ConfigSource::Environment);
        let page_size = env(ENV_PAGE_SIZE)
            .map(|raw| {
                raw.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_PAGE_SIZE,
                    value: raw.clone(),
                })
            })
            .transpose()?;
        config.page_size.overlay(page_size, ConfigSource::Environment);

        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Self {
        Self {
            database_path: ConfigValue::default_value(Self::default_data_dir().join("mealdiary.db")),
            user_id: ConfigValue::default_value(DEFAULT_USER_ID.to_string()),
            page_size: ConfigValue::default_value(DEFAULT_PAGE_SIZE),
            legacy_union_merge: ConfigValue::default_value(false),
            config_file: None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size.value == 0 {
            return Err(ConfigError::InvalidValue {
                key: "page_size",
                value: "0".to_string(),
            });
        }
        if self.user_id.value.is_empty() || self.user_id.value.contains('/') {
            return Err(ConfigError::InvalidValue {
                key: "user_id",
                value: self.user_id.value.clone(),
            });
        }
        Ok(())
    }

    /// `dirs::config_dir()/mealdiary`, e.g. `~/.config/mealdiary` on Linux.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mealdiary")
    }

    /// `dirs::data_dir()/mealdiary`, e.g. `~/.local/share/mealdiary` on Linux.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mealdiary")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
