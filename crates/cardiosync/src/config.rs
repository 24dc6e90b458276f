//! Configuration management for cardiosync.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::remote::drive::{DEFAULT_API_BASE, DEFAULT_UPLOAD_BASE};
use crate::remote::{DirectoryStore, DriveStore, RemoteStore};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "cardiosync";

/// Default dataset file name, used both locally and remotely.
const DATASET_FILE_NAME: &str = "falla_cardiaca_datos.csv";

/// Default directory-store folder inside the data directory.
const REMOTE_DIR_NAME: &str = "remote";

/// Environment variable prefix.
const ENV_PREFIX: &str = "CARDIOSYNC_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CARDIOSYNC_`, `__` between sections)
/// 2. TOML config file at `~/.config/cardiosync/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset configuration.
    pub dataset: DatasetConfig,
    /// Remote store configuration.
    pub remote: RemoteConfig,
    /// Operator verification configuration.
    pub auth: AuthConfig,
}

/// Dataset-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Logical file name. Names the local file and the remote object.
    pub file_name: String,
    /// Directory holding the local file.
    /// Defaults to `~/.local/share/cardiosync`
    pub local_dir: Option<PathBuf>,
}

/// Which remote store implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteBackend {
    /// A local or shared directory.
    #[default]
    Directory,
    /// Google Drive.
    Drive,
}

impl std::fmt::Display for RemoteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::Drive => write!(f, "drive"),
        }
    }
}

/// Remote store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Store implementation.
    pub backend: RemoteBackend,
    /// Root of the directory store.
    /// Defaults to `~/.local/share/cardiosync/remote`
    pub directory: Option<PathBuf>,
    /// Google Drive settings.
    pub drive: DriveConfig,
}

/// Google Drive settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// OAuth bearer token with Drive file scope.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Metadata API base URL.
    pub api_base: String,
    /// Media upload API base URL.
    pub upload_base: String,
}

/// Operator verification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Require operator verification before submitting.
    pub required: bool,
    /// Operator name.
    pub operator: Option<String>,
    /// BLAKE3 hex digest of the operator password.
    pub password_digest: Option<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            file_name: DATASET_FILE_NAME.to_string(),
            local_dir: None, // Will be resolved to default at runtime
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            required: true,
            operator: None,
            password_digest: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `CARDIOSYNC_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let name = &self.dataset.file_name;
        if name.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "dataset.file_name must not be empty".to_string(),
            });
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(Error::ConfigValidation {
                message: format!("dataset.file_name must be a bare file name: {name}"),
            });
        }

        if let Some(digest) = &self.auth.password_digest {
            if blake3::Hash::from_hex(digest).is_err() {
                return Err(Error::ConfigValidation {
                    message: "auth.password_digest must be a 64-character hex digest"
                        .to_string(),
                });
            }
        }

        if self.remote.backend == RemoteBackend::Drive {
            if self.remote.drive.api_base.is_empty() || self.remote.drive.upload_base.is_empty() {
                return Err(Error::ConfigValidation {
                    message: "remote.drive endpoints must not be empty".to_string(),
                });
            }
            if self.remote.drive.access_token.is_none() {
                return Err(Error::missing_credential("remote.drive.access_token"));
            }
        }

        Ok(())
    }

    /// Get the local dataset path, resolving defaults if not set.
    #[must_use]
    pub fn dataset_path(&self) -> PathBuf {
        self.dataset
            .local_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
            .join(&self.dataset.file_name)
    }

    /// Get the directory store root, resolving defaults if not set.
    #[must_use]
    pub fn remote_directory(&self) -> PathBuf {
        self.remote
            .directory
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(REMOTE_DIR_NAME))
    }

    /// Build the configured remote store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend needs a credential that is not set.
    pub fn remote_store(&self) -> Result<Box<dyn RemoteStore>> {
        match self.remote.backend {
            RemoteBackend::Directory => Ok(Box::new(DirectoryStore::new(self.remote_directory()))),
            RemoteBackend::Drive => {
                let drive = &self.remote.drive;
                let token = drive
                    .access_token
                    .clone()
                    .ok_or_else(|| Error::missing_credential("remote.drive.access_token"))?;
                Ok(Box::new(DriveStore::with_endpoints(
                    token,
                    drive.api_base.clone(),
                    drive.upload_base.clone(),
                )))
            }
        }
    }
}
