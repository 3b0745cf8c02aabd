//! Configuration for cuaderno
//!
//! Loaded from TOML:
//!
//! ```toml
//! data_dir = "/home/me/.local/share/cuaderno"
//! storage_key = "crush_book_v1"
//! access_code = "230713"
//!
//! [remote]
//! url = "https://my-notebook-default-rtdb.firebaseio.com"
//! timeout_secs = 30
//! ```
//!
//! Every field is optional. Without a `[remote]` table the remote mirror is
//! disabled; without `access_code` the gate is open.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::remote::HttpMirror;
use crate::store::{FileStore, DEFAULT_STORAGE_KEY};

/// Directory name used under the platform config and data dirs.
pub const APP_DIR: &str = "cuaderno";

pub const ENV_DATA_DIR: &str = "CUADERNO_DATA_DIR";
pub const ENV_REMOTE_URL: &str = "CUADERNO_REMOTE_URL";
pub const ENV_ACCESS_CODE: &str = "CUADERNO_ACCESS_CODE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuadernoConfig {
    /// Directory of the local store
    pub data_dir: Option<PathBuf>,
    /// Key (file stem) of the local document
    pub storage_key: String,
    /// Remote mirror settings
    pub remote: Option<RemoteConfig>,
    /// Shared secret required before the data is loaded
    pub access_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Database root, without the document path
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for CuadernoConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            remote: None,
            access_code: None,
        }
    }
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CuadernoConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// `<config dir>/cuaderno/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Load from `explicit`, else from the default path when it exists, else
    /// defaults; then apply environment overrides and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    tracing::debug!("Loading config from {:?}", path);
                    Self::load_file(&path)?
                }
                _ => Self::default(),
            },
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `CUADERNO_*` overrides. An empty remote url disables the mirror.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(url) = lookup(ENV_REMOTE_URL) {
            self.remote = if url.trim().is_empty() {
                None
            } else {
                let timeout_secs = self
                    .remote
                    .as_ref()
                    .map_or_else(default_timeout_secs, |r| r.timeout_secs);
                Some(RemoteConfig { url, timeout_secs })
            };
        }

        if let Some(code) = lookup(ENV_ACCESS_CODE) {
            self.access_code = Some(code);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_key must not be empty".to_string()));
        }

        if self.storage_key.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "storage_key must not contain path separators: {}",
                self.storage_key
            )));
        }

        if let Some(remote) = self.active_remote() {
            let url = remote.url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "remote url must be http(s): {}",
                    url
                )));
            }
            if remote.timeout_secs == 0 {
                return Err(ConfigError::Invalid(
                    "remote timeout_secs must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// The remote settings, when a non-blank url is configured.
    pub fn active_remote(&self) -> Option<&RemoteConfig> {
        self.remote.as_ref().filter(|r| !r.url.trim().is_empty())
    }

    /// Configured data dir, else `<data dir>/cuaderno`, else `./.cuaderno`.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR)))
    }

    pub fn open_store(&self) -> FileStore {
        FileStore::new(self.resolved_data_dir(), &self.storage_key)
    }

    /// The HTTP mirror, or `None` when no remote is configured.
    pub fn open_mirror(&self) -> Result<Option<HttpMirror>, ConfigError> {
        self.active_remote()
            .map(|remote| {
                HttpMirror::new(remote.url.trim(), Duration::from_secs(remote.timeout_secs))
                    .map_err(|e| ConfigError::Invalid(e.to_string()))
            })
            .transpose()
    }
}
