use crate::geometry::MARGIN_DP;
use crate::paths;
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine default config directory")]
    NoConfigDir,
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The path the config file was loaded from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Gap between the message and each screen edge, in logical units
    pub margin_dp: i32,
    /// How long to wait before checking again for a foreground surface, in milliseconds
    pub init_retry_delay_ms: u64,
    /// Script evaluated in the content to measure the page
    pub page_meta_data_script: String,
    /// Name the bridge object is exposed under inside the content
    pub bridge_name: String,
    /// Enables remote debugging of rendered content
    pub content_debugging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            margin_dp: MARGIN_DP,
            init_retry_delay_ms: 200,
            page_meta_data_script: "getPageMetaData()".to_string(),
            bridge_name: "InAppBridge".to_string(),
            content_debugging: false,
        }
    }
}

impl Config {
    pub fn default_config_path() -> Option<PathBuf> {
        paths::default_config_path()
    }

    /// Loads the config at `config_path`, or the default location. A missing
    /// file is created with defaults. With `save`, missing fields are written back.
    pub fn load(config_path: Option<&Path>, save: bool) -> ConfigResult<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path().ok_or(ConfigError::NoConfigDir)?,
        };

        if !path.exists() {
            Config::default().save_to_file(&path)?;
            trace!("Created default config file at: {}", path.display());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let mut config: Config =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;

        config.config_path = Some(path.clone());

        if save {
            if let Err(e) = config.save_to_file(&path) {
                warn!("Failed to update config file with missing fields: {e}");
            }
        }

        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let header = "# InApp Configuration File\n# Display settings for in-app messages.\n\n";
        let serialized_config = serde_yaml::to_string(self)?;
        fs::write(path, format!("{header}{serialized_config}")).map_err(write_err)?;
        Ok(())
    }

    pub fn init_retry_delay(&self) -> Duration {
        Duration::from_millis(self.init_retry_delay_ms)
    }
}
