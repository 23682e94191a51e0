pub mod connection;
pub mod rules;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use self::connection::{Connection, ConnectionOverrides};
use self::rules::RuleRegistry;
use crate::error::ConfigError;

const CONFIG_DIR: &str = "transmissionscripts";
const CONFIG_FILE: &str = "config.json";

/// Everything the tools need to know, built once at startup.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: Connection,
    pub rules: RuleRegistry,
    pub cleanup: CleanupSettings,
}

/// Error messages that mark a torrent as safe to clean up.
///
/// Messages are compared in lowercase.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupSettings {
    /// Exact tracker responses meaning the tracker forgot the torrent.
    pub remote_messages: Vec<String>,

    /// Substrings of local errors meaning the data went away.
    pub local_errors: Vec<String>,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        CleanupSettings {
            // BTN / Gazelle
            remote_messages: vec!["unregistered torrent".to_string()],
            local_errors: vec!["no data found".to_string()],
        }
    }
}

/// The per-user config file location, `~/.config/transmissionscripts/config.json` on Linux.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
        .ok_or(ConfigError::NoConfigDir)
}

impl Config {
    /// Reads a config file. A file that doesn't exist is not an error.
    pub fn load(path: &Path) -> Result<Option<Config>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        info!("Loaded config file: {}", path.display());
        Ok(Some(config))
    }

    /// Writes this config to `path`, creating parent directories.
    pub fn write(&self, path: &Path, overwrite: bool) -> Result<(), ConfigError> {
        if path.exists() && !overwrite {
            return Err(ConfigError::AlreadyExists(path.to_owned()));
        }
        let io_err = |source| ConfigError::Io {
            path: path.to_owned(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, contents).map_err(io_err)?;
        info!("Wrote config file: {}", path.display());
        Ok(())
    }
}

/// How the config should be assembled at startup.
#[derive(Clone, Debug, Default)]
pub struct ConfigOptions {
    /// Use this file instead of [`default_path`].
    pub path: Option<PathBuf>,
    /// Write the built-in defaults out before loading.
    pub generate: bool,
    /// Allow `generate` to replace an existing file.
    pub force: bool,
    pub overrides: ConnectionOverrides,
}

/// Builds the effective config: command-line values beat the config
/// file, which beats the built-in defaults.
pub fn configure(options: &ConfigOptions) -> Result<Config, ConfigError> {
    let path = match &options.path {
        Some(path) => path.clone(),
        None => default_path()?,
    };
    if options.generate {
        Config::default().write(&path, options.force)?;
    }
    let mut config = Config::load(&path)?.unwrap_or_default();
    config.client = config.client.with_overrides(&options.overrides);
    Ok(config)
}
