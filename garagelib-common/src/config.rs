//! Configuration loading and root folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is not an error: the bot starts with defaults and logs
//! a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Bot version announced when nothing else is configured
pub const DEFAULT_BOT_VERSION: &str = "v1.1";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "garagelib.db";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "GARAGELIB_ROOT_FOLDER";

/// Contents of `config.toml`
///
/// Every key is optional; absent keys fall through to environment variables
/// or compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Bot API token issued by the transport
    pub bot_token: Option<String>,
    /// Chat that receives mirrored copies of every saved artifact
    pub storage_chat_id: Option<i64>,
    /// Version string announced to users on startup
    pub bot_version: Option<String>,
    /// Body of the version announcement
    pub release_notes: Option<String>,
    /// Folder holding the catalog database
    pub root_folder: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is not set
    pub log_level: Option<String>,
    /// Pause between two notification sends
    pub notify_delay_ms: Option<u64>,
    /// Long-poll timeout passed to the transport
    pub poll_timeout_secs: Option<u64>,
    /// Port for the local health endpoint (disabled when absent)
    pub health_port: Option<u16>,
    /// Idle time after which abandoned sessions are swept (disabled when absent)
    pub session_idle_expiry_secs: Option<u64>,
    /// Override for the Bot API base URL
    pub api_base_url: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the explicit config file, or the platform default one.
    ///
    /// A missing default file yields `TomlConfig::default()`. An explicit path
    /// that cannot be read or parsed is an error.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let config = Self::load(path)?;
            info!("Loaded config file: {}", path.display());
            return Ok(config);
        }

        match default_config_path() {
            Ok(path) => match Self::load(&path) {
                Ok(config) => {
                    info!("Loaded config file: {}", path.display());
                    Ok(config)
                }
                Err(e) => {
                    warn!("Ignoring unreadable config file: {}", e);
                    Ok(Self::default())
                }
            },
            Err(_) => {
                warn!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Serialize this config back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Encode TOML failed: {}", e)))
    }
}

/// Read the first non-blank value among several environment variables.
///
/// Names are checked in order, so the project-prefixed name should come first.
pub fn env_value(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Resolve the root folder holding the catalog database
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Some(path) = env_value(&[ROOT_FOLDER_ENV]) {
        return PathBuf::from(path);
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Create the root folder if missing and return the database path inside it
pub fn ensure_root_folder(root_folder: &Path) -> Result<PathBuf> {
    if !root_folder.exists() {
        std::fs::create_dir_all(root_folder)?;
        info!("Created root folder: {}", root_folder.display());
    }
    Ok(root_folder.join(DATABASE_FILE_NAME))
}

/// Get default configuration file path for the platform
pub fn default_config_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("garagelib").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/garagelib/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/garagelib (or /var/lib/garagelib for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("garagelib"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/garagelib"))
    } else {
        dirs::data_local_dir()
            .map(|d| d.join("garagelib"))
            .unwrap_or_else(|| PathBuf::from("./garagelib_data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_parses_to_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_missing_keys_empty() {
        let config: TomlConfig = toml::from_str(
            r#"
            bot_token = "123:abc"
            storage_chat_id = -1001234
            notify_delay_ms = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.storage_chat_id, Some(-1001234));
        assert_eq!(config.notify_delay_ms, Some(30));
        assert!(config.bot_version.is_none());
        assert!(config.health_port.is_none());
    }

    #[test]
    fn test_cli_root_folder_wins_over_toml() {
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &config);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_default_root_folder_is_named_after_project() {
        let root = default_root_folder();
        assert!(root.to_string_lossy().contains("garagelib"));
    }

    #[test]
    fn test_round_trip_through_toml_string() {
        let config = TomlConfig {
            bot_version: Some("v2.0".to_string()),
            health_port: Some(8080),
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        let parsed: TomlConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
