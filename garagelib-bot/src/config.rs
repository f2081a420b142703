//! Runtime settings for garagelib-bot
//!
//! Resolution priority, highest first: command line (with the prefixed
//! environment variable as clap fallback), legacy environment variable,
//! TOML config, compiled default.

use clap::Parser;
use garagelib_common::config::{env_value, TomlConfig, DEFAULT_BOT_VERSION};
use garagelib_common::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::transport::ChatId;
use crate::services::DEFAULT_NOTIFY_DELAY;

pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Command-line arguments for garagelib-bot
#[derive(Parser, Debug, Default)]
#[command(name = "garagelib-bot")]
#[command(about = "GarageLib chat bot: track uploads, artist cards and the common playlist")]
#[command(version)]
pub struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "GARAGELIB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bot API token
    #[arg(long, env = "GARAGELIB_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Chat that receives mirrored copies of saved tracks
    #[arg(long, env = "GARAGELIB_STORAGE_CHAT_ID", allow_hyphen_values = true)]
    pub storage_chat_id: Option<ChatId>,

    /// Version string shown to users and announced on change
    #[arg(long, env = "GARAGELIB_BOT_VERSION")]
    pub bot_version: Option<String>,

    /// Folder holding the catalog database
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// Default tracing filter when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,

    /// Serve GET /health on this port
    #[arg(long, env = "GARAGELIB_HEALTH_PORT")]
    pub health_port: Option<u16>,
}

/// Fully resolved settings
#[derive(Clone)]
pub struct BotSettings {
    pub bot_token: String,
    pub storage_chat_id: Option<ChatId>,
    pub bot_version: String,
    pub release_notes: Option<String>,
    pub log_level: String,
    pub notify_delay: Duration,
    pub poll_timeout_secs: u64,
    pub health_port: Option<u16>,
    /// Idle sessions are dropped after this long; unset keeps them forever
    pub session_idle_expiry: Option<Duration>,
    pub api_base_url: Option<String>,
}

impl fmt::Debug for BotSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotSettings")
            .field("bot_token", &"<redacted>")
            .field("storage_chat_id", &self.storage_chat_id)
            .field("bot_version", &self.bot_version)
            .field("log_level", &self.log_level)
            .field("notify_delay", &self.notify_delay)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("health_port", &self.health_port)
            .field("session_idle_expiry", &self.session_idle_expiry)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BotSettings {
    pub fn resolve(args: &Args, toml_config: &TomlConfig) -> Result<Self> {
        let bot_token = non_blank(args.bot_token.as_ref())
            .or_else(|| env_value(&["BOT_TOKEN"]))
            .or_else(|| non_blank(toml_config.bot_token.as_ref()))
            .ok_or_else(|| {
                Error::Config(
                    "Bot token not configured. Set --bot-token, GARAGELIB_BOT_TOKEN, \
                     BOT_TOKEN or bot_token in the config file"
                        .to_string(),
                )
            })?;

        let storage_chat_id = match args.storage_chat_id {
            Some(id) => Some(id),
            None => match env_value(&["STORAGE_CHAT_ID"]) {
                Some(raw) => Some(raw.parse::<ChatId>().map_err(|_| {
                    Error::Config(format!("STORAGE_CHAT_ID is not a chat id: {}", raw))
                })?),
                None => toml_config.storage_chat_id,
            },
        };
        if storage_chat_id.is_none() {
            info!("No storage chat configured; saved tracks will not be mirrored");
        }

        let bot_version = non_blank(args.bot_version.as_ref())
            .or_else(|| env_value(&["BOT_VERSION"]))
            .or_else(|| non_blank(toml_config.bot_version.as_ref()))
            .unwrap_or_else(|| DEFAULT_BOT_VERSION.to_string());

        let log_level = non_blank(args.log_level.as_ref())
            .or_else(|| non_blank(toml_config.log_level.as_ref()))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            bot_token,
            storage_chat_id,
            bot_version,
            release_notes: non_blank(toml_config.release_notes.as_ref()),
            log_level,
            notify_delay: toml_config
                .notify_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_NOTIFY_DELAY),
            poll_timeout_secs: toml_config
                .poll_timeout_secs
                .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
            health_port: args.health_port.or(toml_config.health_port),
            session_idle_expiry: toml_config
                .session_idle_expiry_secs
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
            api_base_url: non_blank(toml_config.api_base_url.as_ref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in ["BOT_TOKEN", "STORAGE_CHAT_ID", "BOT_VERSION"] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_missing_token_is_config_error() {
        clear_env();
        let result = BotSettings::resolve(&Args::default(), &TomlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_defaults_apply() {
        clear_env();
        let toml_config = TomlConfig {
            bot_token: Some("toml-token".to_string()),
            ..Default::default()
        };

        let settings = BotSettings::resolve(&Args::default(), &toml_config).unwrap();

        assert_eq!(settings.bot_token, "toml-token");
        assert_eq!(settings.bot_version, DEFAULT_BOT_VERSION);
        assert_eq!(settings.notify_delay, Duration::from_millis(50));
        assert_eq!(settings.poll_timeout_secs, DEFAULT_POLL_TIMEOUT_SECS);
        assert!(settings.session_idle_expiry.is_none());
        assert!(settings.storage_chat_id.is_none());
    }

    #[test]
    #[serial]
    fn test_legacy_env_beats_toml_and_args_beat_env() {
        clear_env();
        std::env::set_var("BOT_TOKEN", "env-token");
        std::env::set_var("STORAGE_CHAT_ID", "-100123");
        let toml_config = TomlConfig {
            bot_token: Some("toml-token".to_string()),
            storage_chat_id: Some(-1),
            ..Default::default()
        };

        let settings = BotSettings::resolve(&Args::default(), &toml_config).unwrap();
        assert_eq!(settings.bot_token, "env-token");
        assert_eq!(settings.storage_chat_id, Some(-100123));

        let args = Args {
            bot_token: Some("cli-token".to_string()),
            ..Default::default()
        };
        let settings = BotSettings::resolve(&args, &toml_config).unwrap();
        assert_eq!(settings.bot_token, "cli-token");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_malformed_storage_chat_id_is_rejected() {
        clear_env();
        std::env::set_var("BOT_TOKEN", "env-token");
        std::env::set_var("STORAGE_CHAT_ID", "storage");

        let result = BotSettings::resolve(&Args::default(), &TomlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_debug_output_hides_token() {
        clear_env();
        let args = Args {
            bot_token: Some("123:secret".to_string()),
            ..Default::default()
        };
        let settings = BotSettings::resolve(&args, &TomlConfig::default()).unwrap();

        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("secret"));
    }
}
