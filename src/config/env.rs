//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `PARTYLINK_DISCORD_TOKEN` - Discord bot token
//! - `PARTYLINK_DIRECTORY_URL` - Server directory endpoint
//! - `PARTYLINK_STORAGE_PATH` - Guild settings file

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "PARTYLINK";

/// Apply environment variable overrides to a config.
///
/// This allows the bot token to be provided via the environment
/// instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }
    if let Ok(url) = env::var(format!("{}_DIRECTORY_URL", ENV_PREFIX)) {
        config.directory.url = url;
    }
    if let Ok(path) = env::var(format!("{}_STORAGE_PATH", ENV_PREFIX)) {
        config.storage.path = path;
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `PARTYLINK_CONFIG` environment variable, otherwise returns "partylink.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "partylink.conf".to_string())
}
