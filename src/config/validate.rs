//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Validate Discord config
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.command_prefix.trim().is_empty() {
        errors.push("discord.command_prefix must not be blank".to_string());
    }

    // Validate directory polling
    let directory = &config.directory;
    if !directory.url.starts_with("http://") && !directory.url.starts_with("https://") {
        errors.push(format!(
            "directory.url '{}' must be an http:// or https:// URL",
            directory.url
        ));
    }
    if directory.refresh_interval_secs == 0 {
        errors.push("directory.refresh_interval_secs must be non-zero".to_string());
    }
    if directory.fetch_timeout_secs == 0 {
        errors.push("directory.fetch_timeout_secs must be non-zero".to_string());
    }
    if directory.fetch_timeout_secs >= directory.refresh_interval_secs {
        errors.push(format!(
            "directory.fetch_timeout_secs ({}) must be shorter than refresh_interval_secs ({})",
            directory.fetch_timeout_secs, directory.refresh_interval_secs
        ));
    }

    if config.storage.path.is_empty() {
        errors.push("storage.path is required".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
