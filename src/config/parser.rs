//! Configuration file parsing (HOCON format).

use std::path::Path;

use crate::common::error::ConfigError;
use crate::config::types::Config;
use hocon::HoconLoader;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    HoconLoader::new()
        .load_file(path)
        .map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_config_str(r#"discord { token = "abc" }"#).unwrap();

        assert_eq!(config.discord.token, "abc");
        assert_eq!(config.discord.command_prefix, "!");
        assert_eq!(config.directory.url, "http://lb.diep.io/v2/find_servers");
        assert_eq!(config.directory.refresh_interval_secs, 300);
        assert_eq!(config.directory.fetch_timeout_secs, 10);
        assert_eq!(config.storage.path, "partylink.json");
        assert!(config.defaults.detect);
        assert!(config.defaults.delete);
        assert!(!config.defaults.tdm_delete);
        assert!(!config.defaults.all_delete);
    }

    #[test]
    fn test_full_config() {
        let config = load_config_str(
            r#"
            discord {
                token = "abc"
                command_prefix = "?"
            }
            directory {
                url = "http://localhost:8080/servers"
                refresh_interval_secs = 60
                fetch_timeout_secs = 5
            }
            storage { path = "/var/lib/partylink/guilds.json" }
            defaults {
                detect = false
                delete = false
                tdm_delete = true
                all_delete = false
            }
            "#,
        )
        .unwrap();

        assert_eq!(config.discord.command_prefix, "?");
        assert_eq!(config.directory.url, "http://localhost:8080/servers");
        assert_eq!(config.directory.refresh_settings().interval.as_secs(), 60);
        assert_eq!(config.directory.refresh_settings().timeout.as_secs(), 5);
        assert_eq!(config.storage.path, "/var/lib/partylink/guilds.json");
        assert!(!config.defaults.detect);
        assert!(config.defaults.tdm_delete);
    }

    #[test]
    fn test_partial_defaults_block() {
        let config = load_config_str(
            r#"
            discord { token = "abc" }
            defaults { tdm_delete = true }
            "#,
        )
        .unwrap();

        assert!(config.defaults.detect);
        assert!(config.defaults.delete);
        assert!(config.defaults.tdm_delete);
        assert!(!config.defaults.all_delete);
    }

    #[test]
    fn test_missing_token_fails() {
        assert!(load_config_str("directory { refresh_interval_secs = 60 }").is_err());
    }
}
