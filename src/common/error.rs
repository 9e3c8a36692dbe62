//! Error types for the application.

use thiserror::Error;

/// Discord client errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Malformed directory record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Server name '{raw}' does not match <company>-<location>:<mode>:")]
    Grammar { raw: String },

    #[error("Server address '{raw}' has no host")]
    Address { raw: String },
}

/// Server directory refresh errors.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Directory returned HTTP {0}")]
    Status(u16),

    #[error("Directory fetch timed out")]
    Timeout,

    #[error("Malformed directory payload: {message}")]
    Malformed { message: String },

    #[error("Bad directory record: {0}")]
    Record(#[from] RecordError),
}

/// Guild settings persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access settings file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for directory operations.
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_wraps_discord_error() {
        let err = AppError::from(serenity::Error::Other("gateway closed"));
        assert!(matches!(err, AppError::Discord(_)));
        assert_eq!(err.to_string(), "Discord error: gateway closed");
    }

    #[test]
    fn test_record_error_converts_to_directory_error() {
        let err = DirectoryError::from(RecordError::Grammar {
            raw: "garbage".to_string(),
        });
        assert!(err.to_string().contains("garbage"));
    }
}
