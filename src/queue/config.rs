//! Queue configuration
//!
//! Settings can be built in code or read from the `[queue]` table of a TOML
//! file:
//!
//! ```toml
//! [queue]
//! capacity = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl crate::core::error_handling::ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { message } => Some(message),
            ConfigError::Io { .. } => Some("Configuration file could not be read"),
            ConfigError::Parse(_) => Some("Configuration file is not valid TOML"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Maximum number of messages stored at once
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl QueueConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid {
                message: "queue.capacity must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Read a whole file into a string, mapping failures to [`ConfigError::Io`]
pub fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        queue: QueueConfig,
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(QueueConfig::default().capacity, DEFAULT_CAPACITY);
        assert!(QueueConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_from_toml_table() {
        let parsed: Wrapper = toml::from_str("[queue]\ncapacity = 3\n").unwrap();
        assert_eq!(parsed.queue, QueueConfig::with_capacity(3));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed: Wrapper = toml::from_str("[queue]\n").unwrap();
        assert_eq!(parsed.queue.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<Wrapper, _> = toml::from_str("[queue]\ncapacty = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let err = QueueConfig::with_capacity(0).validate().unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_config_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
