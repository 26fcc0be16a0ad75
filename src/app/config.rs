//! TOML configuration for the demo driver
//!
//! ```toml
//! producers = 4
//! consumers = 4
//! messages = 1000
//! resize_to = 5
//! unsubscribe_every = 50
//! timeout_secs = 60
//!
//! [queue]
//! capacity = 10
//! ```
//!
//! An explicit `--config-file` must exist. Without one the default file under
//! the user config directory is read if present, otherwise defaults apply.

use crate::queue::config::{read_config_file, ConfigError, QueueConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub queue: QueueConfig,
    pub producers: usize,
    pub consumers: usize,
    /// Messages published by each producer
    pub messages: usize,
    pub resize_to: Option<usize>,
    /// Reads between a consumer leaving and rejoining; 0 keeps it subscribed
    pub unsubscribe_every: usize,
    pub timeout_secs: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            producers: 4,
            consumers: 4,
            messages: 1000,
            resize_to: None,
            unsubscribe_every: 0,
            timeout_secs: 60,
        }
    }
}

impl DemoConfig {
    /// `<config dir>/broadcastq/broadcastq.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("broadcastq").join("broadcastq.toml"))
    }

    /// Load from `path`, or from the default location if it exists
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    log::debug!("No configuration file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        log::debug!("Loading configuration from {}", path.display());
        Self::from_toml(&read_config_file(&path)?)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.queue.validate()?;

        let invalid = |message: &str| {
            Err(ConfigError::Invalid {
                message: message.to_string(),
            })
        };
        if self.producers == 0 {
            return invalid("producers must be greater than zero");
        }
        if self.messages == 0 {
            return invalid("messages must be greater than zero");
        }
        if self.timeout_secs == 0 {
            return invalid("timeout_secs must be greater than zero");
        }
        // Producers would block on a queue that can never hold a message
        if self.resize_to == Some(0) {
            return invalid("resize_to must be greater than zero");
        }
        if self.producers.checked_mul(self.messages).is_none() {
            return invalid("producers * messages is too large");
        }
        Ok(())
    }

    /// Total number of messages the producers will publish
    pub fn total_messages(&self) -> usize {
        self.producers.saturating_mul(self.messages)
    }
}
