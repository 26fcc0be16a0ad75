//! Command line arguments for the demo driver
//!
//! Every option that also exists in the configuration file overrides the
//! file value when given.

use crate::app::config::DemoConfig;
use crate::core::logging::{LOG_FORMATS, LOG_LEVELS};
use clap::{ArgAction, Parser};
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "broadcastq")]
#[command(about = "Drive a bounded broadcast queue with concurrent producers and consumers")]
#[command(version, long_version = crate::core::version::long_version())]
#[command(styles = crate::core::styles::palette_to_clap(true))]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Queue capacity (messages)
    #[arg(short = 'n', long = "capacity", value_name = "COUNT")]
    pub capacity: Option<usize>,

    /// Number of producer threads
    #[arg(short = 'p', long = "producers", value_name = "COUNT")]
    pub producers: Option<usize>,

    /// Number of consumer threads
    #[arg(short = 's', long = "consumers", value_name = "COUNT")]
    pub consumers: Option<usize>,

    /// Messages published by each producer
    #[arg(short = 'm', long = "messages", value_name = "COUNT")]
    pub messages: Option<usize>,

    /// Resize the queue to this capacity halfway through the run
    #[arg(short = 'r', long = "resize-to", value_name = "COUNT")]
    pub resize_to: Option<usize>,

    /// Consumers leave and rejoin after this many reads (0 = never)
    #[arg(short = 'u', long = "unsubscribe-every", value_name = "COUNT")]
    pub unsubscribe_every: Option<usize>,

    /// Abort the run after this many seconds
    #[arg(short = 't', long = "timeout", value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = LOG_LEVELS)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = LOG_FORMATS)]
    pub log_format: Option<String>,

    /// Log file path (logs go to stderr when omitted)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Force colored output (overrides TTY detection and NO_COLOR)
    #[arg(short = 'g', long = "color", action = ArgAction::SetTrue, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    pub no_color: bool,
}

impl Args {
    /// Resolve the colour flags against NO_COLOR and the terminal
    pub fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        if self.color {
            return true;
        }
        std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
    }

    /// Log file as a string, if one was given
    pub fn log_file_str(&self) -> Option<&str> {
        self.log_file.as_deref().and_then(|p| p.to_str())
    }

    /// Overlay the command line onto values loaded from the config file
    pub fn apply_overrides(&self, config: &mut DemoConfig) {
        if let Some(capacity) = self.capacity {
            config.queue.capacity = capacity;
        }
        if let Some(producers) = self.producers {
            config.producers = producers;
        }
        if let Some(consumers) = self.consumers {
            config.consumers = consumers;
        }
        if let Some(messages) = self.messages {
            config.messages = messages;
        }
        if self.resize_to.is_some() {
            config.resize_to = self.resize_to;
        }
        if let Some(every) = self.unsubscribe_every {
            config.unsubscribe_every = every;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
    }
}
