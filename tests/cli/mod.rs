//! CLI Integration Test Modules

pub mod argument_parsing;
pub mod runs;
pub mod toml_config;
