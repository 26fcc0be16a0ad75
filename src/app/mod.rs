//! Application module: the demo driver binary

pub mod cli;
pub mod config;
pub mod demo;
pub mod startup;
