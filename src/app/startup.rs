//! Application startup: arguments, logging, configuration, then the run

use super::cli::Args;
use super::config::DemoConfig;
use super::demo;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::version;
use clap::Parser;

/// Run the demo driver, exiting the process with status 1 on failure
pub async fn startup() {
    let args = Args::parse();
    let use_color = args.use_color();

    if let Err(e) = init_logging(
        args.log_level.as_deref(),
        args.log_format.as_deref(),
        args.log_file_str(),
        use_color,
    ) {
        eprintln!("Error initializing logging: {}", e);
        std::process::exit(1);
    }

    log::info!(
        "broadcastq {} ({}) starting",
        env!("CARGO_PKG_VERSION"),
        version::git_hash()
    );

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            log_error_with_context(&e, "Configuration loading");
            std::process::exit(1);
        }
    };
    log::debug!("Effective configuration: {:?}", config);

    match demo::run(&config).await {
        Ok(report) => report.print(use_color),
        Err(e) => {
            log_error_with_context(&e, "Demo run");
            std::process::exit(1);
        }
    }
}

fn load_config(args: &Args) -> Result<DemoConfig, crate::queue::ConfigError> {
    let mut config = DemoConfig::load(args.config_file.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}
