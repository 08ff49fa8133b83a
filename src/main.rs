//! PS4 PKG Validator
//!
//! Main entry point for the validator application. Paths given on the
//! command line are queued for validation on startup.

use pv_core::config::Config;
use pv_ui::app;
use std::path::PathBuf;

fn main() -> eframe::Result<()> {
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Initialize logging
    pv_core::logging::init(config.debug.log_level);

    tracing::info!("Starting PS4 PKG Validator");
    if let Some(e) = config_error {
        tracing::warn!("Using default configuration: {}", e);
    }

    let initial: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    // Run the application
    app::run(config, initial)
}
