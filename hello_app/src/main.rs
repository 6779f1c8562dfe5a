//! Hello engine demo application
//!
//! Loads an engine configuration, creates the modules it lists and runs them
//! under a module host.
//!
//! Usage: `hello_app [config.toml|config.ron]`

mod registry;

use std::path::PathBuf;

use hello_engine::foundation::logging;
use hello_engine::prelude::*;
use log::LevelFilter;

fn run(config_path: Option<PathBuf>) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let config = EngineConfig::load_or_default(config_path.as_deref())?;
    logging::init_with_level(config.logging.level_filter()?);

    log::info!("Starting Hello Engine demo");
    if let Some(path) = &config_path {
        log::info!("Using configuration {}", path.display());
    }

    let mut host = ModuleHost::new(config.host.clone())?;
    for module in registry::build_modules(&config.host.modules)? {
        host.register(module);
    }
    log::info!("Registered {} modules", host.module_count());

    Ok(host.run()?)
}

/// Log a failure from `run`, even if it happened before logging was configured
fn report_failure(error: &dyn std::error::Error) {
    logging::init_with_level(LevelFilter::Info);
    log::error!("Application error: {}", error);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    match run(config_path) {
        Ok(summary) => {
            log::info!(
                "Demo finished after {} frames ({:?})",
                summary.frames,
                summary.stop_reason
            );
            if !summary.skipped.is_empty() {
                log::warn!("Skipped modules: {}", summary.skipped.join(", "));
            }
            Ok(())
        }
        Err(e) => {
            report_failure(e.as_ref());
            Err(e)
        }
    }
}
