//! Module construction from configuration names
//!
//! Entries in `host.modules` are either a bare module name or
//! `name=argument`:
//!
//! - `null` / `null=label` - no-op module
//! - `frame_stats` / `frame_stats=<interval>` - frame rate reports
//! - `trace` / `trace=<path>` - per-frame CSV trace

use hello_engine::modules::{FrameStatsModule, NullModule, TraceModule};
use hello_engine::BoxedModule;
use thiserror::Error;

/// Default trace file when `trace` has no argument
pub const DEFAULT_TRACE_PATH: &str = "hello_trace.csv";

/// Errors while turning config entries into modules
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// No module with this name exists
    #[error("Unknown module '{0}'")]
    UnknownModule(String),

    /// The argument after `=` could not be used
    #[error("Invalid argument for module '{module}': {argument}")]
    InvalidArgument {
        /// Module name
        module: String,
        /// Rejected argument
        argument: String,
    },
}

/// Build one module from a config entry
pub fn build_module(entry: &str) -> Result<BoxedModule, RegistryError> {
    let (name, argument) = match entry.split_once('=') {
        Some((name, argument)) => (name.trim(), Some(argument.trim())),
        None => (entry.trim(), None),
    };

    let module: BoxedModule = match name {
        "null" => Box::new(argument.map_or_else(NullModule::default, NullModule::new)),
        "frame_stats" => {
            let interval = match argument {
                Some(raw) => raw.parse().map_err(|_| RegistryError::InvalidArgument {
                    module: name.to_string(),
                    argument: raw.to_string(),
                })?,
                None => 60,
            };
            Box::new(FrameStatsModule::new(interval))
        }
        "trace" => Box::new(TraceModule::new(argument.unwrap_or(DEFAULT_TRACE_PATH))),
        _ => return Err(RegistryError::UnknownModule(name.to_string())),
    };

    Ok(module)
}

/// Build every module listed in the config, in order
pub fn build_modules(entries: &[String]) -> Result<Vec<BoxedModule>, RegistryError> {
    entries.iter().map(|entry| build_module(entry)).collect()
}
