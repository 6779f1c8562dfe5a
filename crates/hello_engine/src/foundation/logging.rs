//! Logging setup

use log::LevelFilter;

/// Initialize the logging system
///
/// `level` is the default filter; `RUST_LOG` overrides it per module. Calling
/// this more than once keeps the first logger and returns quietly.
pub fn init_with_level(level: LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format_timestamp_millis()
        .try_init();

    if result.is_err() {
        log::debug!("Logger already initialized");
    }
}
