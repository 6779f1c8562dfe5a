//! No-op module

use crate::module::{ModuleError, RuntimeModule};

/// Module that does nothing
///
/// Hosts can register it in place of a subsystem that is unavailable, so the
/// rest of the engine keeps a stable module layout.
#[derive(Debug, Clone)]
pub struct NullModule {
    name: String,
}

impl NullModule {
    /// Create a no-op module reporting itself as `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for NullModule {
    fn default() -> Self {
        Self::new("null")
    }
}

impl RuntimeModule for NullModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    fn tick(&mut self) {}

    fn finalize(&mut self) {}
}
