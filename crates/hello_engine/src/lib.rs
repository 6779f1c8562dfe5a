//! # Hello Engine
//!
//! Runtime-module lifecycle contract and a frame-loop host for a small game
//! engine.
//!
//! ## Features
//!
//! - **Runtime Modules**: one trait for every engine subsystem
//! - **Lifecycle Guard**: initialize/tick/finalize ordering enforced at runtime
//! - **Module Host**: ordered startup, frame loop, reverse-order shutdown
//! - **Configuration**: TOML and RON config files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hello_engine::prelude::*;
//!
//! struct Greeter {
//!     frames: u64,
//! }
//!
//! impl RuntimeModule for Greeter {
//!     fn name(&self) -> &str {
//!         "greeter"
//!     }
//!
//!     fn initialize(&mut self) -> Result<(), ModuleError> {
//!         Ok(())
//!     }
//!
//!     fn tick(&mut self) {
//!         self.frames += 1;
//!     }
//!
//!     fn finalize(&mut self) {
//!         println!("greeted {} frames", self.frames);
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HostConfig::default().with_max_frames(3);
//!     let mut host = ModuleHost::new(config)?.with_module(Greeter { frames: 0 });
//!     let summary = host.run()?;
//!     assert_eq!(summary.frames, 3);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod lifecycle;
pub mod modules;

mod host;
mod module;

pub use host::{BoxedModule, HostError, ModuleHost, RunSummary, StopHandle, StopReason};
pub use module::{ModuleError, ModuleStatus, RuntimeModule};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, EngineConfig, HostConfig, InitFailurePolicy, LoggingConfig},
        foundation::time::{FramePacer, Stopwatch, Timer},
        lifecycle::{LifecycleError, ManagedModule, ModuleState},
        modules::{FrameStatsModule, NullModule, TraceModule},
        HostError, ModuleError, ModuleHost, ModuleStatus, RunSummary, RuntimeModule, StopHandle,
        StopReason,
    };
}
