//! Runtime module trait and module-level errors
//!
//! Every engine subsystem (renderer, input, audio, ...) implements
//! [`RuntimeModule`] so the host can drive it without knowing its concrete
//! type.

use thiserror::Error;

/// Runtime module lifecycle trait
///
/// The host calls the methods in a fixed order:
///
/// 1. [`initialize`](RuntimeModule::initialize) exactly once,
/// 2. [`tick`](RuntimeModule::tick) zero or more times, only if
///    initialization succeeded,
/// 3. [`finalize`](RuntimeModule::finalize) exactly once, after the last tick.
///
/// Hosts that want the order enforced rather than trusted should wrap the
/// module in a [`ManagedModule`](crate::lifecycle::ManagedModule).
pub trait RuntimeModule {
    /// Short identifier used in logs and run summaries
    fn name(&self) -> &str;

    /// Perform one-time setup
    ///
    /// Acquire resources and connect to platform services here. An error
    /// means the module is unusable: the host must not tick it.
    fn initialize(&mut self) -> Result<(), ModuleError>;

    /// Advance the module by one logical step (usually one frame)
    ///
    /// Ticks have no return value. Problems are reported out of band, through
    /// logging and [`status`](RuntimeModule::status).
    fn tick(&mut self);

    /// Release everything acquired by `initialize` and by ticks
    fn finalize(&mut self);

    /// Host-visible health flag, checked after every tick
    fn status(&self) -> ModuleStatus {
        ModuleStatus::Running
    }
}

impl<M: RuntimeModule + ?Sized> RuntimeModule for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn initialize(&mut self) -> Result<(), ModuleError> {
        (**self).initialize()
    }

    fn tick(&mut self) {
        (**self).tick();
    }

    fn finalize(&mut self) {
        (**self).finalize();
    }

    fn status(&self) -> ModuleStatus {
        (**self).status()
    }
}

/// Out-of-band module status reported after a tick
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModuleStatus {
    /// Keep ticking
    #[default]
    Running,

    /// The module asks the host to end the frame loop
    StopRequested,

    /// The module hit an error during a tick
    Faulted(String),
}

/// Module-level errors
#[derive(Error, Debug)]
pub enum ModuleError {
    /// Generic initialization failure
    #[error("Module initialization failed: {0}")]
    InitFailed(String),

    /// A resource could not be acquired or released
    #[error("Resource error ({what}): {source}")]
    Resource {
        /// What the module was trying to acquire
        what: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A platform service refused the request
    #[error("Platform error: {0}")]
    Platform(String),
}

impl ModuleError {
    /// Numeric result code for this failure
    ///
    /// Success has no error value and is conventionally `0`, so every
    /// variant maps to a non-zero code.
    pub const fn code(&self) -> i32 {
        match self {
            Self::InitFailed(_) => 1,
            Self::Resource { .. } => 2,
            Self::Platform(_) => 3,
        }
    }

    /// Wrap an IO error raised while acquiring `what`
    pub fn resource(what: impl Into<String>, source: std::io::Error) -> Self {
        Self::Resource {
            what: what.into(),
            source,
        }
    }
}
