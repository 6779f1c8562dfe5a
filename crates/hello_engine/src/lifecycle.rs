//! Lifecycle state machine for runtime modules
//!
//! [`ManagedModule`] wraps a [`RuntimeModule`] and only forwards calls that
//! are legal in its current [`ModuleState`]:
//!
//! ```text
//! Uninitialized --initialize ok--> Initialized --finalize--> Finalized
//!       |
//!       +--initialize err--> Failed
//! ```
//!
//! `Finalized` and `Failed` are terminal. The inner module's `finalize` runs
//! at most once, either explicitly or when the wrapper is dropped.

use std::fmt;

use thiserror::Error;

use crate::module::{ModuleError, ModuleStatus, RuntimeModule};

/// Lifecycle state of a managed module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleState {
    /// Created, `initialize` not called yet
    Uninitialized,
    /// `initialize` succeeded; the module may be ticked
    Initialized,
    /// `initialize` failed; the module is unusable for the rest of its life
    Failed,
    /// `finalize` ran; terminal
    Finalized,
}

impl ModuleState {
    /// Whether `tick` may be forwarded in this state
    pub const fn is_tickable(self) -> bool {
        matches!(self, Self::Initialized)
    }

    /// Whether no further transition is possible
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Finalized)
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Failed => "failed",
            Self::Finalized => "finalized",
        };
        f.write_str(label)
    }
}

/// Lifecycle operation, used in error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    /// `initialize`
    Initialize,
    /// `tick`
    Tick,
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Initialize => "initialize",
            Self::Tick => "tick",
        };
        f.write_str(label)
    }
}

/// Lifecycle contract violations
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// `tick` before a successful `initialize`
    #[error("module '{module}' ticked before initialization")]
    NotInitialized {
        /// Module name
        module: String,
    },

    /// Any call after `finalize`
    #[error("module '{module}' was already finalized")]
    AlreadyFinalized {
        /// Module name
        module: String,
    },

    /// The inner module reported an initialization failure
    #[error("module '{module}' failed to initialize (code {}): {source}", .source.code())]
    InitFailed {
        /// Module name
        module: String,
        /// Error returned by the module
        #[source]
        source: ModuleError,
    },

    /// Operation not allowed from the current state
    #[error("module '{module}': cannot {op} while {from}")]
    InvalidTransition {
        /// Module name
        module: String,
        /// State the module was in
        from: ModuleState,
        /// Rejected operation
        op: LifecycleOp,
    },
}

/// A runtime module together with its enforced lifecycle state
pub struct ManagedModule<M: RuntimeModule> {
    module: M,
    state: ModuleState,
    tick_count: u64,
}

impl<M: RuntimeModule> ManagedModule<M> {
    /// Wrap a freshly created module
    pub const fn new(module: M) -> Self {
        Self {
            module,
            state: ModuleState::Uninitialized,
            tick_count: 0,
        }
    }

    /// Current lifecycle state
    pub const fn state(&self) -> ModuleState {
        self.state
    }

    /// Name of the wrapped module
    pub fn name(&self) -> &str {
        self.module.name()
    }

    /// Number of ticks forwarded to the module
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Status reported by the module, `Running` unless it is initialized
    pub fn status(&self) -> ModuleStatus {
        if self.state.is_tickable() {
            self.module.status()
        } else {
            ModuleStatus::Running
        }
    }

    /// Shared access to the wrapped module
    pub const fn inner(&self) -> &M {
        &self.module
    }

    /// Mutable access to the wrapped module
    ///
    /// Calling lifecycle methods through this reference bypasses the guard.
    pub fn inner_mut(&mut self) -> &mut M {
        &mut self.module
    }

    /// Initialize the module
    ///
    /// Only legal from `Uninitialized`. On failure the module moves to
    /// `Failed` and can never be ticked.
    pub fn initialize(&mut self) -> Result<(), LifecycleError> {
        if self.state != ModuleState::Uninitialized {
            return Err(self.invalid(LifecycleOp::Initialize));
        }

        log::debug!("Initializing module '{}'", self.module.name());
        match self.module.initialize() {
            Ok(()) => {
                self.state = ModuleState::Initialized;
                log::info!("Module '{}' initialized", self.module.name());
                Ok(())
            }
            Err(source) => {
                self.state = ModuleState::Failed;
                log::error!(
                    "Module '{}' failed to initialize (code {}): {}",
                    self.module.name(),
                    source.code(),
                    source
                );
                Err(LifecycleError::InitFailed {
                    module: self.module.name().to_string(),
                    source,
                })
            }
        }
    }

    /// Tick the module once
    ///
    /// Rejected without touching the module unless it is `Initialized`.
    pub fn tick(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            ModuleState::Initialized => {
                self.module.tick();
                self.tick_count += 1;
                Ok(())
            }
            ModuleState::Uninitialized => Err(LifecycleError::NotInitialized {
                module: self.module.name().to_string(),
            }),
            ModuleState::Failed | ModuleState::Finalized => Err(self.invalid(LifecycleOp::Tick)),
        }
    }

    /// Finalize the module
    ///
    /// Returns `true` when the inner `finalize` ran. Finalizing a module that
    /// was never initialized, failed to initialize, or is already finalized
    /// is a no-op returning `false`.
    pub fn finalize(&mut self) -> bool {
        match self.state {
            ModuleState::Initialized => {
                log::debug!(
                    "Finalizing module '{}' after {} ticks",
                    self.module.name(),
                    self.tick_count
                );
                self.module.finalize();
                self.state = ModuleState::Finalized;
                true
            }
            ModuleState::Uninitialized => {
                log::warn!(
                    "Module '{}' finalized without initialization, ignoring",
                    self.module.name()
                );
                self.state = ModuleState::Finalized;
                false
            }
            ModuleState::Failed | ModuleState::Finalized => false,
        }
    }

    fn invalid(&self, op: LifecycleOp) -> LifecycleError {
        if self.state == ModuleState::Finalized {
            LifecycleError::AlreadyFinalized {
                module: self.module.name().to_string(),
            }
        } else {
            LifecycleError::InvalidTransition {
                module: self.module.name().to_string(),
                from: self.state,
                op,
            }
        }
    }
}

impl<M: RuntimeModule> Drop for ManagedModule<M> {
    fn drop(&mut self) {
        if self.state == ModuleState::Initialized {
            log::warn!(
                "Module '{}' dropped while initialized, finalizing",
                self.module.name()
            );
            self.module.finalize();
            self.state = ModuleState::Finalized;
        }
    }
}

impl<M: RuntimeModule> fmt::Debug for ManagedModule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedModule")
            .field("name", &self.module.name())
            .field("state", &self.state)
            .field("tick_count", &self.tick_count)
            .finish()
    }
}
