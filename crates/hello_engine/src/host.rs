//! Module host implementation
//!
//! The host owns every registered module and drives the frame loop: it
//! initializes modules in registration order, ticks the ones that came up,
//! and finalizes them in reverse order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::{ConfigError, HostConfig, InitFailurePolicy},
    foundation::time::{FramePacer, Timer},
    lifecycle::{LifecycleError, ManagedModule, ModuleState},
    module::{ModuleError, ModuleStatus, RuntimeModule},
};

/// Boxed module as stored by the host
pub type BoxedModule = Box<dyn RuntimeModule>;

/// Why the frame loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// `max_frames` frames were run
    FrameLimit,
    /// A module returned [`ModuleStatus::StopRequested`]
    Requested {
        /// Module that asked to stop
        module: String,
    },
    /// A module faulted and the host is configured to stop on faults
    Fault {
        /// Faulted module
        module: String,
        /// Reported reason
        reason: String,
    },
    /// The [`StopHandle`] was triggered
    External,
    /// No module is left to tick: none survived initialization, or an
    /// earlier run already finalized them
    NoActiveModules,
}

/// Outcome of [`ModuleHost::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames ticked
    pub frames: u64,
    /// Modules skipped after failing to initialize
    pub skipped: Vec<String>,
    /// Why the loop ended
    pub stop_reason: StopReason,
}

/// Cloneable flag that asks a running host to stop after the current frame
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request a stop
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Host that owns and drives runtime modules
pub struct ModuleHost {
    config: HostConfig,
    modules: Vec<ManagedModule<BoxedModule>>,
    skipped: Vec<String>,
    timer: Timer,
    stop: StopHandle,
    frames: u64,
}

impl ModuleHost {
    /// Create a host with no modules
    pub fn new(config: HostConfig) -> Result<Self, HostError> {
        config.validate()?;
        log::info!("Creating module host...");
        Ok(Self {
            config,
            modules: Vec::new(),
            skipped: Vec::new(),
            timer: Timer::new(),
            stop: StopHandle::default(),
            frames: 0,
        })
    }

    /// Register a module; it is initialized by the next [`initialize_all`](Self::initialize_all)
    pub fn register(&mut self, module: BoxedModule) {
        log::debug!("Registering module '{}'", module.name());
        self.modules.push(ManagedModule::new(module));
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with_module(mut self, module: impl RuntimeModule + 'static) -> Self {
        self.register(Box::new(module));
        self
    }

    /// Number of registered modules, including skipped ones
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Name and lifecycle state of every module, in registration order
    pub fn states(&self) -> Vec<(String, ModuleState)> {
        self.modules
            .iter()
            .map(|module| (module.name().to_string(), module.state()))
            .collect()
    }

    /// Lifecycle state of the named module
    pub fn state_of(&self, name: &str) -> Option<ModuleState> {
        self.modules
            .iter()
            .find(|module| module.name() == name)
            .map(ManagedModule::state)
    }

    /// Handle that stops the frame loop from outside
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Frames ticked so far
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Frame timing
    pub const fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Modules skipped after failing to initialize
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Number of modules that can currently be ticked
    pub fn active_count(&self) -> usize {
        self.modules
            .iter()
            .filter(|module| module.state().is_tickable())
            .count()
    }

    /// Initialize every module still in `Uninitialized`, in registration order
    ///
    /// With [`InitFailurePolicy::Abort`] the first failure finalizes the
    /// modules that already came up, in reverse order, and is returned. With
    /// [`InitFailurePolicy::Skip`] the module is left out of the run.
    pub fn initialize_all(&mut self) -> Result<(), HostError> {
        log::info!("Initializing {} modules...", self.modules.len());

        for index in 0..self.modules.len() {
            let module = &mut self.modules[index];
            if module.state() != ModuleState::Uninitialized {
                continue;
            }

            match module.initialize() {
                Ok(()) => {}
                Err(LifecycleError::InitFailed { module: name, source }) => {
                    match self.config.init_failure_policy {
                        InitFailurePolicy::Abort => {
                            log::error!("Aborting startup: module '{}' failed", name);
                            self.finalize_all();
                            return Err(HostError::ModuleInitFailed { module: name, source });
                        }
                        InitFailurePolicy::Skip => {
                            log::warn!("Skipping module '{}' (code {})", name, source.code());
                            self.skipped.push(name);
                        }
                    }
                }
                Err(other) => return Err(other.into()),
            }
        }

        Ok(())
    }

    /// Tick every initialized module once
    ///
    /// Returns the reason to stop, if a module asked for one.
    pub fn tick_all(&mut self) -> Option<StopReason> {
        self.timer.update();
        self.frames += 1;

        let mut stop_reason = None;
        for module in &mut self.modules {
            if !module.state().is_tickable() {
                continue;
            }
            if let Err(err) = module.tick() {
                log::error!("{}", err);
                continue;
            }

            match module.status() {
                ModuleStatus::Running => {}
                ModuleStatus::StopRequested => {
                    log::info!("Module '{}' requested stop", module.name());
                    stop_reason.get_or_insert_with(|| StopReason::Requested {
                        module: module.name().to_string(),
                    });
                }
                ModuleStatus::Faulted(reason) => {
                    log::error!("Module '{}' faulted: {}", module.name(), reason);
                    if self.config.stop_on_fault {
                        stop_reason.get_or_insert_with(|| StopReason::Fault {
                            module: module.name().to_string(),
                            reason,
                        });
                    }
                }
            }
        }

        stop_reason
    }

    /// Run the full lifecycle: initialize, frame loop, finalize
    pub fn run(&mut self) -> Result<RunSummary, HostError> {
        let mut pacer = match self.config.target_tick_rate {
            Some(rate) => Some(FramePacer::new(rate).ok_or_else(|| {
                ConfigError::Invalid(format!("cannot pace ticks at {rate} per second"))
            })?),
            None => None,
        };

        self.stop.reset();
        self.initialize_all()?;

        let start_frames = self.frames;

        log::info!("Starting main loop...");
        let stop_reason = loop {
            let ran = self.frames - start_frames;
            if self.config.max_frames.is_some_and(|max| ran >= max) {
                break StopReason::FrameLimit;
            }
            if self.active_count() == 0 {
                break StopReason::NoActiveModules;
            }
            if self.stop.is_stopped() {
                break StopReason::External;
            }

            if let Some(pacer) = pacer.as_mut() {
                pacer.wait();
            }
            if let Some(reason) = self.tick_all() {
                break reason;
            }
        };

        self.finalize_all();

        let summary = RunSummary {
            frames: self.frames - start_frames,
            skipped: self.skipped.clone(),
            stop_reason,
        };
        log::info!(
            "Host stopped after {} frames ({:?}), average {:.1} FPS",
            summary.frames,
            summary.stop_reason,
            self.timer.average_fps()
        );
        Ok(summary)
    }

    /// Finalize every module in reverse registration order
    ///
    /// Modules are finalized at most once; calling this again is a no-op.
    pub fn finalize_all(&mut self) {
        let finalized = self
            .modules
            .iter_mut()
            .rev()
            .filter(|module| module.state() == ModuleState::Initialized)
            .map(ManagedModule::finalize)
            .filter(|ran| *ran)
            .count();

        if finalized > 0 {
            log::info!("Finalized {} modules", finalized);
        }
    }
}

impl Drop for ModuleHost {
    fn drop(&mut self) {
        self.finalize_all();
    }
}

/// Host-level errors
#[derive(Error, Debug)]
pub enum HostError {
    /// A module failed to initialize under the abort policy
    #[error("Module '{module}' failed to initialize (code {}): {source}", .source.code())]
    ModuleInitFailed {
        /// Module name
        module: String,
        /// Error returned by the module
        #[source]
        source: ModuleError,
    },

    /// Lifecycle contract violation
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Scripted {
        name: &'static str,
        journal: Journal,
        fail_init: bool,
        stop_after: Option<u64>,
        fault_after: Option<u64>,
        ticks: u64,
    }

    impl Scripted {
        fn new(name: &'static str, journal: &Journal) -> Self {
            Self {
                name,
                journal: Rc::clone(journal),
                fail_init: false,
                stop_after: None,
                fault_after: None,
                ticks: 0,
            }
        }

        fn failing(mut self) -> Self {
            self.fail_init = true;
            self
        }

        fn stop_after(mut self, ticks: u64) -> Self {
            self.stop_after = Some(ticks);
            self
        }

        fn fault_after(mut self, ticks: u64) -> Self {
            self.fault_after = Some(ticks);
            self
        }

        fn log(&self, event: &str) {
            self.journal.borrow_mut().push(format!("{}:{}", self.name, event));
        }
    }

    impl RuntimeModule for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn initialize(&mut self) -> Result<(), ModuleError> {
            self.log("init");
            if self.fail_init {
                Err(ModuleError::InitFailed(format!("{} is broken", self.name)))
            } else {
                Ok(())
            }
        }

        fn tick(&mut self) {
            self.ticks += 1;
            self.log("tick");
        }

        fn finalize(&mut self) {
            self.log("finalize");
        }

        fn status(&self) -> ModuleStatus {
            if self.stop_after.is_some_and(|n| self.ticks >= n) {
                ModuleStatus::StopRequested
            } else if self.fault_after.is_some_and(|n| self.ticks >= n) {
                ModuleStatus::Faulted("scripted fault".into())
            } else {
                ModuleStatus::Running
            }
        }
    }

    fn journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn count(journal: &Journal, entry: &str) -> usize {
        journal.borrow().iter().filter(|e| *e == entry).count()
    }

    #[test]
    fn test_run_respects_frame_limit() {
        let log = journal();
        let mut host = ModuleHost::new(HostConfig::unbounded().with_max_frames(3))
            .unwrap()
            .with_module(Scripted::new("a", &log));

        let summary = host.run().unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.stop_reason, StopReason::FrameLimit);
        assert_eq!(
            *log.borrow(),
            vec!["a:init", "a:tick", "a:tick", "a:tick", "a:finalize"]
        );
    }

    #[test]
    fn test_finalize_in_reverse_order() {
        let log = journal();
        let mut host = ModuleHost::new(HostConfig::unbounded().with_max_frames(0))
            .unwrap()
            .with_module(Scripted::new("a", &log))
            .with_module(Scripted::new("b", &log))
            .with_module(Scripted::new("c", &log));

        host.run().unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["a:init", "b:init", "c:init", "c:finalize", "b:finalize", "a:finalize"]
        );
    }

    #[test]
    fn test_skip_policy_never_ticks_failed_module() {
        let log = journal();
        let mut host = ModuleHost::new(HostConfig::unbounded().with_max_frames(2))
            .unwrap()
            .with_module(Scripted::new("good", &log))
            .with_module(Scripted::new("bad", &log).failing());

        let summary = host.run().unwrap();
        assert_eq!(summary.skipped, vec!["bad".to_string()]);
        assert_eq!(count(&log, "good:tick"), 2);
        assert_eq!(count(&log, "bad:tick"), 0);
        assert_eq!(count(&log, "bad:finalize"), 0);
        assert_eq!(host.state_of("bad"), Some(ModuleState::Failed));
    }

    #[test]
    fn test_abort_policy_unwinds_initialized_modules() {
        let log = journal();
        let config = HostConfig::unbounded()
            .with_max_frames(5)
            .with_init_failure_policy(InitFailurePolicy::Abort);
        let mut host = ModuleHost::new(config)
            .unwrap()
            .with_module(Scripted::new("a", &log))
            .with_module(Scripted::new("b", &log))
            .with_module(Scripted::new("c", &log).failing())
            .with_module(Scripted::new("d", &log));

        let err = host.run().unwrap_err();
        match err {
            HostError::ModuleInitFailed { module, source } => {
                assert_eq!(module, "c");
                assert_ne!(source.code(), 0);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            *log.borrow(),
            vec!["a:init", "b:init", "c:init", "b:finalize", "a:finalize"]
        );
        assert_eq!(host.state_of("d"), Some(ModuleState::Uninitialized));
    }

    #[test]
    fn test_stop_requested_ends_loop() {
        let log = journal();
        let mut host = ModuleHost::new(HostConfig::unbounded())
            .unwrap()
            .with_module(Scripted::new("quitter", &log).stop_after(4));

        let summary = host.run().unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(
            summary.stop_reason,
            StopReason::Requested {
                module: "quitter".into()
            }
        );
        assert_eq!(count(&log, "quitter:finalize"), 1);
    }

    #[test]
    fn test_fault_stops_when_configured() {
        let log = journal();
        let mut host = ModuleHost::new(HostConfig::unbounded())
            .unwrap()
            .with_module(Scripted::new("flaky", &log).fault_after(2));

        let summary = host.run().unwrap();
        assert_eq!(summary.frames, 2);
        assert!(matches!(summary.stop_reason, StopReason::Fault { .. }));
    }

    #[test]
    fn test_fault_ignored_without_stop_on_fault() {
        let log = journal();
        let mut config = HostConfig::unbounded().with_max_frames(5);
        config.stop_on_fault = false;
        let mut host = ModuleHost::new(config)
            .unwrap()
            .with_module(Scripted::new("flaky", &log).fault_after(1));

        let summary = host.run().unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.stop_reason, StopReason::FrameLimit);
    }

    struct Trigger {
        handle: StopHandle,
        after: u64,
        ticks: u64,
    }

    impl RuntimeModule for Trigger {
        fn name(&self) -> &str {
            "trigger"
        }

        fn initialize(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }

        fn tick(&mut self) {
            self.ticks += 1;
            if self.ticks == self.after {
                self.handle.stop();
            }
        }

        fn finalize(&mut self) {}
    }

    #[test]
    fn test_external_stop_handle() {
        let host = ModuleHost::new(HostConfig::unbounded()).unwrap();
        let handle = host.stop_handle();
        let mut host = host.with_module(Trigger {
            handle: handle.clone(),
            after: 3,
            ticks: 0,
        });

        let summary = host.run().unwrap();
        assert!(handle.is_stopped());
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.stop_reason, StopReason::External);
    }

    #[test]
    fn test_run_clears_stale_stop_request() {
        let log = journal();
        let mut host = ModuleHost::new(HostConfig::unbounded().with_max_frames(10))
            .unwrap()
            .with_module(Scripted::new("a", &log));

        host.initialize_all().unwrap();
        host.tick_all();
        host.stop_handle().stop();

        let summary = host.run().unwrap();
        assert_eq!(summary.stop_reason, StopReason::FrameLimit);
        assert_eq!(summary.frames, 10);
        assert_eq!(count(&log, "a:init"), 1);
    }

    #[test]
    fn test_no_active_modules_without_frame_limit() {
        let log = journal();
        let mut host = ModuleHost::new(HostConfig::unbounded())
            .unwrap()
            .with_module(Scripted::new("bad", &log).failing());

        let summary = host.run().unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.stop_reason, StopReason::NoActiveModules);
    }

    #[test]
    fn test_drop_finalizes_once() {
        let log = journal();
        {
            let mut host = ModuleHost::new(HostConfig::unbounded())
                .unwrap()
                .with_module(Scripted::new("a", &log));
            host.initialize_all().unwrap();
            host.tick_all();
            host.finalize_all();
        }
        assert_eq!(count(&log, "a:finalize"), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = ModuleHost::new(HostConfig::unbounded().with_tick_rate(0.0));
        assert!(matches!(result, Err(HostError::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn test_tick_rate_too_slow_to_pace_is_rejected() {
        let config = HostConfig::unbounded().with_tick_rate(1e-20).with_max_frames(1);
        let result = ModuleHost::new(config);
        assert!(matches!(result, Err(HostError::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn test_paced_run_spaces_frames() {
        let log = journal();
        let config = HostConfig::unbounded().with_tick_rate(1000.0).with_max_frames(3);
        let mut host = ModuleHost::new(config)
            .unwrap()
            .with_module(Scripted::new("a", &log));

        let started = Instant::now();
        let summary = host.run().unwrap();
        let elapsed = started.elapsed();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.stop_reason, StopReason::FrameLimit);
        assert_eq!(count(&log, "a:tick"), 3);
        // First frame is immediate, the next two wait a full period each
        assert!(elapsed >= Duration::from_millis(2), "ran in {elapsed:?}");
    }

    #[test]
    fn test_second_run_has_nothing_to_tick() {
        let log = journal();
        let mut host = ModuleHost::new(HostConfig::unbounded().with_max_frames(5))
            .unwrap()
            .with_module(Scripted::new("a", &log));

        let first = host.run().unwrap();
        assert_eq!(first.frames, 5);

        let second = host.run().unwrap();
        assert_eq!(second.frames, 0);
        assert_eq!(second.stop_reason, StopReason::NoActiveModules);
        assert_eq!(count(&log, "a:tick"), 5);
        assert_eq!(count(&log, "a:finalize"), 1);
    }
}
