//! Conformance checks for the runtime-module lifecycle contract

use std::cell::RefCell;
use std::rc::Rc;

use hello_engine::prelude::*;

#[derive(Debug, Default)]
struct Counters {
    initialized: u32,
    ticks: u32,
    finalized: u32,
    ticks_after_finalize: u32,
}

/// Module whose resources are a plain vector, so double release is observable
struct Recorder {
    counters: Rc<RefCell<Counters>>,
    init_code: i32,
    buffers: Option<Vec<u8>>,
}

impl Recorder {
    fn new(init_code: i32) -> (Self, Rc<RefCell<Counters>>) {
        let counters = Rc::new(RefCell::new(Counters::default()));
        let module = Self {
            counters: Rc::clone(&counters),
            init_code,
            buffers: None,
        };
        (module, counters)
    }
}

impl RuntimeModule for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn initialize(&mut self) -> Result<(), ModuleError> {
        self.counters.borrow_mut().initialized += 1;
        if self.init_code != 0 {
            return Err(ModuleError::InitFailed(format!(
                "device refused with code {}",
                self.init_code
            )));
        }
        self.buffers = Some(vec![0; 16]);
        Ok(())
    }

    fn tick(&mut self) {
        let mut counters = self.counters.borrow_mut();
        match self.buffers.as_mut() {
            Some(buffers) => {
                buffers[0] = buffers[0].wrapping_add(1);
                counters.ticks += 1;
            }
            None => counters.ticks_after_finalize += 1,
        }
    }

    fn finalize(&mut self) {
        assert!(self.buffers.take().is_some(), "resources released twice");
        self.counters.borrow_mut().finalized += 1;
    }
}

#[test]
fn initialize_tick_three_times_finalize() {
    let (module, counters) = Recorder::new(0);
    let mut managed = ManagedModule::new(module);

    assert!(managed.initialize().is_ok());
    for _ in 0..3 {
        assert!(managed.tick().is_ok());
    }
    assert!(managed.finalize());

    let counters = counters.borrow();
    assert_eq!(counters.initialized, 1);
    assert_eq!(counters.ticks, 3);
    assert_eq!(counters.finalized, 1);
    assert_eq!(counters.ticks_after_finalize, 0);
}

#[test]
fn tick_before_initialize_is_rejected() {
    let (module, counters) = Recorder::new(0);
    let mut managed = ManagedModule::new(module);

    assert!(matches!(
        managed.tick(),
        Err(LifecycleError::NotInitialized { .. })
    ));
    assert_eq!(counters.borrow().ticks + counters.borrow().ticks_after_finalize, 0);
}

#[test]
fn finalize_is_at_most_once() {
    let (module, counters) = Recorder::new(0);
    let mut managed = ManagedModule::new(module);

    managed.initialize().unwrap();
    assert!(managed.finalize());
    assert!(!managed.finalize());
    assert!(managed.tick().is_err());
    drop(managed);

    assert_eq!(counters.borrow().finalized, 1);
    assert_eq!(counters.borrow().ticks_after_finalize, 0);
}

#[test]
fn finalize_without_initialize_does_not_crash() {
    let (module, counters) = Recorder::new(0);
    let mut managed = ManagedModule::new(module);

    assert!(!managed.finalize());
    assert_eq!(counters.borrow().finalized, 0);
}

#[test]
fn host_observes_failure_and_skips_module() {
    let (broken, broken_counters) = Recorder::new(7);
    let (healthy, healthy_counters) = Recorder::new(0);

    let config = HostConfig::unbounded()
        .with_max_frames(3)
        .with_init_failure_policy(InitFailurePolicy::Skip);
    let mut host = ModuleHost::new(config)
        .unwrap()
        .with_module(broken)
        .with_module(healthy);

    let summary = host.run().unwrap();

    assert_eq!(summary.skipped, vec!["recorder".to_string()]);
    assert_eq!(broken_counters.borrow().ticks, 0);
    assert_eq!(broken_counters.borrow().finalized, 0);
    assert_eq!(healthy_counters.borrow().ticks, 3);
    assert_eq!(healthy_counters.borrow().finalized, 1);
}

#[test]
fn host_reports_failure_code_under_abort() {
    let (broken, counters) = Recorder::new(3);

    let config = HostConfig::unbounded().with_init_failure_policy(InitFailurePolicy::Abort);
    let mut host = ModuleHost::new(config).unwrap().with_module(broken);

    match host.run() {
        Err(HostError::ModuleInitFailed { module, source }) => {
            assert_eq!(module, "recorder");
            assert_ne!(source.code(), 0);
        }
        other => panic!("expected init failure, got {other:?}"),
    }
    assert_eq!(counters.borrow().ticks, 0);
}

#[test]
fn stock_modules_run_under_host() {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("trace.csv");

    let mut host = ModuleHost::new(HostConfig::unbounded().with_max_frames(4))
        .unwrap()
        .with_module(NullModule::default())
        .with_module(FrameStatsModule::new(2))
        .with_module(TraceModule::new(&trace_path));

    let summary = host.run().unwrap();
    assert_eq!(summary.frames, 4);
    assert!(summary.skipped.is_empty());
    assert!(host
        .states()
        .iter()
        .all(|(_, state)| *state == ModuleState::Finalized));

    let trace = std::fs::read_to_string(&trace_path).unwrap();
    assert_eq!(trace.lines().count(), 5);
}
