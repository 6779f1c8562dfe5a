//! Per-frame trace file module

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::foundation::resource::ResourceSlot;
use crate::foundation::time::Stopwatch;
use crate::module::{ModuleError, ModuleStatus, RuntimeModule};

/// Writes one `frame,elapsed_ms` line per tick to a CSV file
///
/// The file is created in `initialize` and flushed and closed in
/// `finalize`. A write failure during a tick marks the module as faulted.
#[derive(Debug)]
pub struct TraceModule {
    path: PathBuf,
    writer: ResourceSlot<BufWriter<File>>,
    clock: Option<Stopwatch>,
    frame: u64,
    fault: Option<String>,
}

impl TraceModule {
    /// Trace to `path`, truncating any existing file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: ResourceSlot::empty("trace file"),
            clock: None,
            frame: 0,
            fault: None,
        }
    }

    /// Destination file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Lines written so far
    pub const fn frames_written(&self) -> u64 {
        self.frame
    }
}

impl RuntimeModule for TraceModule {
    fn name(&self) -> &str {
        "trace"
    }

    fn initialize(&mut self) -> Result<(), ModuleError> {
        let path = &self.path;
        let writer = self
            .writer
            .acquire(|| File::create(path).map(BufWriter::new))
            .map_err(|e| ModuleError::resource(path.display().to_string(), e))?;
        writeln!(writer, "frame,elapsed_ms")
            .map_err(|e| ModuleError::resource(path.display().to_string(), e))?;

        self.clock = Some(Stopwatch::start_new());
        self.frame = 0;
        self.fault = None;
        log::info!("Tracing frames to {}", self.path.display());
        Ok(())
    }

    fn tick(&mut self) {
        if self.fault.is_some() {
            return;
        }
        let Some(writer) = self.writer.get_mut() else {
            return;
        };

        let elapsed = self.clock.as_ref().map_or(0.0, Stopwatch::elapsed_millis);
        let frame = self.frame + 1;
        match writeln!(writer, "{frame},{elapsed:.3}") {
            Ok(()) => self.frame = frame,
            Err(err) => {
                log::error!("Trace write to {} failed: {}", self.path.display(), err);
                self.fault = Some(err.to_string());
            }
        }
    }

    fn finalize(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            clock.stop();
        }
        match self.writer.release() {
            Ok(true) => log::info!(
                "Wrote {} trace lines to {}",
                self.frame,
                self.path.display()
            ),
            Ok(false) => {}
            Err(err) => log::warn!("Failed to flush trace {}: {}", self.path.display(), err),
        }
    }

    fn status(&self) -> ModuleStatus {
        self.fault
            .as_ref()
            .map_or(ModuleStatus::Running, |reason| ModuleStatus::Faulted(reason.clone()))
    }
}
