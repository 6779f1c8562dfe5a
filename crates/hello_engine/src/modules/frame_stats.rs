//! Frame rate reporting module

use crate::foundation::time::Timer;
use crate::module::{ModuleError, RuntimeModule};

/// Logs the average frame rate every `report_interval` frames
#[derive(Debug)]
pub struct FrameStatsModule {
    report_interval: u64,
    timer: Option<Timer>,
    reports: u64,
}

impl FrameStatsModule {
    /// Report every `report_interval` frames; `0` disables reporting
    pub const fn new(report_interval: u64) -> Self {
        Self {
            report_interval,
            timer: None,
            reports: 0,
        }
    }

    /// Frames counted since initialization
    pub fn frames(&self) -> u64 {
        self.timer.as_ref().map_or(0, Timer::frame_count)
    }

    /// Number of reports logged
    pub const fn reports(&self) -> u64 {
        self.reports
    }
}

impl Default for FrameStatsModule {
    fn default() -> Self {
        Self::new(60)
    }
}

impl RuntimeModule for FrameStatsModule {
    fn name(&self) -> &str {
        "frame_stats"
    }

    fn initialize(&mut self) -> Result<(), ModuleError> {
        self.timer = Some(Timer::new());
        self.reports = 0;
        Ok(())
    }

    fn tick(&mut self) {
        let Some(timer) = self.timer.as_mut() else {
            log::warn!("frame_stats ticked without a timer");
            return;
        };
        timer.update();

        if self.report_interval > 0 && timer.frame_count() % self.report_interval == 0 {
            self.reports += 1;
            log::info!(
                "Frame {}: {:.1} FPS average, {:.2} ms last frame",
                timer.frame_count(),
                timer.average_fps(),
                timer.delta_time() * 1000.0
            );
        }
    }

    fn finalize(&mut self) {
        if let Some(timer) = self.timer.take() {
            log::info!(
                "frame_stats: {} frames in {:.2}s",
                timer.frame_count(),
                timer.total_time()
            );
        }
    }
}
