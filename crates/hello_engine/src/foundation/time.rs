//! Time management utilities

use std::time::{Duration, Instant};

/// Frame timer tracking delta time, total time and frame count
#[derive(Debug, Clone)]
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer starting now
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(elapsed);
    }

    /// Record a frame that took `delta`
    pub fn advance(&mut self, delta: Duration) {
        self.delta_time = delta.as_secs_f32();
        self.total_time += self.delta_time;
        self.frame_count += 1;
    }

    /// Time since the last frame in seconds
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Total elapsed time across all recorded frames
    pub const fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of recorded frames
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average FPS since timer creation
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }

    /// FPS based on the last frame time
    pub fn current_fps(&self) -> f32 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring elapsed time
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    /// Create a stopwatch and start it immediately
    pub fn start_new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            elapsed: Duration::ZERO,
        }
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Total elapsed time, including the running segment
    pub fn elapsed(&self) -> Duration {
        let running = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + running
    }

    /// Elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    /// Whether the stopwatch is currently running
    pub const fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

/// Fixed-rate frame pacing
///
/// Sleeps between frames so the loop runs at most `rate` times per second.
/// When the loop falls more than one period behind, the schedule resyncs to
/// the current time instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct FramePacer {
    period: Duration,
    next_deadline: Option<Instant>,
}

impl FramePacer {
    /// Pacer for `rate` frames per second
    ///
    /// Returns `None` unless `rate` is positive and its period fits in a
    /// [`Duration`].
    pub fn new(rate: f32) -> Option<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return None;
        }
        let period = Duration::try_from_secs_f64(1.0 / f64::from(rate)).ok()?;
        Some(Self {
            period,
            next_deadline: None,
        })
    }

    /// Target time between frames
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// How long to wait at `now` before the next frame may start
    ///
    /// Also advances the internal schedule.
    pub fn schedule(&mut self, now: Instant) -> Duration {
        let deadline = match self.next_deadline {
            None => now,
            Some(deadline) if now > deadline + self.period => {
                log::trace!("Frame pacer fell behind, resyncing");
                now
            }
            Some(deadline) => deadline,
        };
        self.next_deadline = Some(deadline + self.period);
        deadline.saturating_duration_since(now)
    }

    /// Block until the next frame is due
    pub fn wait(&mut self) {
        let delay = self.schedule(Instant::now());
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
