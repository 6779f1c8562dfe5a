//! Stock runtime modules
//!
//! Small modules that any host can register: a no-op stand-in, a frame-rate
//! reporter and a per-frame trace writer.

mod frame_stats;
mod null;
mod trace;

pub use frame_stats::FrameStatsModule;
pub use null::NullModule;
pub use trace::TraceModule;
