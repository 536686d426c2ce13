//! Timer core
//!
//! The host-independent pieces: the countdown state machine, duration
//! parsing and formatting, the repeat-notification scheduler, and the
//! clock seam they are driven through.

pub mod clock;
pub mod duration;
pub mod repeat;
pub mod timer;
pub mod tokio_clock;

// Re-export the main types
pub use clock::{Clock, ClockHandle, ManualClock, Tick};
pub use duration::{format_remaining, parse_duration, DisplayFormat};
pub use repeat::RepeatScheduler;
pub use timer::{Timer, TimerSnapshot, TimerState};
pub use tokio_clock::TokioClock;
