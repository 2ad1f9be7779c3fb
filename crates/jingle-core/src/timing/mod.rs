//! Time sources and cancellable timers
//!
//! The board runs on a single cooperative event loop. Everything that waits
//! (crossfade ticks, delayed volume restores) is a task in the [`Scheduler`],
//! and every timestamp comes from a [`Clock`], so tests can drive the whole
//! board with a [`ManualClock`].

mod clock;
mod scheduler;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use scheduler::{DueTask, Scheduler, TaskHandle, TimerTask};
