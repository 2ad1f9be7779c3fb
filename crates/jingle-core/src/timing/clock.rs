//! Monotonic clocks
//!
//! Timestamps are `Duration`s since the clock's origin.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;
}

/// Clock shared between the board and every clip it owns
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock backed by [`Instant`]
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for deterministic tests
///
/// Millisecond resolution; the value only moves when [`advance`](Self::advance)
/// or [`set`](Self::set) is called.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::Relaxed);
    }

    /// Jump to an absolute time; moving backwards is ignored
    pub fn set(&self, at: Duration) {
        self.millis.fetch_max(at.as_millis() as u64, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(Duration::from_millis(40));
        clock.advance(Duration::from_millis(60));
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_manual_clock_never_goes_back() {
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(3));
        clock.set(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_shared_clock_coercion() {
        let manual = Arc::new(ManualClock::new());
        let shared: SharedClock = manual.clone();
        manual.advance(Duration::from_millis(5));
        assert_eq!(shared.now(), Duration::from_millis(5));
    }
}
