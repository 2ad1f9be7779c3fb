//! Clip playback primitive
//!
//! A [`Clip`] is the per-tile audio resource: something that can play, pause,
//! seek and change volume, and that reports when it reaches its natural end.
//! The board never decodes or mixes audio itself; it only drives clips.
//!
//! - [`VirtualClip`]: clock-driven transport used by the headless player and tests
//! - [`probe_duration`]: reads the clip length from stored bytes

mod probe;
mod virtual_clip;

pub use probe::probe_duration;
pub use virtual_clip::{VirtualClip, VirtualClipFactory};

use std::time::Duration;

use crate::store::ClipBlob;

/// Playable audio resource owned by exactly one tile
pub trait Clip {
    /// Start or resume playback; restarts from zero if the clip had ended
    fn play(&mut self);

    /// Pause, keeping the current position
    fn pause(&mut self);

    /// Move the playhead (clamped to the duration when it is known)
    fn seek(&mut self, position: Duration);

    fn position(&self) -> Duration;

    /// Clip length, `None` until metadata is available
    fn duration(&self) -> Option<Duration>;

    fn volume(&self) -> f32;

    /// Set the gain, clamped to `0.0..=1.0`
    fn set_volume(&mut self, volume: f32);

    fn is_paused(&self) -> bool;

    /// Whether playback stopped because the end was reached
    fn has_ended(&self) -> bool;

    /// Consume the end-of-playback notification
    ///
    /// Returns true exactly once per natural end.
    fn take_ended(&mut self) -> bool;

    /// Drop the underlying source; the clip is unusable afterwards
    fn release(&mut self);
}

/// Builds clips from stored clip bytes
pub trait ClipFactory {
    fn open(&self, blob: &ClipBlob) -> Box<dyn Clip>;
}

/// Playback progress in percent, or `None` while the duration is unknown or zero
pub fn progress_percent(clip: &dyn Clip) -> Option<f32> {
    let duration = clip.duration()?;
    if duration.is_zero() {
        return None;
    }
    let ratio = clip.position().as_secs_f64() / duration.as_secs_f64();
    Some((ratio.clamp(0.0, 1.0) * 100.0) as f32)
}
