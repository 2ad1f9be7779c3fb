//! Clock-driven clip transport
//!
//! `VirtualClip` behaves like a media element without producing sound: the
//! playhead advances with the shared clock while playing, stops at the end of
//! the clip and latches an end notification. It is the clip used by the
//! headless player and by every board test.

use std::time::Duration;

use super::{probe_duration, Clip, ClipFactory};
use crate::store::ClipBlob;
use crate::timing::SharedClock;

/// Clip whose playhead is derived from a [`SharedClock`]
pub struct VirtualClip {
    clock: SharedClock,
    duration: Option<Duration>,
    /// Playhead at the last anchor point
    offset: Duration,
    /// Clock time playback (re)started, `None` while paused
    playing_since: Option<Duration>,
    volume: f32,
    ended: bool,
    end_pending: bool,
    released: bool,
}

impl VirtualClip {
    pub fn new(clock: SharedClock, duration: Option<Duration>) -> Self {
        Self {
            clock,
            duration,
            offset: Duration::ZERO,
            playing_since: None,
            volume: 1.0,
            ended: false,
            end_pending: false,
            released: false,
        }
    }

    /// Playhead ignoring the end of the clip
    fn raw_position(&self) -> Duration {
        match self.playing_since {
            Some(since) => self.offset + self.clock.now().saturating_sub(since),
            None => self.offset,
        }
    }

    fn reached_end(&self) -> bool {
        match (self.playing_since, self.duration) {
            (Some(_), Some(duration)) => self.raw_position() >= duration,
            _ => false,
        }
    }

    /// Fold elapsed playback into the stored state, latching a natural end
    fn settle(&mut self) {
        if let (true, Some(duration)) = (self.reached_end(), self.duration) {
            self.offset = duration;
            self.playing_since = None;
            self.ended = true;
            self.end_pending = true;
        }
    }

    /// Whether the clip has been released
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Clip for VirtualClip {
    fn play(&mut self) {
        self.settle();
        if self.released || self.playing_since.is_some() {
            return;
        }
        if self.ended {
            self.offset = Duration::ZERO;
            self.ended = false;
        }
        self.playing_since = Some(self.clock.now());
    }

    fn pause(&mut self) {
        self.settle();
        if self.playing_since.is_some() {
            self.offset = self.raw_position();
            self.playing_since = None;
        }
    }

    fn seek(&mut self, position: Duration) {
        self.settle();
        let position = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.offset = position;
        self.ended = false;
        if self.playing_since.is_some() {
            self.playing_since = Some(self.clock.now());
        }
    }

    fn position(&self) -> Duration {
        let position = self.raw_position();
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn is_paused(&self) -> bool {
        self.playing_since.is_none() || self.reached_end()
    }

    fn has_ended(&self) -> bool {
        self.ended || self.reached_end()
    }

    fn take_ended(&mut self) -> bool {
        self.settle();
        std::mem::take(&mut self.end_pending)
    }

    fn release(&mut self) {
        self.pause();
        self.end_pending = false;
        self.released = true;
    }
}

/// Creates [`VirtualClip`]s, probing each blob for its duration
pub struct VirtualClipFactory {
    clock: SharedClock,
}

impl VirtualClipFactory {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }
}

impl ClipFactory for VirtualClipFactory {
    fn open(&self, blob: &ClipBlob) -> Box<dyn Clip> {
        Box::new(VirtualClip::new(self.clock.clone(), probe_duration(blob)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::ManualClock;
    use std::sync::Arc;

    fn clip(duration_ms: Option<u64>) -> (Arc<ManualClock>, VirtualClip) {
        let clock = Arc::new(ManualClock::new());
        let clip = VirtualClip::new(clock.clone(), duration_ms.map(Duration::from_millis));
        (clock, clip)
    }

    #[test]
    fn test_playhead_follows_clock() {
        let (clock, mut clip) = clip(Some(1000));
        assert!(clip.is_paused());

        clip.play();
        clock.advance(Duration::from_millis(300));
        assert_eq!(clip.position(), Duration::from_millis(300));

        clip.pause();
        clock.advance(Duration::from_millis(500));
        assert_eq!(clip.position(), Duration::from_millis(300));

        clip.play();
        clock.advance(Duration::from_millis(100));
        assert_eq!(clip.position(), Duration::from_millis(400));
    }

    #[test]
    fn test_natural_end_latches_once() {
        let (clock, mut clip) = clip(Some(500));
        clip.play();
        clock.advance(Duration::from_millis(800));

        assert!(clip.has_ended());
        assert!(clip.is_paused());
        assert_eq!(clip.position(), Duration::from_millis(500));
        assert!(clip.take_ended());
        assert!(!clip.take_ended());
    }

    #[test]
    fn test_play_after_end_restarts() {
        let (clock, mut clip) = clip(Some(500));
        clip.play();
        clock.advance(Duration::from_millis(600));
        assert!(clip.take_ended());

        clip.play();
        clock.advance(Duration::from_millis(100));
        assert!(!clip.has_ended());
        assert_eq!(clip.position(), Duration::from_millis(100));
    }

    #[test]
    fn test_seek_while_playing() {
        let (clock, mut clip) = clip(Some(2000));
        clip.play();
        clock.advance(Duration::from_millis(700));
        clip.seek(Duration::ZERO);
        clock.advance(Duration::from_millis(50));
        assert_eq!(clip.position(), Duration::from_millis(50));
        assert!(!clip.is_paused());
    }

    #[test]
    fn test_unknown_duration_never_ends() {
        let (clock, mut clip) = clip(None);
        clip.play();
        clock.advance(Duration::from_secs(3600));
        assert!(!clip.has_ended());
        assert!(!clip.take_ended());
        assert!(crate::clip::progress_percent(&clip).is_none());
    }

    #[test]
    fn test_volume_clamped() {
        let (_clock, mut clip) = clip(Some(100));
        clip.set_volume(1.5);
        assert_eq!(clip.volume(), 1.0);
        clip.set_volume(-0.2);
        assert_eq!(clip.volume(), 0.0);
    }

    #[test]
    fn test_released_clip_stays_silent() {
        let (clock, mut clip) = clip(Some(1000));
        clip.play();
        clip.release();
        clip.play();
        clock.advance(Duration::from_millis(100));
        assert!(clip.is_released());
        assert!(clip.is_paused());
    }

    #[test]
    fn test_progress_percent() {
        let (clock, mut clip) = clip(Some(1000));
        clip.play();
        clock.advance(Duration::from_millis(250));
        let percent = crate::clip::progress_percent(&clip).unwrap();
        assert!((percent - 25.0).abs() < 0.01);
    }
}
