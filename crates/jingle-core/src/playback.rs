//! Playback controller for plain (non-crossfade) mode
//!
//! Each tile toggles independently between `Idle` and `Playing`; any number
//! of tiles may play at once. The natural-end handler is shared with
//! crossfade mode.

use std::time::Duration;

use crate::tile::Tile;
use crate::timing::Scheduler;
use crate::types::PlaybackState;

/// Toggle a tile: play if idle, pause if playing
///
/// Playback resumes from the current position. A pending volume restore is
/// applied immediately so the clip never starts muted.
pub fn toggle(tile: &mut Tile, scheduler: &mut Scheduler) -> PlaybackState {
    if tile.state().is_playing() {
        tile.clip_mut().pause();
        tile.set_state(PlaybackState::Idle);
    } else {
        if tile.restore_task().is_some() {
            tile.cancel_restore(scheduler);
            tile.clip_mut().set_volume(1.0);
        }
        tile.clip_mut().play();
        tile.set_state(PlaybackState::Playing);
    }
    tile.state()
}

/// Rewind to the start without changing play/pause state
pub fn reset(tile: &mut Tile) {
    tile.clip_mut().seek(Duration::ZERO);
    log::debug!("reset: Tile {} rewound", tile.id());
}

/// Bring a tile back to rest after its clip played to the end
///
/// Safe to call repeatedly and when no timers are pending.
pub fn finish_natural_end(tile: &mut Tile, scheduler: &mut Scheduler) {
    tile.cancel_restore(scheduler);
    if let Some(task) = tile.fade_task() {
        task.cancel(scheduler);
        tile.set_fade_task(None);
    }
    let clip = tile.clip_mut();
    clip.seek(Duration::ZERO);
    clip.set_volume(1.0);
    tile.set_state(PlaybackState::Idle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipFactory;
    use crate::store::ClipRecord;
    use crate::test_util::{blob, millis, secs, FixedClipFactory};
    use crate::timing::{ManualClock, TimerTask};
    use crate::types::{ColorKey, TileId};
    use std::sync::Arc;

    fn tile(clock: &Arc<ManualClock>) -> Tile {
        let factory = FixedClipFactory::new(clock.clone(), Some(secs(10)));
        let record = ClipRecord {
            id: TileId(1),
            name: "Fanfare".to_string(),
            blob: blob(),
            color: ColorKey::Dark,
        };
        let clip = factory.open(&record.blob);
        Tile::new(record, clip)
    }

    #[test]
    fn test_clicks_alternate_strictly() {
        let clock = Arc::new(ManualClock::new());
        let mut scheduler = Scheduler::new();
        let mut tile = tile(&clock);

        assert_eq!(tile.state(), PlaybackState::Idle);
        let mut expected = PlaybackState::Playing;
        for _ in 0..9 {
            assert_eq!(toggle(&mut tile, &mut scheduler), expected);
            clock.advance(millis(300));
            expected = match expected {
                PlaybackState::Playing => PlaybackState::Idle,
                _ => PlaybackState::Playing,
            };
        }
    }

    #[test]
    fn test_pause_keeps_position() {
        let clock = Arc::new(ManualClock::new());
        let mut scheduler = Scheduler::new();
        let mut tile = tile(&clock);

        toggle(&mut tile, &mut scheduler);
        clock.advance(secs(3));
        toggle(&mut tile, &mut scheduler);
        clock.advance(secs(3));
        assert_eq!(tile.position(), secs(3));

        toggle(&mut tile, &mut scheduler);
        clock.advance(secs(1));
        assert_eq!(tile.position(), secs(4));
    }

    #[test]
    fn test_reset_keeps_state() {
        let clock = Arc::new(ManualClock::new());
        let mut scheduler = Scheduler::new();
        let mut tile = tile(&clock);

        toggle(&mut tile, &mut scheduler);
        clock.advance(secs(2));
        reset(&mut tile);
        assert_eq!(tile.state(), PlaybackState::Playing);
        assert_eq!(tile.position(), secs(0));
        clock.advance(secs(1));
        assert_eq!(tile.position(), secs(1));
    }

    #[test]
    fn test_play_applies_pending_restore() {
        let clock = Arc::new(ManualClock::new());
        let mut scheduler = Scheduler::new();
        let mut tile = tile(&clock);
        tile.clip_mut().set_volume(0.0);
        let restore = scheduler.schedule_once(secs(10), TimerTask::VolumeRestore(tile.id()));
        tile.set_restore_task(&mut scheduler, restore);

        toggle(&mut tile, &mut scheduler);
        assert_eq!(tile.volume(), 1.0);
        assert!(!scheduler.is_pending(restore));
    }

    #[test]
    fn test_natural_end_is_idempotent() {
        let clock = Arc::new(ManualClock::new());
        let mut scheduler = Scheduler::new();
        let mut tile = tile(&clock);
        toggle(&mut tile, &mut scheduler);
        tile.clip_mut().set_volume(0.4);
        clock.advance(secs(11));

        finish_natural_end(&mut tile, &mut scheduler);
        finish_natural_end(&mut tile, &mut scheduler);
        assert_eq!(tile.state(), PlaybackState::Idle);
        assert_eq!(tile.volume(), 1.0);
        assert_eq!(tile.progress(), Some(0.0));
        assert_eq!(scheduler.pending_count(), 0);
    }
}
