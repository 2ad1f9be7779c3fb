//! Tile - one clip with its display and playback state
//!
//! A tile owns its clip for its whole life: the clip is opened when the tile
//! is materialized and released only when the tile is deleted. Timers that
//! act on the tile are tracked here so every exit path can cancel them.

use std::time::Duration;

use crate::clip::{progress_percent, Clip};
use crate::store::{ClipBlob, ClipRecord};
use crate::timing::{Scheduler, TaskHandle};
use crate::types::{ColorKey, PlaybackState, TileId};

/// A clickable clip on the board
pub struct Tile {
    id: TileId,
    name: String,
    color: ColorKey,
    /// Stored bytes, kept for upserts
    blob: ClipBlob,
    clip: Box<dyn Clip>,
    state: PlaybackState,
    /// Tick task of the crossfade this tile takes part in
    fade_task: Option<TaskHandle>,
    /// Pending delayed volume restore
    restore_task: Option<TaskHandle>,
}

impl Tile {
    /// Materialize an idle tile from a stored record and its opened clip
    pub fn new(record: ClipRecord, clip: Box<dyn Clip>) -> Self {
        Self {
            id: record.id,
            name: record.name,
            color: record.color,
            blob: record.blob,
            clip,
            state: PlaybackState::Idle,
            fade_task: None,
            restore_task: None,
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> ColorKey {
        self.color
    }

    pub(crate) fn set_color(&mut self, color: ColorKey) {
        self.color = color;
    }

    pub fn blob(&self) -> &ClipBlob {
        &self.blob
    }

    /// Store record for this tile with a different color
    pub(crate) fn record_with_color(&self, color: ColorKey) -> ClipRecord {
        ClipRecord {
            id: self.id,
            name: self.name.clone(),
            blob: self.blob.clone(),
            color,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            log::debug!(
                "Tile {} '{}': {} -> {}",
                self.id,
                self.name,
                self.state.name(),
                state.name()
            );
            self.state = state;
        }
    }

    pub fn clip(&self) -> &dyn Clip {
        self.clip.as_ref()
    }

    pub(crate) fn clip_mut(&mut self) -> &mut dyn Clip {
        self.clip.as_mut()
    }

    pub fn volume(&self) -> f32 {
        self.clip.volume()
    }

    pub fn position(&self) -> Duration {
        self.clip.position()
    }

    /// Progress bar value, `None` while the clip is not ready
    pub fn progress(&self) -> Option<f32> {
        progress_percent(self.clip.as_ref())
    }

    pub fn fade_task(&self) -> Option<TaskHandle> {
        self.fade_task
    }

    pub(crate) fn set_fade_task(&mut self, task: Option<TaskHandle>) {
        self.fade_task = task;
    }

    pub fn restore_task(&self) -> Option<TaskHandle> {
        self.restore_task
    }

    /// Replace the pending volume restore, cancelling the previous one
    pub(crate) fn set_restore_task(&mut self, scheduler: &mut Scheduler, task: TaskHandle) {
        self.cancel_restore(scheduler);
        self.restore_task = Some(task);
    }

    /// Cancel the pending volume restore, if any
    pub(crate) fn cancel_restore(&mut self, scheduler: &mut Scheduler) {
        if let Some(task) = self.restore_task.take() {
            task.cancel(scheduler);
        }
    }

    /// The restore fired; forget the handle without cancelling
    pub(crate) fn restore_fired(&mut self, task: TaskHandle) -> bool {
        if self.restore_task == Some(task) {
            self.restore_task = None;
            true
        } else {
            false
        }
    }

    /// Whether any timer still refers to this tile
    pub fn has_pending_timers(&self) -> bool {
        self.fade_task.is_some() || self.restore_task.is_some()
    }

    /// Pause and rewind the clip and go idle
    pub(crate) fn stop(&mut self) {
        self.clip.pause();
        self.clip.seek(Duration::ZERO);
        self.set_state(PlaybackState::Idle);
    }

    /// Cancel every timer owned by the tile and release the clip
    pub(crate) fn dispose(&mut self, scheduler: &mut Scheduler) {
        self.cancel_restore(scheduler);
        if let Some(task) = self.fade_task.take() {
            task.cancel(scheduler);
        }
        self.clip.release();
        self.state = PlaybackState::Idle;
    }
}

impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("color", &self.color)
            .field("state", &self.state)
            .field("volume", &self.clip.volume())
            .field("position", &self.clip.position())
            .finish()
    }
}
