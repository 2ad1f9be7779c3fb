//! Board facade
//!
//! [`Board`] is what a front-end talks to. It owns the tile registry, the
//! timer queue and the crossfade engine, routes clicks to the playback
//! controller or the crossfade engine depending on the crossfade toggle, and
//! reports what changed as [`BoardEvent`]s.
//!
//! The board is driven by a single event loop: user actions call methods
//! directly, and [`Board::pump`] must be called regularly (every few tens of
//! milliseconds) to deliver clip end notifications and fire due timers.

use crossbeam::channel::{Receiver, Sender, TrySendError};
use std::time::Duration;

use crate::clip::ClipFactory;
use crate::config::CrossfadeConfig;
use crate::crossfade::{CrossfadeEngine, CrossfadeSession, FadeCurve};
use crate::error::{BoardError, BoardResult};
use crate::playback;
use crate::registry::TileRegistry;
use crate::settings::{BoardSettings, ImportPlan, ImportReport, SettingsDocument};
use crate::store::{ClipBlob, ClipStore};
use crate::tile::Tile;
use crate::timing::{Clock, Scheduler, SharedClock, TaskHandle, TimerTask};
use crate::types::{effective_fade_seconds, ColorKey, PlaybackState, TileId};

/// Capacity of the event channel; events beyond it are dropped
const EVENT_CAPACITY: usize = 1024;

/// Notifications for the front-end
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    TileAdded { id: TileId, name: String },
    TileRemoved(TileId),
    StateChanged {
        id: TileId,
        from: PlaybackState,
        to: PlaybackState,
    },
    ColorChanged { id: TileId, color: ColorKey },
    /// Playback progress in percent (only for clips with a known duration)
    Progress { id: TileId, percent: f32 },
    FadeStarted { outgoing: TileId, incoming: TileId },
    FadeFinished { outgoing: TileId, incoming: TileId },
    /// Presentation order changed
    Reordered,
    /// An imported tile entry matched no tile
    ImportSkipped { name: String },
    Cleared,
}

/// A clip selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// The soundboard
pub struct Board {
    registry: TileRegistry,
    scheduler: Scheduler,
    engine: CrossfadeEngine,
    clock: SharedClock,
    crossfade_enabled: bool,
    fade_seconds: u32,
    event_tx: Sender<BoardEvent>,
    event_rx: Receiver<BoardEvent>,
}

impl Board {
    pub fn new(
        store: Box<dyn ClipStore>,
        factory: Box<dyn ClipFactory>,
        clock: SharedClock,
        crossfade: &CrossfadeConfig,
    ) -> Self {
        let (event_tx, event_rx) = crossbeam::channel::bounded(EVENT_CAPACITY);
        Self {
            registry: TileRegistry::new(store, factory),
            scheduler: Scheduler::new(),
            engine: CrossfadeEngine::new(crossfade.curve),
            clock,
            crossfade_enabled: crossfade.enabled,
            fade_seconds: effective_fade_seconds(i64::from(crossfade.fade_seconds)),
            event_tx,
            event_rx,
        }
    }

    /// Materialize every stored clip
    ///
    /// If the store cannot be read the current tiles, and any crossfade
    /// between them, carry on untouched.
    pub fn load(&mut self) -> BoardResult<usize> {
        let count = self.registry.load(&mut self.scheduler)?;
        self.engine.clear(&mut self.scheduler);
        let added: Vec<BoardEvent> = self
            .registry
            .list()
            .map(|t| BoardEvent::TileAdded {
                id: t.id(),
                name: t.name().to_string(),
            })
            .collect();
        for event in added {
            self.publish(event);
        }
        Ok(count)
    }

    /// Receiver for board events
    pub fn subscribe(&self) -> Receiver<BoardEvent> {
        self.event_rx.clone()
    }

    fn publish(&self, event: BoardEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::trace!("Board: Event queue full, dropping {:?}", event)
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Run `f` and publish the state and session changes it caused
    fn tracked<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let before: Vec<(TileId, PlaybackState)> =
            self.registry.list().map(|t| (t.id(), t.state())).collect();
        let session_before = self.session_key();

        let result = f(self);

        let mut events = Vec::new();
        let session_after = self.session_key();
        if session_before != session_after {
            if let Some((outgoing, incoming, _)) = session_before {
                events.push(BoardEvent::FadeFinished { outgoing, incoming });
            }
        }
        for (id, from) in before {
            if let Some(tile) = self.registry.get(id) {
                if tile.state() != from {
                    events.push(BoardEvent::StateChanged {
                        id,
                        from,
                        to: tile.state(),
                    });
                }
            }
        }
        if session_before != session_after {
            if let Some((outgoing, incoming, _)) = session_after {
                events.push(BoardEvent::FadeStarted { outgoing, incoming });
            }
        }
        for event in events {
            self.publish(event);
        }
        result
    }

    fn session_key(&self) -> Option<(TileId, TileId, TaskHandle)> {
        self.engine
            .session()
            .map(|s| (s.outgoing(), s.incoming(), s.tick_task()))
    }

    fn require(&self, id: TileId) -> BoardResult<&Tile> {
        self.registry.get(id).ok_or(BoardError::TileNotFound(id))
    }

    /// Tile click
    ///
    /// With crossfade off the tile toggles on its own; with crossfade on the
    /// click goes to the crossfade engine. The toggle is read here, at click
    /// time.
    pub fn click(&mut self, id: TileId) -> BoardResult<()> {
        self.require(id)?;
        let now = self.now();
        let crossfade = self.crossfade_enabled;
        let fade_seconds = self.fade_seconds;
        self.tracked(|board| {
            board.deliver_ended(now);
            let Board {
                registry,
                scheduler,
                engine,
                ..
            } = board;

            if crossfade {
                engine.click(id, fade_seconds, registry, scheduler, now);
            } else if engine.is_fading(id) {
                engine.interrupt(id, registry, scheduler, now);
            } else if let Some(tile) = registry.get_mut(id) {
                if !playback::toggle(tile, scheduler).is_playing() {
                    engine.release_target(id);
                }
            }
        });
        Ok(())
    }

    /// Reset button: rewind without changing play/pause state
    pub fn reset(&mut self, id: TileId) -> BoardResult<()> {
        let tile = self
            .registry
            .get_mut(id)
            .ok_or(BoardError::TileNotFound(id))?;
        playback::reset(tile);
        if let Some(percent) = tile.progress() {
            self.publish(BoardEvent::Progress { id, percent });
        }
        Ok(())
    }

    /// Color picker; unknown color names become the default color
    pub fn set_color(&mut self, id: TileId, color: &str) -> BoardResult<ColorKey> {
        let color = ColorKey::parse_or_default(color);
        if !self.registry.set_color(id, color)? {
            return Err(BoardError::TileNotFound(id));
        }
        self.publish(BoardEvent::ColorChanged { id, color });
        Ok(color)
    }

    /// Delete a tile after the user confirmed
    ///
    /// `confirm` is asked before anything changes; declining, or an unknown
    /// id, leaves the board untouched and returns `Ok(false)`.
    pub fn delete(&mut self, id: TileId, confirm: impl FnOnce(&Tile) -> bool) -> BoardResult<bool> {
        let Some(tile) = self.registry.get(id) else {
            return Ok(false);
        };
        if !confirm(tile) {
            log::info!("Board::delete: Deletion of tile {} declined", id);
            return Ok(false);
        }

        let now = self.now();
        self.tracked(|board| -> BoardResult<()> {
            board.registry.delete(id, &mut board.scheduler)?;
            board
                .engine
                .forget_tile(id, &mut board.registry, &mut board.scheduler, now);
            Ok(())
        })?;
        self.publish(BoardEvent::TileRemoved(id));
        Ok(true)
    }

    /// Store the selected files and add a tile for each
    ///
    /// Files are added one at a time; a store failure stops the batch and
    /// leaves the files before it in place.
    pub fn add_files(&mut self, files: Vec<ClipFile>) -> BoardResult<Vec<TileId>> {
        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let blob = ClipBlob {
                bytes: file.bytes,
                mime_type: file.mime_type,
            };
            let id = self.registry.create(&file.name, blob, None)?;
            self.publish(BoardEvent::TileAdded {
                id,
                name: file.name,
            });
            ids.push(id);
        }
        if !ids.is_empty() {
            self.publish(BoardEvent::Reordered);
        }
        Ok(ids)
    }

    /// Delete every clip and stop everything
    pub fn clear(&mut self) -> BoardResult<()> {
        self.registry.clear(&mut self.scheduler)?;
        self.engine.clear(&mut self.scheduler);
        self.publish(BoardEvent::Cleared);
        Ok(())
    }

    /// Move a tile within the presentation order
    pub fn move_tile(&mut self, id: TileId, index: usize) -> BoardResult<()> {
        if !self.registry.move_tile(id, index) {
            return Err(BoardError::TileNotFound(id));
        }
        self.publish(BoardEvent::Reordered);
        Ok(())
    }

    pub fn crossfade_enabled(&self) -> bool {
        self.crossfade_enabled
    }

    pub fn set_crossfade_enabled(&mut self, enabled: bool) {
        log::info!("Board: Crossfade {}", if enabled { "enabled" } else { "disabled" });
        self.crossfade_enabled = enabled;
    }

    pub fn fade_seconds(&self) -> u32 {
        self.fade_seconds
    }

    /// Fade length for the next crossfade; zero falls back to the default
    pub fn set_fade_seconds(&mut self, seconds: u32) {
        self.fade_seconds = effective_fade_seconds(i64::from(seconds));
    }

    pub fn fade_curve(&self) -> FadeCurve {
        self.engine.curve()
    }

    pub fn set_fade_curve(&mut self, curve: FadeCurve) {
        self.engine.set_curve(curve);
    }

    /// Settings document in presentation order
    pub fn export_settings(&self) -> SettingsDocument {
        SettingsDocument::capture(
            &self.registry,
            BoardSettings {
                crossfade_enabled: self.crossfade_enabled,
                fade_seconds: self.fade_seconds,
            },
        )
    }

    /// Apply an exported settings document
    ///
    /// A document that is not a JSON object is rejected before anything
    /// changes. Entries without a matching tile are skipped. Board settings
    /// are only taken over once every tile color has been stored.
    pub fn import_settings(&mut self, text: &str) -> BoardResult<ImportReport> {
        let plan = ImportPlan::parse(text)?;
        let report = plan.apply_tiles(&mut self.registry)?;

        if let Some(enabled) = plan.crossfade_enabled {
            self.set_crossfade_enabled(enabled);
        }
        if let Some(seconds) = plan.fade_seconds {
            self.set_fade_seconds(seconds);
        }

        for id in &report.matched {
            if let Some(tile) = self.registry.get(*id) {
                self.publish(BoardEvent::ColorChanged {
                    id: *id,
                    color: tile.color(),
                });
            }
        }
        for name in &report.unmatched {
            self.publish(BoardEvent::ImportSkipped { name: name.clone() });
        }
        self.publish(BoardEvent::Reordered);
        Ok(report)
    }

    /// Deliver clip end notifications and fire due timers
    pub fn pump(&mut self) {
        let now = self.now();
        self.tracked(|board| {
            board.deliver_ended(now);
            while let Some(due) = board.scheduler.pop_due(now) {
                match due.task {
                    TimerTask::FadeTick => {
                        board
                            .engine
                            .on_tick(&due, &mut board.registry, &mut board.scheduler)
                    }
                    TimerTask::VolumeRestore(id) => {
                        board.engine.restore_volume(&due, id, &mut board.registry)
                    }
                }
            }
            board.deliver_ended(now);
        });

        let progress: Vec<BoardEvent> = self
            .registry
            .list()
            .filter(|t| t.state().is_playing())
            .filter_map(|t| {
                t.progress().map(|percent| BoardEvent::Progress {
                    id: t.id(),
                    percent,
                })
            })
            .collect();
        for event in progress {
            self.publish(event);
        }
    }

    /// Run the natural-end handling for every clip that finished
    fn deliver_ended(&mut self, now: Duration) {
        let ids = self.registry.ids().to_vec();
        for id in ids {
            let ended = self
                .registry
                .get_mut(id)
                .is_some_and(|t| t.clip_mut().take_ended());
            if !ended {
                continue;
            }

            log::debug!("Board: Tile {} reached its end", id);
            self.engine
                .on_clip_ended(id, &mut self.registry, &mut self.scheduler, now);
            if let Some(tile) = self.registry.get_mut(id) {
                playback::finish_natural_end(tile, &mut self.scheduler);
            }
        }
    }

    /// When [`pump`](Self::pump) next has timer work to do
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Tiles in presentation order
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.registry.list()
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.registry.get(id)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn session(&self) -> Option<&CrossfadeSession> {
        self.engine.session()
    }

    pub fn active_target(&self) -> Option<TileId> {
        self.engine.active_target()
    }

    /// Number of live timers
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Whether clips survive a restart
    pub fn is_durable(&self) -> bool {
        self.registry.store().is_durable()
    }
}
