//! Crossfade engine: the single live session and the active target

use std::time::Duration;

use super::FadeCurve;
use crate::registry::TileRegistry;
use crate::tile::Tile;
use crate::timing::{DueTask, Scheduler, TaskHandle, TimerTask};
use crate::types::{PlaybackState, TileId, DEFAULT_FADE_SECONDS, FADE_STEPS, VOLUME_RESTORE_DELAY};

/// A live transition between two tiles
#[derive(Debug, Clone, PartialEq)]
pub struct CrossfadeSession {
    outgoing: TileId,
    incoming: TileId,
    started_at: Duration,
    duration: Duration,
    steps_total: u32,
    steps_done: u32,
    /// Outgoing volume when the fade began; its ramp scales from here
    outgoing_start: f32,
    tick: TaskHandle,
}

impl CrossfadeSession {
    pub fn outgoing(&self) -> TileId {
        self.outgoing
    }

    pub fn incoming(&self) -> TileId {
        self.incoming
    }

    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn steps_total(&self) -> u32 {
        self.steps_total
    }

    pub fn steps_done(&self) -> u32 {
        self.steps_done
    }

    pub fn tick_task(&self) -> TaskHandle {
        self.tick
    }

    /// Fade progress in `[0.0, 1.0]`
    pub fn progress(&self) -> f32 {
        (self.steps_done as f32 / self.steps_total as f32).min(1.0)
    }

    pub fn involves(&self, id: TileId) -> bool {
        self.outgoing == id || self.incoming == id
    }
}

/// Crossfade state for one board
#[derive(Debug, Default)]
pub struct CrossfadeEngine {
    active_target: Option<TileId>,
    session: Option<CrossfadeSession>,
    curve: FadeCurve,
}

impl CrossfadeEngine {
    pub fn new(curve: FadeCurve) -> Self {
        Self {
            active_target: None,
            session: None,
            curve,
        }
    }

    /// Tile a new crossfade would fade from
    pub fn active_target(&self) -> Option<TileId> {
        self.active_target
    }

    pub fn session(&self) -> Option<&CrossfadeSession> {
        self.session.as_ref()
    }

    pub fn curve(&self) -> FadeCurve {
        self.curve
    }

    pub fn set_curve(&mut self, curve: FadeCurve) {
        self.curve = curve;
    }

    /// Whether the tile is one side of the live session
    pub fn is_fading(&self, id: TileId) -> bool {
        self.session.as_ref().is_some_and(|s| s.involves(id))
    }

    /// Forget the active target if it is `id` (the tile stopped elsewhere)
    pub fn release_target(&mut self, id: TileId) {
        if self.active_target == Some(id) {
            log::debug!("CrossfadeEngine: Active target {} released", id);
            self.active_target = None;
        }
    }

    /// Handle a tile click in crossfade mode
    pub fn click(
        &mut self,
        id: TileId,
        fade_seconds: u32,
        registry: &mut TileRegistry,
        scheduler: &mut Scheduler,
        now: Duration,
    ) {
        let Some(tile) = registry.get(id) else {
            return;
        };
        if tile.state().is_playing() {
            self.interrupt(id, registry, scheduler, now);
            return;
        }

        let outgoing = self.active_target.filter(|target| {
            registry
                .get(*target)
                .is_some_and(|t| t.state().is_playing() && !t.clip().is_paused())
        });

        match outgoing {
            Some(outgoing) if outgoing != id => {
                self.begin(outgoing, id, fade_seconds, registry, scheduler, now)
            }
            _ => self.start_solo(id, registry, scheduler),
        }
    }

    /// Start a tile at full volume from the top, without fading
    fn start_solo(&mut self, id: TileId, registry: &mut TileRegistry, scheduler: &mut Scheduler) {
        let Some(tile) = registry.get_mut(id) else {
            return;
        };
        cancel_tile_timers(tile, scheduler);
        let clip = tile.clip_mut();
        clip.seek(Duration::ZERO);
        clip.set_volume(1.0);
        clip.play();
        tile.set_state(PlaybackState::Playing);
        self.active_target = Some(id);
        log::info!("CrossfadeEngine: Tile {} started", id);
    }

    /// Begin fading `outgoing` out and `incoming` in
    fn begin(
        &mut self,
        outgoing: TileId,
        incoming: TileId,
        fade_seconds: u32,
        registry: &mut TileRegistry,
        scheduler: &mut Scheduler,
        now: Duration,
    ) {
        if self.session.is_some() {
            self.finish(registry, scheduler, now);
        }

        let seconds = if fade_seconds == 0 {
            DEFAULT_FADE_SECONDS
        } else {
            fade_seconds
        };
        let duration = Duration::from_secs(u64::from(seconds));
        let interval = duration / FADE_STEPS;

        let outgoing_start = match registry.get_mut(outgoing) {
            Some(tile) => {
                cancel_tile_timers(tile, scheduler);
                tile.set_state(PlaybackState::FadingOut);
                tile.volume()
            }
            None => return,
        };
        if let Some(tile) = registry.get_mut(incoming) {
            cancel_tile_timers(tile, scheduler);
            let clip = tile.clip_mut();
            clip.set_volume(self.curve.incoming_gain(0.0));
            clip.seek(Duration::ZERO);
            clip.play();
            tile.set_state(PlaybackState::FadingIn);
        }

        let tick = scheduler.schedule_repeating(now + interval, interval, TimerTask::FadeTick);
        for id in [outgoing, incoming] {
            if let Some(tile) = registry.get_mut(id) {
                tile.set_fade_task(Some(tick));
            }
        }

        self.active_target = Some(incoming);
        self.session = Some(CrossfadeSession {
            outgoing,
            incoming,
            started_at: now,
            duration,
            steps_total: FADE_STEPS,
            steps_done: 0,
            outgoing_start,
            tick,
        });

        log::info!(
            "CrossfadeEngine: Fading {} -> {} over {}s ({:?} per step, {} curve)",
            outgoing,
            incoming,
            seconds,
            interval,
            self.curve.as_str()
        );
    }

    /// Advance the live session by one step
    pub fn on_tick(&mut self, due: &DueTask, registry: &mut TileRegistry, scheduler: &mut Scheduler) {
        let Some(session) = self.session.as_mut() else {
            scheduler.cancel(due.handle);
            return;
        };
        if session.tick != due.handle {
            log::debug!("CrossfadeEngine: Stale tick {:?} dropped", due.handle);
            scheduler.cancel(due.handle);
            return;
        }

        session.steps_done += 1;
        let t = session.steps_done as f32 / session.steps_total as f32;
        let curve = self.curve;

        if let Some(tile) = registry.get_mut(session.incoming) {
            tile.clip_mut().set_volume(curve.incoming_gain(t));
        }
        let outgoing_done = match registry.get_mut(session.outgoing) {
            Some(tile) => {
                tile.clip_mut()
                    .set_volume(session.outgoing_start * curve.outgoing_gain(t));
                let clip = tile.clip();
                clip.volume() <= 0.0 || clip.is_paused() || clip.has_ended()
            }
            None => true,
        };

        log::trace!(
            "CrossfadeEngine: Step {}/{}",
            session.steps_done,
            session.steps_total
        );

        if session.steps_done >= session.steps_total || outgoing_done {
            self.finish(registry, scheduler, due.deadline);
        }
    }

    /// End the live session normally
    ///
    /// The outgoing tile stops and gets its volume back after the restore
    /// delay; the incoming tile keeps playing at full volume.
    fn finish(&mut self, registry: &mut TileRegistry, scheduler: &mut Scheduler, now: Duration) {
        let Some(session) = self.end_session(registry, scheduler) else {
            return;
        };

        if let Some(tile) = registry.get_mut(session.outgoing) {
            tile.stop();
            let restore = scheduler.schedule_once(
                now + VOLUME_RESTORE_DELAY,
                TimerTask::VolumeRestore(session.outgoing),
            );
            tile.set_restore_task(scheduler, restore);
        }
        if let Some(tile) = registry.get_mut(session.incoming) {
            promote_incoming(tile);
        }

        log::info!(
            "CrossfadeEngine: Fade {} -> {} finished after {} steps",
            session.outgoing,
            session.incoming,
            session.steps_done
        );
    }

    /// Drop the session and its tick, detaching it from both tiles
    fn end_session(
        &mut self,
        registry: &mut TileRegistry,
        scheduler: &mut Scheduler,
    ) -> Option<CrossfadeSession> {
        let session = self.session.take()?;
        session.tick.cancel(scheduler);
        for id in [session.outgoing, session.incoming] {
            if let Some(tile) = registry.get_mut(id) {
                tile.set_fade_task(None);
            }
        }
        Some(session)
    }

    /// Hard stop of a playing tile (crossfade-mode click on a playing tile)
    pub fn interrupt(
        &mut self,
        id: TileId,
        registry: &mut TileRegistry,
        scheduler: &mut Scheduler,
        now: Duration,
    ) {
        let sides = self.session.as_ref().map(|s| (s.outgoing, s.incoming));
        match sides {
            Some((_, incoming)) if incoming == id => {
                // Both ramps halt; the outgoing side keeps playing where it is
                if let Some(session) = self.end_session(registry, scheduler) {
                    if let Some(tile) = registry.get_mut(session.outgoing) {
                        tile.set_state(PlaybackState::Playing);
                    }
                    log::info!(
                        "CrossfadeEngine: Fade {} -> {} aborted at step {}",
                        session.outgoing,
                        session.incoming,
                        session.steps_done
                    );
                }
            }
            Some((outgoing, _)) if outgoing == id => {
                if let Some(session) = self.end_session(registry, scheduler) {
                    if let Some(tile) = registry.get_mut(session.incoming) {
                        promote_incoming(tile);
                    }
                    log::info!(
                        "CrossfadeEngine: Fade {} -> {} cut short at step {}",
                        session.outgoing,
                        session.incoming,
                        session.steps_done
                    );
                }
            }
            _ => {}
        }

        if let Some(tile) = registry.get_mut(id) {
            cancel_tile_timers(tile, scheduler);
            tile.stop();
            tile.clip_mut().set_volume(1.0);
        }
        self.release_target(id);
        log::debug!("CrossfadeEngine: Tile {} interrupted at {:?}", id, now);
    }

    /// A clip reached its natural end
    ///
    /// A live session that involves the tile ends normally; the shared
    /// natural-end handling of the tile itself is left to the caller.
    pub fn on_clip_ended(
        &mut self,
        id: TileId,
        registry: &mut TileRegistry,
        scheduler: &mut Scheduler,
        now: Duration,
    ) {
        if self.is_fading(id) {
            self.finish(registry, scheduler, now);
        }
        self.release_target(id);
    }

    /// The tile is about to be deleted
    pub fn forget_tile(
        &mut self,
        id: TileId,
        registry: &mut TileRegistry,
        scheduler: &mut Scheduler,
        now: Duration,
    ) {
        let sides = self.session.as_ref().map(|s| (s.outgoing, s.incoming));
        match sides {
            Some((_, incoming)) if incoming == id => self.interrupt(id, registry, scheduler, now),
            Some((outgoing, _)) if outgoing == id => self.finish(registry, scheduler, now),
            _ => {}
        }
        self.release_target(id);
    }

    /// Put a faded-out tile's volume back to full
    pub fn restore_volume(&mut self, due: &DueTask, id: TileId, registry: &mut TileRegistry) {
        let Some(tile) = registry.get_mut(id) else {
            return;
        };
        if tile.restore_fired(due.handle) {
            tile.clip_mut().set_volume(1.0);
            log::debug!("CrossfadeEngine: Volume of tile {} restored", id);
        }
    }

    /// Drop the session and the active target (board cleared)
    pub fn clear(&mut self, scheduler: &mut Scheduler) {
        if let Some(session) = self.session.take() {
            session.tick.cancel(scheduler);
        }
        self.active_target = None;
    }
}

fn cancel_tile_timers(tile: &mut Tile, scheduler: &mut Scheduler) {
    tile.cancel_restore(scheduler);
    if let Some(task) = tile.fade_task() {
        task.cancel(scheduler);
        tile.set_fade_task(None);
    }
}

fn promote_incoming(tile: &mut Tile) {
    tile.clip_mut().set_volume(1.0);
    if tile.state() == PlaybackState::FadingIn {
        tile.set_state(PlaybackState::Playing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EphemeralStore;
    use crate::test_util::{blob, millis, secs, FixedClipFactory};
    use crate::timing::{Clock, ManualClock};
    use std::sync::Arc;

    struct Rig {
        clock: Arc<ManualClock>,
        registry: TileRegistry,
        scheduler: Scheduler,
        engine: CrossfadeEngine,
    }

    impl Rig {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new());
            let factory = FixedClipFactory::new(clock.clone(), Some(secs(120)));
            Self {
                clock,
                registry: TileRegistry::new(Box::new(EphemeralStore::new()), Box::new(factory)),
                scheduler: Scheduler::new(),
                engine: CrossfadeEngine::default(),
            }
        }

        fn add(&mut self, name: &str) -> TileId {
            self.registry.create(name, blob(), None).unwrap()
        }

        fn click(&mut self, id: TileId, fade_seconds: u32) {
            let now = self.clock.now();
            self.engine
                .click(id, fade_seconds, &mut self.registry, &mut self.scheduler, now);
        }

        /// Fire due timers one at a time up to `target`
        fn run_until(&mut self, target: Duration, mut on_step: impl FnMut(&Self)) {
            while let Some(deadline) = self.scheduler.next_deadline() {
                if deadline > target {
                    break;
                }
                self.clock.set(deadline);
                let Some(due) = self.scheduler.pop_due(deadline) else {
                    break;
                };
                match due.task {
                    TimerTask::FadeTick => {
                        self.engine
                            .on_tick(&due, &mut self.registry, &mut self.scheduler)
                    }
                    TimerTask::VolumeRestore(id) => {
                        self.engine.restore_volume(&due, id, &mut self.registry)
                    }
                }
                on_step(&*self);
            }
            self.clock.set(target);
        }

        fn state(&self, id: TileId) -> PlaybackState {
            self.registry.get(id).unwrap().state()
        }

        fn volume(&self, id: TileId) -> f32 {
            self.registry.get(id).unwrap().volume()
        }

        fn assert_single_session(&self) {
            let fading_in = self
                .registry
                .list()
                .filter(|t| t.state() == PlaybackState::FadingIn)
                .count();
            let fading_out = self
                .registry
                .list()
                .filter(|t| t.state() == PlaybackState::FadingOut)
                .count();
            assert!(fading_in <= 1 && fading_out <= 1);
            assert_eq!(fading_in, fading_out);
            assert_eq!(self.engine.session().is_some(), fading_in == 1);
        }
    }

    #[test]
    fn test_first_click_starts_without_fade() {
        let mut rig = Rig::new();
        let a = rig.add("A");
        rig.click(a, 5);

        assert_eq!(rig.state(a), PlaybackState::Playing);
        assert_eq!(rig.volume(a), 1.0);
        assert_eq!(rig.engine.active_target(), Some(a));
        assert!(rig.engine.session().is_none());
        assert_eq!(rig.scheduler.pending_count(), 0);
    }

    #[test]
    fn test_two_second_fade_scenario() {
        let mut rig = Rig::new();
        let a = rig.add("A");
        let b = rig.add("B");
        rig.click(a, 2);
        rig.run_until(secs(3), |_| {});

        rig.click(b, 2);
        assert_eq!(rig.state(a), PlaybackState::FadingOut);
        assert_eq!(rig.state(b), PlaybackState::FadingIn);
        assert_eq!(rig.volume(b), 0.0);
        assert_eq!(rig.engine.active_target(), Some(b));

        rig.run_until(secs(5), |_| {});
        assert_eq!(rig.state(a), PlaybackState::Idle);
        assert_eq!(rig.state(b), PlaybackState::Playing);
        assert_eq!(rig.volume(b), 1.0);
        assert_eq!(rig.volume(a), 0.0);
        assert_eq!(rig.registry.get(a).unwrap().position(), Duration::ZERO);
        assert!(rig.engine.session().is_none());

        // Restore fires 10 s after the fade completed, not earlier
        rig.run_until(secs(15) - millis(1), |_| {});
        assert_eq!(rig.volume(a), 0.0);
        rig.run_until(secs(15), |_| {});
        assert_eq!(rig.volume(a), 1.0);
        assert_eq!(rig.state(a), PlaybackState::Idle);
        assert_eq!(rig.scheduler.pending_count(), 0);
    }

    #[test]
    fn test_ramps_are_monotonic_and_states_paired() {
        let mut rig = Rig::new();
        let a = rig.add("A");
        let b = rig.add("B");
        rig.click(a, 3);
        rig.click(b, 3);

        let mut last = (rig.volume(b), rig.volume(a));
        let mut steps = 0;
        rig.run_until(secs(3), |rig| {
            rig.assert_single_session();
            let now = (rig.volume(b), rig.volume(a));
            assert!(now.0 >= last.0, "incoming went down: {:?} -> {:?}", last, now);
            if rig.engine.session().is_some() {
                assert!(now.1 <= last.1, "outgoing went up: {:?} -> {:?}", last, now);
            }
            last = now;
            steps += 1;
        });
        assert_eq!(steps, FADE_STEPS);
        rig.assert_single_session();
    }

    #[test]
    fn test_interrupting_incoming_halts_everything() {
        let mut rig = Rig::new();
        let a = rig.add("A");
        let b = rig.add("B");
        rig.click(a, 5);
        rig.click(b, 5);
        rig.run_until(secs(2), |_| {});

        let frozen = rig.volume(a);
        assert!(frozen > 0.0 && frozen < 1.0);

        rig.click(b, 5);
        assert_eq!(rig.state(b), PlaybackState::Idle);
        assert_eq!(rig.registry.get(b).unwrap().position(), Duration::ZERO);
        assert_eq!(rig.state(a), PlaybackState::Playing);
        assert!(rig.engine.session().is_none());
        assert_eq!(rig.engine.active_target(), None);
        assert_eq!(rig.scheduler.pending_count(), 0);
        assert!(!rig.registry.get(a).unwrap().has_pending_timers());
        assert!(!rig.registry.get(b).unwrap().has_pending_timers());

        rig.run_until(secs(10), |_| {});
        assert_eq!(rig.volume(a), frozen);
    }

    #[test]
    fn test_interrupting_outgoing_keeps_incoming() {
        let mut rig = Rig::new();
        let a = rig.add("A");
        let b = rig.add("B");
        rig.click(a, 5);
        rig.click(b, 5);
        rig.run_until(secs(1), |_| {});

        rig.click(a, 5);
        assert_eq!(rig.state(a), PlaybackState::Idle);
        assert_eq!(rig.volume(a), 1.0);
        assert_eq!(rig.state(b), PlaybackState::Playing);
        assert_eq!(rig.volume(b), 1.0);
        assert_eq!(rig.engine.active_target(), Some(b));
        assert_eq!(rig.scheduler.pending_count(), 0);
    }

    #[test]
    fn test_third_tile_supersedes_session() {
        let mut rig = Rig::new();
        let a = rig.add("A");
        let b = rig.add("B");
        let c = rig.add("C");
        rig.click(a, 5);
        rig.click(b, 5);
        rig.run_until(secs(1), |_| {});
        let first_tick = rig.engine.session().unwrap().tick_task();

        rig.click(c, 5);
        rig.assert_single_session();
        let session = rig.engine.session().unwrap();
        assert_eq!(session.outgoing(), b);
        assert_eq!(session.incoming(), c);
        assert!(!rig.scheduler.is_pending(first_tick));
        assert_eq!(rig.state(a), PlaybackState::Idle);
        assert!(rig.registry.get(a).unwrap().restore_task().is_some());
        // One tick plus A's restore
        assert_eq!(rig.scheduler.pending_count(), 2);
    }

    #[test]
    fn test_crossfade_cancels_pending_restore() {
        let mut rig = Rig::new();
        let a = rig.add("A");
        let b = rig.add("B");
        rig.click(a, 1);
        rig.click(b, 1);
        rig.run_until(secs(1), |_| {});
        assert!(rig.registry.get(a).unwrap().restore_task().is_some());

        // Fade back to A before its restore fires
        rig.click(a, 1);
        assert_eq!(rig.state(a), PlaybackState::FadingIn);
        assert!(rig.registry.get(a).unwrap().restore_task().is_none());
        rig.run_until(secs(20), |_| {});
        assert_eq!(rig.state(a), PlaybackState::Playing);
        assert_eq!(rig.volume(a), 1.0);
    }

    #[test]
    fn test_outgoing_paused_externally_ends_fade() {
        let mut rig = Rig::new();
        let a = rig.add("A");
        let b = rig.add("B");
        rig.click(a, 5);
        rig.click(b, 5);

        rig.registry.get_mut(a).unwrap().clip_mut().pause();
        rig.run_until(millis(100), |_| {});
        assert!(rig.engine.session().is_none());
        assert_eq!(rig.state(a), PlaybackState::Idle);
        assert_eq!(rig.state(b), PlaybackState::Playing);
        assert_eq!(rig.volume(b), 1.0);
    }

    #[test]
    fn test_forget_outgoing_leaves_no_dangling_target() {
        let mut rig = Rig::new();
        let a = rig.add("A");
        let b = rig.add("B");
        rig.click(a, 5);
        rig.click(b, 5);
        rig.run_until(secs(1), |_| {});

        let now = rig.clock.now();
        rig.engine
            .forget_tile(a, &mut rig.registry, &mut rig.scheduler, now);
        rig.registry.delete(a, &mut rig.scheduler).unwrap();

        assert!(rig.engine.session().is_none());
        assert_eq!(rig.engine.active_target(), Some(b));
        assert_eq!(rig.scheduler.pending_count(), 0);
        assert_eq!(rig.state(b), PlaybackState::Playing);
    }
}
