use crate::config::EngineConfig;
use crate::director::CameraDirector;
use crate::error::EngineError;
use crate::frame_loop::{CountingScheduler, FrameScheduler, TickReport};
use crate::rig::CharacterRig;
use crate::view::View;
use crate::world::{WorldBuilder, WorldHandles};
use mirrorworld_character::{CharacterError, CharacterLoader, CharacterParts};
use mirrorworld_common::{NodeId, SurfaceSize, ViewRole};
use mirrorworld_input::{Controls, ControlsSender, InputState};
use mirrorworld_render::{Clock, RenderSurface, SystemClock};
use mirrorworld_tools::FrameStats;
use std::cell::RefCell;
use std::rc::Rc;

pub type ClockFactory = Box<dyn FnMut() -> Box<dyn Clock>>;

/// What the host hands the engine: one surface per view, a frame scheduler
/// and a source of clocks.
pub struct EngineHost {
    pub primary: Box<dyn RenderSurface>,
    pub secondary: Box<dyn RenderSurface>,
    pub scheduler: Box<dyn FrameScheduler>,
    pub clocks: ClockFactory,
}

impl EngineHost {
    /// Wall clocks and a scheduler that only counts requests.
    pub fn new(primary: Box<dyn RenderSurface>, secondary: Box<dyn RenderSurface>) -> Self {
        Self {
            primary,
            secondary,
            scheduler: Box::new(CountingScheduler::new()),
            clocks: Box::new(|| Box::new(SystemClock::new()) as Box<dyn Clock>),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn FrameScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_clocks(mut self, clocks: ClockFactory) -> Self {
        self.clocks = clocks;
        self
    }
}

/// Two views of one world, a rig per view, and the per-frame loop over them.
pub struct Engine {
    config: EngineConfig,
    controls: Controls,
    views: [View; 2],
    world: [WorldHandles; 2],
    rigs: [Option<CharacterRig>; 2],
    director: CameraDirector,
    scheduler: Box<dyn FrameScheduler>,
    clocks: ClockFactory,
    stats: Rc<RefCell<FrameStats>>,
    stats_clock: Box<dyn Clock>,
    ticks: u64,
}

impl Engine {
    pub fn new(config: EngineConfig, host: EngineHost) -> Self {
        let EngineHost {
            primary,
            secondary,
            scheduler,
            mut clocks,
        } = host;

        let builder = WorldBuilder::new(&config.world);
        let primary_size = primary.size();
        let secondary_size = secondary.size();
        let mut views = [
            View::new(ViewRole::Primary, primary_size, primary, &config).with_clock(clocks()),
            View::new(ViewRole::Secondary, secondary_size, secondary, &config).with_clock(clocks()),
        ];
        let world = [
            builder.populate(views[0].scene_mut()),
            builder.populate(views[1].scene_mut()),
        ];
        let stats_clock = clocks();

        tracing::info!(
            primary = %primary_size,
            secondary = %secondary_size,
            viewpoint = %config.secondary.viewpoint,
            "engine ready"
        );
        Self {
            controls: Controls::new(config.bindings.clone()),
            director: CameraDirector::new(config.ease.follow_offset),
            config,
            views,
            world,
            rigs: [None, None],
            scheduler,
            clocks,
            stats: Rc::new(RefCell::new(FrameStats::new())),
            stats_clock,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn view(&self, role: ViewRole) -> &View {
        &self.views[role.index()]
    }

    pub fn view_mut(&mut self, role: ViewRole) -> &mut View {
        &mut self.views[role.index()]
    }

    pub fn world(&self, role: ViewRole) -> WorldHandles {
        self.world[role.index()]
    }

    pub fn rig(&self, role: ViewRole) -> Option<&CharacterRig> {
        self.rigs[role.index()].as_ref()
    }

    pub fn input(&self) -> InputState {
        self.controls.state()
    }

    /// Shared handle to the frame statistics, for diagnostics overlays.
    pub fn stats(&self) -> Rc<RefCell<FrameStats>> {
        Rc::clone(&self.stats)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Open the key-event channel. Events sent on it apply at the next tick.
    pub fn enable_controls(&mut self) -> ControlsSender {
        self.controls.enable()
    }

    /// Create the pending rig for `role` and start loading its parts.
    ///
    /// Returns without waiting. `notify` receives the outcome on whatever
    /// thread the loader finishes on; the host passes it back through
    /// `complete_rig_load` on the loop thread.
    pub fn create_character_rig<F>(
        &mut self,
        role: ViewRole,
        loader: &dyn CharacterLoader,
        notify: F,
    ) -> Result<(), EngineError>
    where
        F: FnOnce(ViewRole, Result<CharacterParts, CharacterError>) + Send + 'static,
    {
        let slot = &mut self.rigs[role.index()];
        if slot.is_some() {
            return Err(EngineError::RigExists(role));
        }
        let rig = slot.insert(CharacterRig::new(role, &self.config.rig, (self.clocks)()));
        tracing::debug!(%role, state = ?rig.state(), "character rig created");
        loader.load(
            &self.config.rig.character,
            Box::new(move |outcome| notify(role, outcome)),
        );
        Ok(())
    }

    /// Deliver a finished load. Attaches the rig to its scene exactly once.
    pub fn complete_rig_load(
        &mut self,
        role: ViewRole,
        outcome: Result<CharacterParts, CharacterError>,
    ) -> Result<NodeId, EngineError> {
        let rig = self.rigs[role.index()]
            .as_mut()
            .ok_or(EngineError::NoRig(role))?;
        match outcome {
            Ok(parts) => rig.attach(self.views[role.index()].scene_mut(), parts),
            Err(source) => {
                rig.fail()?;
                tracing::warn!(%role, "character load failed: {source}");
                Err(EngineError::CharacterLoad { role, source })
            }
        }
    }

    pub fn resize_primary(&mut self, size: SurfaceSize) {
        self.views[ViewRole::Primary.index()].resize(size);
    }

    pub fn resize_secondary(&mut self, size: SurfaceSize) {
        self.views[ViewRole::Secondary.index()].resize(size);
    }

    /// Run one frame.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let span = tracing::trace_span!("tick", n = self.ticks);
        let _enter = span.enter();

        self.scheduler.request_frame();
        let key_events = self.controls.drain();
        let input = self.controls.state();

        let root = self.rigs[ViewRole::Primary.index()]
            .as_ref()
            .and_then(CharacterRig::root_position);
        let [primary, secondary] = &mut self.views;
        let directed = match (root, primary.ease_mut()) {
            (Some(root), Some(ease)) => self.director.step(&input, root, ease, secondary.camera_mut()),
            _ => false,
        };
        primary.update_ease();

        for (rig, view) in self.rigs.iter_mut().zip(self.views.iter_mut()) {
            if let Some(rig) = rig {
                rig.update(&input, view.scene_mut());
            }
        }

        self.stats.borrow_mut().update(self.stats_clock.delta());

        let [primary, secondary] = &mut self.views;
        let rendered_primary = primary.render();
        let rendered_secondary = secondary.render();
        secondary.update_freeze_frame(rendered_secondary);

        TickReport {
            tick: self.ticks,
            key_events,
            moving: input.is_moving(),
            directed,
            rendered_primary,
            rendered_secondary,
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("ticks", &self.ticks)
            .field("views", &self.views)
            .field("rigs", &self.rigs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use mirrorworld_character::MemoryLoader;
    use mirrorworld_common::Rgb;
    use mirrorworld_input::Key;
    use mirrorworld_render::{FixedClock, HeadlessSurface};
    use std::sync::mpsc;

    const STEP: f32 = 1.0 / 60.0;

    fn engine_sized(primary: SurfaceSize, secondary: SurfaceSize) -> (Engine, CountingScheduler) {
        let scheduler = CountingScheduler::new();
        let host = EngineHost::new(
            Box::new(HeadlessSurface::new(primary)),
            Box::new(HeadlessSurface::new(secondary)),
        )
        .with_scheduler(Box::new(scheduler.clone()))
        .with_clocks(Box::new(|| Box::new(FixedClock::new(STEP)) as Box<dyn Clock>));
        (Engine::new(EngineConfig::default(), host), scheduler)
    }

    fn engine() -> Engine {
        engine_sized(SurfaceSize::new(800, 600), SurfaceSize::new(400, 400)).0
    }

    fn load_with(
        engine: &mut Engine,
        role: ViewRole,
        loader: &dyn CharacterLoader,
    ) -> Result<NodeId, EngineError> {
        let (tx, rx) = mpsc::channel();
        engine.create_character_rig(role, loader, move |role, outcome| {
            let _ = tx.send((role, outcome));
        })?;
        let (role, outcome) = rx.try_recv().unwrap();
        engine.complete_rig_load(role, outcome)
    }

    fn load(engine: &mut Engine, role: ViewRole) -> NodeId {
        let loader = MemoryLoader::placeholder(&engine.config().rig.character);
        load_with(engine, role, &loader).unwrap()
    }

    #[test]
    fn scenes_hold_independent_world_copies() {
        let mut e = engine();
        let (p, s) = (e.world(ViewRole::Primary), e.world(ViewRole::Secondary));
        assert_ne!(p.ground, s.ground);
        assert_ne!(p.sun, s.sun);
        assert_ne!(p.ambient, s.ambient);

        let ground = e.view_mut(ViewRole::Primary).scene_mut().get_mut(p.ground).unwrap();
        ground.mesh_mut().unwrap().material.color = Rgb(0x00ff00);
        let other = e.view(ViewRole::Secondary).scene().get(s.ground).unwrap();
        assert_eq!(other.mesh().unwrap().material.color, Rgb::WHITE);
    }

    #[test]
    fn ticks_before_load_leave_cameras_alone() {
        let mut e = engine();
        let tx = e.enable_controls();
        let primary = e.view(ViewRole::Primary).camera().clone();
        let secondary = e.view(ViewRole::Secondary).camera().clone();

        tx.press(Key::new("KeyW"));
        for _ in 0..5 {
            let report = e.tick();
            assert!(report.moving);
            assert!(!report.directed);
            assert!(report.rendered_primary && report.rendered_secondary);
        }
        assert_eq!(e.view(ViewRole::Primary).camera(), &primary);
        assert_eq!(e.view(ViewRole::Secondary).camera(), &secondary);
    }

    #[test]
    fn rig_attaches_once_after_completion() {
        let mut e = engine();
        let before = e.view(ViewRole::Primary).scene().len();
        let (tx, rx) = mpsc::channel();
        let loader = MemoryLoader::placeholder(&e.config().rig.character);
        e.create_character_rig(ViewRole::Primary, &loader, move |role, outcome| {
            let _ = tx.send((role, outcome));
        })
        .unwrap();
        assert!(!e.rig(ViewRole::Primary).unwrap().is_attached());
        assert_eq!(e.view(ViewRole::Primary).scene().len(), before);

        let (role, outcome) = rx.try_recv().unwrap();
        let id = e.complete_rig_load(role, outcome).unwrap();
        assert_eq!(e.view(ViewRole::Primary).scene().len(), before + 1);
        assert!(e.view(ViewRole::Primary).scene().contains(id));
        assert_eq!(e.view(ViewRole::Secondary).scene().len(), before);

        let again = e.complete_rig_load(ViewRole::Primary, Ok(CharacterParts::default()));
        assert!(matches!(again, Err(EngineError::RigAlreadyAttached(ViewRole::Primary))));
        assert_eq!(e.view(ViewRole::Primary).scene().len(), before + 1);
    }

    #[test]
    fn rig_bookkeeping_errors() {
        let mut e = engine();
        assert!(matches!(
            e.complete_rig_load(ViewRole::Secondary, Ok(CharacterParts::default())),
            Err(EngineError::NoRig(ViewRole::Secondary))
        ));
        load(&mut e, ViewRole::Secondary);
        let loader = MemoryLoader::placeholder(&e.config().rig.character);
        assert!(matches!(
            e.create_character_rig(ViewRole::Secondary, &loader, |_, _| {}),
            Err(EngineError::RigExists(ViewRole::Secondary))
        ));
    }

    #[test]
    fn failed_load_leaves_rig_detached() {
        let mut e = engine();
        let before = e.view(ViewRole::Primary).scene().len();
        let err = load_with(&mut e, ViewRole::Primary, &MemoryLoader::failing("offline")).unwrap_err();
        assert!(matches!(err, EngineError::CharacterLoad { role: ViewRole::Primary, .. }));
        assert!(!e.rig(ViewRole::Primary).unwrap().is_attached());

        let tx = e.enable_controls();
        tx.press(Key::new("KeyW"));
        e.tick();
        assert_eq!(e.view(ViewRole::Primary).scene().len(), before);
        assert!(matches!(
            e.complete_rig_load(ViewRole::Primary, Ok(CharacterParts::default())),
            Err(EngineError::RigFailed(_))
        ));
    }

    #[test]
    fn idle_tick_keeps_primary_pose_bit_identical() {
        let mut e = engine();
        load(&mut e, ViewRole::Primary);
        load(&mut e, ViewRole::Secondary);
        e.tick();
        let before = e.view(ViewRole::Primary).camera().clone();
        e.tick();
        let after = e.view(ViewRole::Primary).camera();
        assert_eq!(after, &before);
        assert_eq!(
            after.view_projection().to_cols_array(),
            before.view_projection().to_cols_array()
        );
    }

    #[test]
    fn forward_sets_follow_goal_behind_character() {
        let mut e = engine();
        load(&mut e, ViewRole::Primary);
        let tx = e.enable_controls();
        tx.press(Key::new("KeyW"));

        let report = e.tick();
        assert_eq!(report.key_events, 1);
        assert!(report.directed);
        let ease = e.view(ViewRole::Primary).ease().unwrap();
        assert_eq!(ease.goal(), (Vec3::new(0.0, 200.0, -500.0), Vec3::ZERO));
        assert_eq!(e.view(ViewRole::Secondary).camera().target(), Vec3::ZERO);

        // The character has moved; the next tick follows it.
        e.tick();
        let target = e.view(ViewRole::Secondary).camera().target();
        assert!(target.z > 0.0);
        let (eye, look) = e.view(ViewRole::Primary).ease().unwrap().goal();
        assert_eq!(look, target);
        assert_eq!(eye, target + Vec3::new(0.0, 200.0, -500.0));
    }

    #[test]
    fn releasing_keys_stops_direction() {
        let mut e = engine();
        load(&mut e, ViewRole::Primary);
        let tx = e.enable_controls();
        tx.press(Key::new("KeyD"));
        e.tick();
        tx.release(Key::new("KeyD"));
        let report = e.tick();
        assert!(!report.moving);
        assert!(!report.directed);
        assert_eq!(e.input(), InputState::default());
    }

    #[test]
    fn primary_resize_updates_aspect() {
        let mut e = engine();
        e.resize_primary(SurfaceSize::new(400, 300));
        let aspect = e.view(ViewRole::Primary).camera().as_perspective().unwrap().aspect;
        assert!((aspect - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn secondary_resize_twice_matches_once() {
        let mut once = engine();
        let mut twice = engine();
        let size = SurfaceSize::new(900, 300);
        once.resize_secondary(size);
        twice.resize_secondary(size);
        twice.resize_secondary(size);
        assert_eq!(
            once.view(ViewRole::Secondary).camera(),
            twice.view(ViewRole::Secondary).camera()
        );
    }

    #[test]
    fn freeze_frame_lifts_after_delay_and_a_frame() {
        let mut e = engine();
        e.tick();
        e.resize_secondary(SurfaceSize::new(640, 480));
        assert!(e.view(ViewRole::Secondary).surface().overlay_visible());
        assert!(!e.view(ViewRole::Primary).surface().overlay_visible());

        for _ in 0..5 {
            e.tick();
        }
        assert!(e.view(ViewRole::Secondary).surface().overlay_visible());
        e.tick();
        e.tick();
        assert!(!e.view(ViewRole::Secondary).surface().overlay_visible());
    }

    #[test]
    fn zero_sized_view_is_skipped_until_resized() {
        let (mut e, _) = engine_sized(SurfaceSize::new(800, 600), SurfaceSize::new(0, 0));
        let report = e.tick();
        assert!(report.rendered_primary);
        assert!(!report.rendered_secondary);

        e.resize_secondary(SurfaceSize::new(200, 100));
        assert!(e.tick().rendered_secondary);
    }

    #[test]
    fn each_rig_advances_by_its_own_clock() {
        // Views and stats take the first three clocks; rigs get the next two.
        let mut made = 0u32;
        let host = EngineHost::new(
            Box::new(HeadlessSurface::new(SurfaceSize::new(800, 600))),
            Box::new(HeadlessSurface::new(SurfaceSize::new(400, 400))),
        )
        .with_clocks(Box::new(move || {
            made += 1;
            let step = if made == 5 { 2.0 * STEP } else { STEP };
            Box::new(FixedClock::new(step)) as Box<dyn Clock>
        }));
        let mut e = Engine::new(EngineConfig::default(), host);
        load(&mut e, ViewRole::Primary);
        load(&mut e, ViewRole::Secondary);

        let tx = e.enable_controls();
        tx.press(Key::new("KeyW"));
        for _ in 0..10 {
            e.tick();
        }
        let primary = e.rig(ViewRole::Primary).unwrap().root_position().unwrap();
        let secondary = e.rig(ViewRole::Secondary).unwrap().root_position().unwrap();
        assert!(primary.z > 0.0);
        assert!(secondary.z > primary.z);
        // Below top speed, distance grows with the square of the step.
        assert!((secondary.z / primary.z - 4.0).abs() < 1e-3);
    }

    #[test]
    fn every_tick_schedules_the_next_and_updates_stats() {
        let (mut e, scheduler) = engine_sized(SurfaceSize::new(10, 10), SurfaceSize::new(10, 10));
        for _ in 0..3 {
            e.tick();
        }
        assert_eq!(scheduler.requested(), 3);
        assert_eq!(e.ticks(), 3);
        assert_eq!(e.stats().borrow().frames(), 3);
    }
}
