use crate::config::EngineConfig;
use crate::ease::CameraEase;
use crate::resize::{FreezeFrame, fit_orthographic, fit_perspective};
use glam::Vec3;
use mirrorworld_common::{SurfaceSize, ViewRole};
use mirrorworld_render::{
    Camera, Clock, Composer, DebugTextRenderer, OrthographicCamera, PerspectiveCamera,
    RenderSurface, Renderer, Scene, SystemClock,
};
use std::time::Duration;

/// One of the two windows onto the world: scene, camera, surface and post chain.
///
/// The perspective view owns a camera ease; the orthographic view owns the
/// freeze-frame shown while it resizes. Each reads its own clock.
pub struct View {
    role: ViewRole,
    scene: Scene,
    camera: Camera,
    composer: Composer,
    surface: Box<dyn RenderSurface>,
    clock: Box<dyn Clock>,
    ease: Option<CameraEase>,
    freeze: Option<FreezeFrame>,
    freeze_delay: Duration,
    frustum_size: f32,
    deferred: bool,
}

impl View {
    /// Build a view for `role` on a container of `size`.
    ///
    /// A container with no area yields a 1:1 lens and a deferred view that
    /// skips rendering until it is resized.
    pub fn new(
        role: ViewRole,
        size: SurfaceSize,
        mut surface: Box<dyn RenderSurface>,
        config: &EngineConfig,
    ) -> Self {
        let aspect = size.aspect().unwrap_or(1.0);
        let (scene, camera, composer, ease, frustum_size) = match role {
            ViewRole::Primary => {
                let p = &config.primary;
                let mut scene = Scene::new(p.background);
                scene.fog = p.fog;
                let mut camera = Camera::Perspective(PerspectiveCamera::new(p.fov, aspect, p.near, p.far));
                let ease = CameraEase::new(&config.ease);
                ease.apply(&mut camera);
                let composer = Composer::with_passes(p.passes.iter().copied());
                (scene, camera, composer, Some(ease), 0.0)
            }
            ViewRole::Secondary => {
                let s = &config.secondary;
                let mut scene = Scene::new(s.background);
                scene.fog = s.fog;
                let f = s.frustum_size;
                let mut lens = OrthographicCamera::new(-f * aspect, f * aspect, f, -f, s.near, s.far);
                lens.position = s.viewpoint.position();
                lens.look_at(Vec3::ZERO);
                lens.zoom = s.zoom;
                lens.update_projection_matrix();
                let composer = Composer::with_passes(s.passes.iter().copied());
                (scene, Camera::Orthographic(lens), composer, None, f)
            }
        };

        surface.set_size(size);
        let deferred = size.is_degenerate();
        if deferred {
            tracing::debug!(%role, %size, "view deferred until resized");
        }
        tracing::info!(%role, %size, passes = composer.passes().len(), "view created");

        Self {
            role,
            scene,
            camera,
            composer,
            surface,
            clock: Box::new(SystemClock::new()),
            ease,
            freeze: None,
            freeze_delay: Duration::from_millis(config.freeze_frame_ms),
            frustum_size,
            deferred,
        }
    }

    /// Replace the clock driving the ease or freeze-frame countdown.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn role(&self) -> ViewRole {
        self.role
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn surface(&self) -> &dyn RenderSurface {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> &mut dyn RenderSurface {
        self.surface.as_mut()
    }

    pub fn ease(&self) -> Option<&CameraEase> {
        self.ease.as_ref()
    }

    pub fn ease_mut(&mut self) -> Option<&mut CameraEase> {
        self.ease.as_mut()
    }

    pub fn freeze_frame(&self) -> Option<&FreezeFrame> {
        self.freeze.as_ref()
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Fit lens and surface to a new container size.
    ///
    /// The orthographic view first covers itself with a capture of its last
    /// frame, which `update_freeze_frame` removes later.
    pub fn resize(&mut self, size: SurfaceSize) {
        if size == self.surface.size() && !self.deferred {
            tracing::trace!(role = %self.role, %size, "resize to current size ignored");
            return;
        }
        if !self.role.is_perspective() {
            self.cover_with_freeze_frame();
        }
        let fitted = match &mut self.camera {
            Camera::Perspective(lens) => fit_perspective(lens, size),
            Camera::Orthographic(lens) => fit_orthographic(lens, self.frustum_size, size),
        };
        self.surface.set_size(size);
        self.deferred = !fitted;
        tracing::debug!(role = %self.role, %size, deferred = self.deferred, "view resized");
    }

    fn cover_with_freeze_frame(&mut self) {
        if let Some(freeze) = &mut self.freeze {
            freeze.restart();
            return;
        }
        match self.surface.capture() {
            Ok(capture) => {
                self.surface.show_overlay(capture);
                self.freeze = Some(FreezeFrame::new(self.freeze_delay));
            }
            Err(e) => tracing::debug!(role = %self.role, "no frame to freeze: {e}"),
        }
    }

    /// Advance the camera ease by this view's clock and pose the camera.
    pub fn update_ease(&mut self) {
        let dt = self.clock.delta();
        let Some(ease) = &mut self.ease else {
            return;
        };
        if ease.update(dt) {
            ease.apply(&mut self.camera);
        }
    }

    /// Count down the freeze-frame by this view's clock and drop it once expired.
    pub fn update_freeze_frame(&mut self, rendered: bool) {
        let dt = self.clock.delta();
        let Some(freeze) = &mut self.freeze else {
            return;
        };
        if freeze.advance(dt, rendered) {
            self.freeze = None;
            self.surface.hide_overlay();
            tracing::debug!(role = %self.role, "freeze-frame removed");
        }
    }

    /// Draw one frame. Returns whether anything was drawn.
    pub fn render(&mut self) -> bool {
        if self.deferred {
            tracing::trace!(role = %self.role, "render skipped: view deferred");
            return false;
        }
        match self.composer.render(self.surface.as_mut(), &self.scene, &self.camera) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(role = %self.role, "render skipped: {e}");
                false
            }
        }
    }

    /// Text dump of what this view would draw.
    pub fn debug_text(&self) -> String {
        DebugTextRenderer::new().render(&self.scene, &self.camera)
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("role", &self.role)
            .field("size", &self.surface.size())
            .field("nodes", &self.scene.len())
            .field("deferred", &self.deferred)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorworld_render::{FixedClock, HeadlessSurface, Pass};

    fn view(role: ViewRole, width: u32, height: u32) -> View {
        let size = SurfaceSize::new(width, height);
        View::new(role, size, Box::new(HeadlessSurface::new(size)), &EngineConfig::default())
            .with_clock(Box::new(FixedClock::new(0.05)))
    }

    #[test]
    fn primary_lens_and_passes() {
        let v = view(ViewRole::Primary, 800, 600);
        let lens = v.camera().as_perspective().unwrap();
        assert_eq!(lens.fov, 45.0);
        assert_eq!((lens.near, lens.far), (1.0, 4000.0));
        assert!((lens.aspect - 4.0 / 3.0).abs() < 1e-6);
        assert_eq!(v.camera().position(), Vec3::new(0.0, 270.0, -500.0));
        assert_eq!(v.composer().passes()[0], Pass::Render);
        assert!(v.scene().fog.is_some());
        assert!(v.ease().is_some());
    }

    #[test]
    fn secondary_lens_from_viewpoint() {
        let v = view(ViewRole::Secondary, 400, 200);
        let lens = v.camera().as_orthographic().unwrap();
        assert_eq!((lens.left, lens.right, lens.top, lens.bottom), (-4.0, 4.0, 2.0, -2.0));
        assert_eq!(lens.zoom, 0.0075);
        assert_eq!(lens.position, Vec3::new(-500.0, 100.0, 0.0));
        assert_eq!(lens.target, Vec3::ZERO);
        assert_eq!(v.composer().passes().len(), 3);
        assert!(v.ease().is_none());
    }

    #[test]
    fn zero_size_defers_with_square_aspect() {
        let mut v = view(ViewRole::Primary, 0, 0);
        assert!(v.is_deferred());
        assert_eq!(v.camera().as_perspective().unwrap().aspect, 1.0);
        assert!(!v.render());

        v.resize(SurfaceSize::new(300, 150));
        assert!(!v.is_deferred());
        assert_eq!(v.camera().as_perspective().unwrap().aspect, 2.0);
        assert!(v.render());
    }

    #[test]
    fn primary_resize_is_immediate() {
        let mut v = view(ViewRole::Primary, 800, 600);
        v.resize(SurfaceSize::new(400, 300));
        assert!((v.camera().as_perspective().unwrap().aspect - 4.0 / 3.0).abs() < 1e-6);
        assert_eq!(v.surface().size(), SurfaceSize::new(400, 300));
        assert!(!v.surface().overlay_visible());
    }

    #[test]
    fn secondary_resize_twice_equals_once() {
        let mut once = view(ViewRole::Secondary, 800, 600);
        let mut twice = view(ViewRole::Secondary, 800, 600);
        let size = SurfaceSize::new(1024, 512);
        once.resize(size);
        twice.resize(size);
        twice.resize(size);
        assert_eq!(once.camera(), twice.camera());
        assert_eq!(once.surface().size(), twice.surface().size());
    }

    #[test]
    fn freeze_frame_covers_resize_until_delay_and_frame() {
        let mut v = view(ViewRole::Secondary, 800, 600);
        assert!(v.render());
        v.resize(SurfaceSize::new(640, 480));
        assert!(v.surface().overlay_visible());
        assert_eq!(v.surface().size(), SurfaceSize::new(640, 480));

        // Clock steps 50 ms per update.
        let rendered = v.render();
        v.update_freeze_frame(rendered);
        assert!(v.surface().overlay_visible());
        let rendered = v.render();
        v.update_freeze_frame(rendered);
        assert!(!v.surface().overlay_visible());
        assert!(v.freeze_frame().is_none());
    }

    #[test]
    fn resize_before_first_frame_skips_overlay() {
        let mut v = view(ViewRole::Secondary, 800, 600);
        v.resize(SurfaceSize::new(640, 480));
        assert!(!v.surface().overlay_visible());
        assert!(v.freeze_frame().is_none());
    }

    #[test]
    fn repeated_resize_restarts_countdown() {
        let mut v = view(ViewRole::Secondary, 800, 600);
        v.render();
        v.resize(SurfaceSize::new(640, 480));
        let rendered = v.render();
        v.update_freeze_frame(rendered);
        v.resize(SurfaceSize::new(600, 480));
        let rendered = v.render();
        v.update_freeze_frame(rendered);
        assert!(v.surface().overlay_visible());
        let rendered = v.render();
        v.update_freeze_frame(rendered);
        assert!(!v.surface().overlay_visible());
    }

    #[test]
    fn debug_text_names_camera() {
        let v = view(ViewRole::Secondary, 100, 100);
        assert!(v.debug_text().contains("orthographic"));
    }
}
