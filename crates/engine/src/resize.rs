use mirrorworld_common::SurfaceSize;
use mirrorworld_render::{OrthographicCamera, PerspectiveCamera};
use std::time::Duration;

/// Fit a perspective lens to `size`. Returns false, leaving the lens as it
/// was, when the size has no aspect.
pub fn fit_perspective(camera: &mut PerspectiveCamera, size: SurfaceSize) -> bool {
    let Some(aspect) = size.aspect() else {
        return false;
    };
    camera.aspect = aspect;
    camera.update_projection_matrix();
    true
}

/// Fit an orthographic frustum of half-height `frustum_size` to `size`.
pub fn fit_orthographic(camera: &mut OrthographicCamera, frustum_size: f32, size: SurfaceSize) -> bool {
    let Some(aspect) = size.aspect() else {
        return false;
    };
    camera.left = -frustum_size * aspect;
    camera.right = frustum_size * aspect;
    camera.top = frustum_size;
    camera.bottom = -frustum_size;
    camera.update_projection_matrix();
    true
}

/// Countdown for a freeze-frame overlay.
///
/// Expires once the delay has run out and at least one frame has been
/// rendered beneath the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreezeFrame {
    delay: f32,
    remaining: f32,
    frames_beneath: u32,
}

impl FreezeFrame {
    pub fn new(delay: Duration) -> Self {
        let delay = delay.as_secs_f32();
        Self {
            delay,
            remaining: delay,
            frames_beneath: 0,
        }
    }

    /// Start over after another resize.
    pub fn restart(&mut self) {
        self.remaining = self.delay;
        self.frames_beneath = 0;
    }

    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.0)
    }

    pub fn frames_beneath(&self) -> u32 {
        self.frames_beneath
    }

    /// Count `dt` seconds and whether a frame was drawn. Returns true once expired.
    pub fn advance(&mut self, dt: f32, rendered: bool) -> bool {
        self.remaining -= dt.max(0.0);
        if rendered {
            self.frames_beneath += 1;
        }
        self.remaining <= 0.0 && self.frames_beneath > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn perspective_aspect_follows_size() {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 1.0, 4000.0);
        assert!(fit_perspective(&mut cam, SurfaceSize::new(800, 600)));
        assert!(fit_perspective(&mut cam, SurfaceSize::new(400, 300)));
        assert!((cam.aspect - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_size_keeps_lens() {
        let mut cam = PerspectiveCamera::new(45.0, 1.5, 1.0, 4000.0);
        let before = cam.clone();
        assert!(!fit_perspective(&mut cam, SurfaceSize::new(0, 300)));
        assert_eq!(cam, before);

        let mut ortho = OrthographicCamera::new(-2.0, 2.0, 2.0, -2.0, 0.1, 1000.0);
        assert!(!fit_orthographic(&mut ortho, 2.0, SurfaceSize::new(640, 0)));
        assert_eq!(ortho.right, 2.0);
    }

    #[test]
    fn orthographic_bounds_scale_with_aspect() {
        let mut cam = OrthographicCamera::new(-1.0, 1.0, 1.0, -1.0, 0.1, 1000.0);
        fit_orthographic(&mut cam, 2.0, SurfaceSize::new(1000, 500));
        assert_eq!((cam.left, cam.right, cam.top, cam.bottom), (-4.0, 4.0, 2.0, -2.0));
    }

    #[test]
    fn fitting_twice_matches_fitting_once() {
        let size = SurfaceSize::new(1280, 720);
        let mut once = OrthographicCamera::new(-1.0, 1.0, 1.0, -1.0, 0.1, 1000.0);
        once.zoom = 0.0075;
        once.position = Vec3::new(-500.0, 100.0, 0.0);
        let mut twice = once.clone();

        fit_orthographic(&mut once, 2.0, size);
        fit_orthographic(&mut twice, 2.0, size);
        fit_orthographic(&mut twice, 2.0, size);
        assert_eq!(once, twice);
    }

    #[test]
    fn freeze_needs_delay_and_a_frame() {
        let mut f = FreezeFrame::new(Duration::from_millis(100));
        assert!(!f.advance(0.2, false));
        assert!(f.advance(0.0, true));

        let mut f = FreezeFrame::new(Duration::from_millis(100));
        assert!(!f.advance(0.05, true));
        assert!(!f.advance(0.04, true));
        assert!(f.advance(0.02, true));
        assert_eq!(f.frames_beneath(), 3);
    }

    #[test]
    fn restart_resets_countdown() {
        let mut f = FreezeFrame::new(Duration::from_millis(100));
        f.advance(0.08, true);
        f.restart();
        assert!((f.remaining() - 0.1).abs() < 1e-6);
        assert_eq!(f.frames_beneath(), 0);
        assert!(!f.advance(0.05, true));
    }
}
