use glam::{Mat4, Vec3};

/// Pick an up vector that is not parallel to the view direction.
fn up_for(direction: Vec3) -> Vec3 {
    let dir = direction.normalize_or_zero();
    if dir.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

fn look_at(position: Vec3, target: Vec3) -> Mat4 {
    let direction = target - position;
    if direction.length_squared() < 1e-12 {
        return Mat4::from_translation(-position);
    }
    Mat4::look_at_rh(position, target, up_for(direction))
}

/// Perspective lens. `fov` is the vertical field of view in degrees.
///
/// The projection matrix is cached: edits to the lens take effect after
/// `update_projection_matrix`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            projection: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        look_at(self.position, self.target)
    }
}

/// Orthographic lens. The visible region is the frustum box divided by `zoom`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
    pub zoom: f32,
    pub position: Vec3,
    pub target: Vec3,
    projection: Mat4,
}

impl OrthographicCamera {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            left,
            right,
            top,
            bottom,
            near,
            far,
            zoom: 1.0,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            projection: Mat4::IDENTITY,
        };
        cam.update_projection_matrix();
        cam
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn update_projection_matrix(&mut self) {
        let dx = (self.right - self.left) / (2.0 * self.zoom);
        let dy = (self.top - self.bottom) / (2.0 * self.zoom);
        let cx = (self.right + self.left) / 2.0;
        let cy = (self.top + self.bottom) / 2.0;
        self.projection =
            Mat4::orthographic_rh(cx - dx, cx + dx, cy - dy, cy + dy, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        look_at(self.position, self.target)
    }

    /// Frustum half-height in world units after zoom.
    pub fn visible_half_height(&self) -> f32 {
        (self.top - self.bottom) / (2.0 * self.zoom)
    }
}

/// Either lens, as stored by a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Camera {
    Perspective(PerspectiveCamera),
    Orthographic(OrthographicCamera),
}

impl Camera {
    pub fn position(&self) -> Vec3 {
        match self {
            Camera::Perspective(c) => c.position,
            Camera::Orthographic(c) => c.position,
        }
    }

    pub fn target(&self) -> Vec3 {
        match self {
            Camera::Perspective(c) => c.target,
            Camera::Orthographic(c) => c.target,
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        match self {
            Camera::Perspective(c) => c.position = position,
            Camera::Orthographic(c) => c.position = position,
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        match self {
            Camera::Perspective(c) => c.look_at(target),
            Camera::Orthographic(c) => c.look_at(target),
        }
    }

    pub fn update_projection_matrix(&mut self) {
        match self {
            Camera::Perspective(c) => c.update_projection_matrix(),
            Camera::Orthographic(c) => c.update_projection_matrix(),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        match self {
            Camera::Perspective(c) => c.view_matrix(),
            Camera::Orthographic(c) => c.view_matrix(),
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self {
            Camera::Perspective(c) => c.projection_matrix(),
            Camera::Orthographic(c) => c.projection_matrix(),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn as_perspective(&self) -> Option<&PerspectiveCamera> {
        match self {
            Camera::Perspective(c) => Some(c),
            Camera::Orthographic(_) => None,
        }
    }

    pub fn as_orthographic(&self) -> Option<&OrthographicCamera> {
        match self {
            Camera::Orthographic(c) => Some(c),
            Camera::Perspective(_) => None,
        }
    }

    pub fn as_perspective_mut(&mut self) -> Option<&mut PerspectiveCamera> {
        match self {
            Camera::Perspective(c) => Some(c),
            Camera::Orthographic(_) => None,
        }
    }

    pub fn as_orthographic_mut(&mut self) -> Option<&mut OrthographicCamera> {
        match self {
            Camera::Orthographic(c) => Some(c),
            Camera::Perspective(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finite(m: Mat4) -> bool {
        m.to_cols_array().iter().all(|v| v.is_finite())
    }

    #[test]
    fn projection_is_cached_until_update() {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 1.0, 4000.0);
        let before = cam.projection_matrix();
        cam.aspect = 2.0;
        assert_eq!(cam.projection_matrix(), before);
        cam.update_projection_matrix();
        assert_ne!(cam.projection_matrix(), before);
    }

    #[test]
    fn zoom_shrinks_visible_region() {
        let mut cam = OrthographicCamera::new(-2.0, 2.0, 2.0, -2.0, 0.1, 1000.0);
        assert_eq!(cam.visible_half_height(), 2.0);
        cam.zoom = 0.5;
        assert_eq!(cam.visible_half_height(), 4.0);
    }

    #[test]
    fn straight_down_view_is_finite() {
        let mut cam = OrthographicCamera::new(-2.0, 2.0, 2.0, -2.0, 0.1, 1000.0);
        cam.position = Vec3::new(0.0, 500.0, 0.0);
        cam.look_at(Vec3::ZERO);
        assert!(finite(cam.view_matrix()));
    }

    #[test]
    fn coincident_eye_and_target_is_finite() {
        let mut cam = PerspectiveCamera::new(45.0, 1.0, 1.0, 100.0);
        cam.position = Vec3::ONE;
        cam.look_at(Vec3::ONE);
        assert!(finite(Camera::Perspective(cam).view_projection()));
    }

    #[test]
    fn enum_accessors() {
        let mut cam = Camera::Perspective(PerspectiveCamera::new(45.0, 1.0, 1.0, 100.0));
        cam.set_position(Vec3::new(0.0, 200.0, -500.0));
        cam.look_at(Vec3::ZERO);
        assert_eq!(cam.position(), Vec3::new(0.0, 200.0, -500.0));
        assert_eq!(cam.target(), Vec3::ZERO);
        assert!(cam.as_perspective().is_some());
        assert!(cam.as_orthographic().is_none());
    }
}
