use crate::config::EaseConfig;
use glam::Vec3;
use mirrorworld_render::Camera;

/// Critically damped spring step toward `goal`.
///
/// Never overshoots: when a step would pass the goal it lands on it and the
/// velocity is cleared.
fn smooth_damp(current: Vec3, goal: Vec3, velocity: &mut Vec3, smooth_time: f32, dt: f32) -> Vec3 {
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - goal;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let next = goal + (change + temp) * decay;

    if (goal - current).dot(next - goal) > 0.0 {
        *velocity = Vec3::ZERO;
        return goal;
    }
    next
}

/// Eases a camera's eye and look-at target toward a goal pose over time.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraEase {
    eye: Vec3,
    target: Vec3,
    goal_eye: Vec3,
    goal_target: Vec3,
    eye_velocity: Vec3,
    target_velocity: Vec3,
    smooth_time: f32,
    rest_threshold: f32,
}

impl CameraEase {
    /// Starts at rest on the configured initial pose.
    pub fn new(config: &EaseConfig) -> Self {
        Self {
            eye: config.initial_eye,
            target: config.initial_target,
            goal_eye: config.initial_eye,
            goal_target: config.initial_target,
            eye_velocity: Vec3::ZERO,
            target_velocity: Vec3::ZERO,
            smooth_time: config.smooth_time,
            rest_threshold: config.rest_threshold,
        }
    }

    /// Aim at a new pose. Without `transition` the pose is taken at once.
    pub fn set_look_at(&mut self, eye: Vec3, target: Vec3, transition: bool) {
        self.goal_eye = eye;
        self.goal_target = target;
        if !transition {
            self.eye = eye;
            self.target = target;
            self.eye_velocity = Vec3::ZERO;
            self.target_velocity = Vec3::ZERO;
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// The pose the ease is heading for, as `(eye, target)`.
    pub fn goal(&self) -> (Vec3, Vec3) {
        (self.goal_eye, self.goal_target)
    }

    pub fn is_at_rest(&self) -> bool {
        self.eye == self.goal_eye && self.target == self.goal_target
    }

    /// Advance by `dt` seconds. Returns whether the pose changed.
    pub fn update(&mut self, dt: f32) -> bool {
        if self.is_at_rest() || dt <= 0.0 {
            return false;
        }
        self.eye = smooth_damp(
            self.eye,
            self.goal_eye,
            &mut self.eye_velocity,
            self.smooth_time,
            dt,
        );
        self.target = smooth_damp(
            self.target,
            self.goal_target,
            &mut self.target_velocity,
            self.smooth_time,
            dt,
        );

        if self.eye.distance(self.goal_eye) < self.rest_threshold
            && self.target.distance(self.goal_target) < self.rest_threshold
        {
            self.set_look_at(self.goal_eye, self.goal_target, false);
            tracing::trace!("camera ease settled");
        }
        true
    }

    /// Write the current pose into `camera`.
    pub fn apply(&self, camera: &mut Camera) {
        camera.set_position(self.eye);
        camera.look_at(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorworld_render::PerspectiveCamera;

    fn ease() -> CameraEase {
        CameraEase::new(&EaseConfig::default())
    }

    #[test]
    fn starts_at_rest_on_initial_pose() {
        let e = ease();
        assert!(e.is_at_rest());
        assert_eq!(e.eye(), Vec3::new(0.0, 270.0, -500.0));
        assert_eq!(e.target(), Vec3::ZERO);
    }

    #[test]
    fn update_at_rest_changes_nothing() {
        let mut e = ease();
        let before = e.clone();
        assert!(!e.update(0.016));
        assert_eq!(e, before);
    }

    #[test]
    fn instant_look_at_jumps() {
        let mut e = ease();
        e.set_look_at(Vec3::X, Vec3::Y, false);
        assert_eq!(e.eye(), Vec3::X);
        assert_eq!(e.target(), Vec3::Y);
        assert!(e.is_at_rest());
    }

    #[test]
    fn transition_converges_and_settles() {
        let mut e = ease();
        let goal = Vec3::new(0.0, 200.0, -400.0);
        e.set_look_at(goal, Vec3::new(0.0, 0.0, 100.0), true);
        assert_eq!(e.eye(), Vec3::new(0.0, 270.0, -500.0));

        let start = e.eye().distance(goal);
        e.update(0.016);
        let after_one = e.eye().distance(goal);
        assert!(after_one < start);

        for _ in 0..600 {
            e.update(0.016);
        }
        assert!(e.is_at_rest());
        assert_eq!(e.eye(), goal);
    }

    #[test]
    fn zero_dt_holds_pose() {
        let mut e = ease();
        e.set_look_at(Vec3::ZERO, Vec3::Z, true);
        let before = e.clone();
        assert!(!e.update(0.0));
        assert_eq!(e, before);
    }

    #[test]
    fn large_step_never_overshoots() {
        let mut e = ease();
        e.set_look_at(Vec3::new(0.0, 270.0, 0.0), Vec3::ZERO, true);
        e.update(10.0);
        assert!(e.eye().z <= 0.0);
    }

    #[test]
    fn apply_poses_camera() {
        let e = ease();
        let mut camera = Camera::Perspective(PerspectiveCamera::new(45.0, 1.0, 1.0, 4000.0));
        e.apply(&mut camera);
        assert_eq!(camera.position(), e.eye());
        assert_eq!(camera.target(), e.target());
    }
}
