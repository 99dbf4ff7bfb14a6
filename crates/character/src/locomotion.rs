use glam::Vec3;
use mirrorworld_input::InputState;

fn exponential_ease_out(k: f32) -> f32 {
    if k == 1.0 { 1.0 } else { 1.0 - 2f32.powf(-10.0 * k) }
}

/// Velocity-driven ground movement along the body heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Locomotion {
    pub walk_speed: f32,
    pub crouch_speed: f32,
    pub front_acceleration: f32,
    pub back_acceleration: f32,
    pub front_deceleration: f32,
    /// Radians per second.
    pub angular_speed: f32,
    max_speed: f32,
    max_reverse_speed: f32,
    speed: f32,
    body_orientation: f32,
}

impl Locomotion {
    pub fn new(walk_speed: f32, crouch_speed: f32) -> Self {
        Self {
            walk_speed,
            crouch_speed,
            front_acceleration: 600.0,
            back_acceleration: 600.0,
            front_deceleration: 600.0,
            angular_speed: 2.5,
            max_speed: walk_speed,
            max_reverse_speed: -walk_speed,
            speed: 0.0,
            body_orientation: 0.0,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Heading around Y, in radians.
    pub fn body_orientation(&self) -> f32 {
        self.body_orientation
    }

    /// Integrate one step. Returns the displacement to apply to the root.
    pub fn step(&mut self, dt: f32, input: &InputState) -> Vec3 {
        self.max_speed = if input.crouch { self.crouch_speed } else { self.walk_speed };
        self.max_reverse_speed = -self.max_speed;
        let (lo, hi) = (self.max_reverse_speed, self.max_speed);

        if input.move_forward {
            self.speed = (self.speed + dt * self.front_acceleration).clamp(lo, hi);
        }
        if input.move_backward {
            self.speed = (self.speed - dt * self.back_acceleration).clamp(lo, hi);
        }

        // Turning keeps the character walking rather than spinning in place.
        if input.move_left {
            self.body_orientation += dt * self.angular_speed;
            self.speed = (self.speed + dt * self.front_acceleration).clamp(lo, hi);
        }
        if input.move_right {
            self.body_orientation -= dt * self.angular_speed;
            self.speed = (self.speed + dt * self.front_acceleration).clamp(lo, hi);
        }

        if !(input.move_forward || input.move_backward) {
            if self.speed > 0.0 {
                let k = exponential_ease_out(self.speed / self.max_speed);
                self.speed = (self.speed - k * dt * self.front_deceleration).clamp(0.0, hi);
            } else if self.speed < 0.0 {
                let k = exponential_ease_out(self.speed / self.max_reverse_speed);
                self.speed = (self.speed + k * dt * self.back_acceleration).clamp(lo, 0.0);
            }
        }

        let forward = self.speed * dt;
        Vec3::new(
            self.body_orientation.sin() * forward,
            0.0,
            self.body_orientation.cos() * forward,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(f: impl FnOnce(&mut InputState)) -> InputState {
        let mut s = InputState::default();
        f(&mut s);
        s
    }

    #[test]
    fn idle_does_not_move() {
        let mut l = Locomotion::new(350.0, 175.0);
        let d = l.step(0.016, &InputState::default());
        assert_eq!(d, Vec3::ZERO);
        assert_eq!(l.speed(), 0.0);
    }

    #[test]
    fn forward_accelerates_along_z() {
        let mut l = Locomotion::new(350.0, 175.0);
        let d = l.step(0.1, &held(|s| s.move_forward = true));
        assert!((l.speed() - 60.0).abs() < 1e-4);
        assert!(d.x.abs() < 1e-6);
        assert!((d.z - 6.0).abs() < 1e-4);
    }

    #[test]
    fn speed_clamps_to_walk_or_crouch() {
        let mut l = Locomotion::new(350.0, 175.0);
        for _ in 0..100 {
            l.step(0.1, &held(|s| s.move_forward = true));
        }
        assert_eq!(l.speed(), 350.0);

        l.step(0.1, &held(|s| {
            s.move_forward = true;
            s.crouch = true;
        }));
        assert_eq!(l.speed(), 175.0);
        assert_eq!(l.max_speed(), 175.0);
    }

    #[test]
    fn backward_reverses() {
        let mut l = Locomotion::new(350.0, 175.0);
        let d = l.step(0.1, &held(|s| s.move_backward = true));
        assert!((l.speed() + 60.0).abs() < 1e-4);
        assert!(d.z < 0.0);
    }

    #[test]
    fn release_decelerates_to_rest() {
        let mut l = Locomotion::new(350.0, 175.0);
        for _ in 0..20 {
            l.step(0.1, &held(|s| s.move_forward = true));
        }
        let mut last = l.speed();
        for _ in 0..200 {
            l.step(0.05, &InputState::default());
            assert!(l.speed() <= last);
            assert!(l.speed() >= 0.0);
            last = l.speed();
        }
        assert!(l.speed() < 1.0);
    }

    #[test]
    fn turning_changes_heading_and_walks() {
        const DT: f32 = 0.016;
        let mut l = Locomotion::new(350.0, 175.0);
        for _ in 0..10 {
            l.step(DT, &held(|s| s.move_left = true));
        }
        assert!((l.body_orientation() - 10.0 * DT * 2.5).abs() < 1e-5);
        assert!(l.speed() > 0.0);

        for _ in 0..10 {
            l.step(DT, &held(|s| s.move_right = true));
        }
        assert!(l.body_orientation().abs() < 1e-5);
        assert!(l.speed() > 0.0);
    }

    #[test]
    fn ease_out_endpoints() {
        assert_eq!(exponential_ease_out(1.0), 1.0);
        assert_eq!(exponential_ease_out(0.0), 0.0);
    }
}
