use std::time::Instant;

/// Source of per-frame elapsed time, in seconds.
pub trait Clock {
    /// Seconds since the previous call.
    fn delta(&mut self) -> f32;
}

/// Wall-clock time. The first call returns 0.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Option<Instant>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = self
            .last
            .map(|prev| now.duration_since(prev).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt
    }
}

/// Deterministic clock that advances by a constant step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock {
    step: f32,
}

impl FixedClock {
    pub fn new(step: f32) -> Self {
        Self { step }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn set_step(&mut self, step: f32) {
        self.step = step;
    }
}

impl Clock for FixedClock {
    fn delta(&mut self) -> f32 {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_starts_at_zero() {
        let mut c = SystemClock::new();
        assert_eq!(c.delta(), 0.0);
        assert!(c.delta() >= 0.0);
    }

    #[test]
    fn fixed_clock_repeats_step() {
        let mut c = FixedClock::new(1.0 / 60.0);
        assert_eq!(c.delta(), c.delta());
        c.set_step(0.5);
        assert_eq!(c.delta(), 0.5);
    }
}
