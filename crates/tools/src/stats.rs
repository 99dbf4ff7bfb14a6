use std::fmt;

/// Rolling frame-rate and frame-time counter.
///
/// Frame rate is averaged over a one-second window; frame time is the
/// latest delta.
#[derive(Debug, Clone)]
pub struct FrameStats {
    frames: u64,
    window_frames: u32,
    window_elapsed: f32,
    fps: f32,
    frame_ms: f32,
    min_ms: f32,
    max_ms: f32,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frames: 0,
            window_frames: 0,
            window_elapsed: 0.0,
            fps: 0.0,
            frame_ms: 0.0,
            min_ms: f32::INFINITY,
            max_ms: 0.0,
        }
    }
}

impl FrameStats {
    const WINDOW: f32 = 1.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame that took `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.frames += 1;
        self.frame_ms = dt * 1000.0;
        self.min_ms = self.min_ms.min(self.frame_ms);
        self.max_ms = self.max_ms.max(self.frame_ms);

        self.window_frames += 1;
        self.window_elapsed += dt;
        if self.window_elapsed >= Self::WINDOW {
            self.fps = self.window_frames as f32 / self.window_elapsed;
            tracing::trace!(fps = self.fps, "frame rate window closed");
            self.window_frames = 0;
            self.window_elapsed = 0.0;
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames per second over the last completed window, 0 until one completes.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frame_ms(&self) -> f32 {
        self.frame_ms
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            frames: self.frames,
            fps: self.fps,
            frame_ms: self.frame_ms,
            min_ms: if self.frames == 0 { 0.0 } else { self.min_ms },
            max_ms: self.max_ms,
        }
    }
}

/// Snapshot of `FrameStats` for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSummary {
    pub frames: u64,
    pub fps: f32,
    pub frame_ms: f32,
    pub min_ms: f32,
    pub max_ms: f32,
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0} FPS  {:.1} ms  (min {:.1} / max {:.1})  frames={}",
            self.fps, self.frame_ms, self.min_ms, self.max_ms, self.frames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stats() {
        let s = FrameStats::new();
        assert_eq!(s.frames(), 0);
        assert_eq!(s.fps(), 0.0);
        assert_eq!(s.summary().min_ms, 0.0);
    }

    #[test]
    fn fps_after_one_second_window() {
        let mut s = FrameStats::new();
        for _ in 0..64 {
            s.update(1.0 / 64.0);
        }
        assert_eq!(s.frames(), 64);
        assert!((s.fps() - 64.0).abs() < 0.01);
        assert!((s.frame_ms() - 15.625).abs() < 1e-3);
    }

    #[test]
    fn fps_holds_until_next_window() {
        let mut s = FrameStats::new();
        for _ in 0..32 {
            s.update(1.0 / 32.0);
        }
        let fps = s.fps();
        s.update(0.5);
        assert_eq!(s.fps(), fps);
    }

    #[test]
    fn min_max_track_extremes() {
        let mut s = FrameStats::new();
        s.update(0.010);
        s.update(0.030);
        s.update(0.020);
        let sum = s.summary();
        assert!((sum.min_ms - 10.0).abs() < 1e-3);
        assert!((sum.max_ms - 30.0).abs() < 1e-3);
    }

    #[test]
    fn summary_display() {
        let mut s = FrameStats::new();
        s.update(0.016);
        assert!(s.summary().to_string().contains("frames=1"));
    }
}
