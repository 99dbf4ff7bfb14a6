/// Playback direction of the active clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackDirection {
    #[default]
    Forward,
    Backward,
}

/// Active clip plus a cross-fade from the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    active: String,
    previous: Option<String>,
    blend_counter: u32,
    time: f32,
    direction: PlaybackDirection,
}

impl AnimationState {
    /// Frames a cross-fade lasts; counted in updates.
    pub const TRANSITION_FRAMES: u32 = 15;
    pub const FPS: f32 = 6.0;

    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            active: initial.into(),
            previous: None,
            blend_counter: 0,
            time: 0.0,
            direction: PlaybackDirection::Forward,
        }
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Switch clips, starting a cross-fade. Re-selecting the active clip is a no-op.
    pub fn set(&mut self, name: &str) {
        if self.active == name {
            return;
        }
        tracing::debug!(from = %self.active, to = name, "animation changed");
        let old = std::mem::replace(&mut self.active, name.to_string());
        self.previous = Some(old);
        self.blend_counter = Self::TRANSITION_FRAMES;
        self.time = 0.0;
    }

    pub fn set_direction(&mut self, direction: PlaybackDirection) {
        self.direction = direction;
    }

    pub fn direction(&self) -> PlaybackDirection {
        self.direction
    }

    /// Weight of the active clip in `[0, 1]`; the previous clip gets the rest.
    pub fn mix(&self) -> f32 {
        let t = Self::TRANSITION_FRAMES as f32;
        (t - self.blend_counter as f32) / t
    }

    /// Clip-local time in seconds; negative direction plays it backward.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Keyframe index at `FPS`, for a clip of `frame_count` frames.
    pub fn frame(&self, frame_count: usize) -> usize {
        if frame_count == 0 {
            return 0;
        }
        let n = frame_count as i64;
        let f = (self.time * Self::FPS).floor() as i64;
        f.rem_euclid(n) as usize
    }

    pub fn update(&mut self, dt: f32) {
        if self.blend_counter > 0 {
            self.blend_counter -= 1;
            if self.blend_counter == 0 {
                self.previous = None;
            }
        }
        match self.direction {
            PlaybackDirection::Forward => self.time += dt,
            PlaybackDirection::Backward => self.time -= dt,
        }
    }
}
