use crate::ease::CameraEase;
use glam::Vec3;
use mirrorworld_input::InputState;
use mirrorworld_render::Camera;

/// Keeps both cameras on the primary character while it is being steered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraDirector {
    follow_offset: Vec3,
}

impl CameraDirector {
    pub fn new(follow_offset: Vec3) -> Self {
        Self { follow_offset }
    }

    pub fn follow_offset(&self) -> Vec3 {
        self.follow_offset
    }

    /// One frame of direction toward the character at `root`.
    ///
    /// Any held intent counts as moving, crouch and attack included. While
    /// idle both cameras hold their pose. Returns whether anything was re-aimed.
    pub fn step(&self, input: &InputState, root: Vec3, follow: &mut CameraEase, overview: &mut Camera) -> bool {
        if !input.is_moving() {
            return false;
        }
        follow.set_look_at(root + self.follow_offset, root, true);
        overview.look_at(root);
        overview.update_projection_matrix();
        tracing::trace!(root = ?root, "cameras re-aimed");
        true
    }
}
