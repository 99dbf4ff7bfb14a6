//! Mirrorworld engine: two views of one world, a keyboard-driven character in
//! each, and the frame loop that keeps both cameras on it.
//!
//! # Invariants
//! - All state mutation and rendering happen on the thread calling `tick`.
//! - Ground and lights are built once and cloned into each scene; the scenes
//!   share no node identity.
//! - A character rig joins its scene exactly once, after its parts load.
//! - Nothing inside a tick is fatal: missing pieces are skipped and render
//!   failures are logged.

pub mod config;
pub mod director;
pub mod ease;
pub mod engine;
pub mod error;
pub mod frame_loop;
pub mod resize;
pub mod rig;
pub mod view;
pub mod world;

pub use config::{
    EaseConfig, EngineConfig, GroundConfig, OrthographicConfig, PerspectiveConfig, RigConfig,
    Viewpoint, WorldConfig,
};
pub use director::CameraDirector;
pub use ease::CameraEase;
pub use engine::{Engine, EngineHost};
pub use error::{ConfigError, EngineError};
pub use frame_loop::{CountingScheduler, FrameScheduler, TickReport};
pub use resize::FreezeFrame;
pub use rig::{CharacterRig, LoadState};
pub use view::View;
pub use world::{WorldBuilder, WorldHandles};

pub fn crate_info() -> &'static str {
    "mirrorworld-engine v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("engine"));
    }
}
