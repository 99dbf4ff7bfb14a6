//! Character collaborator: an animated, keyboard-driven character model.
//!
//! A `Character` owns its root transform, a velocity-driven locomotion model
//! and an animation state machine (idle, move, jump, attack and their crouch
//! variants). Model parts are fetched by a `CharacterLoader` off the caller's
//! thread and handed back through a one-shot completion callback.
//!
//! # Invariants
//! - Locomotion is physics-free: speed and heading integrate per `update`.
//! - Animation selection only runs once parts are attached.

mod animation;
mod character;
mod config;
mod error;
mod loader;
mod locomotion;

pub use animation::{AnimationState, PlaybackDirection};
pub use character::Character;
pub use config::{AnimationSet, CharacterConfig, WeaponParts};
pub use error::CharacterError;
pub use loader::{CharacterLoader, CharacterParts, FsLoader, LoadCallback, MemoryLoader};
pub use locomotion::Locomotion;

pub fn crate_info() -> &'static str {
    "mirrorworld-character v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("character"));
    }
}
