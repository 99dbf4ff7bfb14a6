//! Input: key events mapped to a single owned record of held movement intents.
//!
//! # Invariants
//! - `InputState` reflects exactly the keys currently held; a key-up never
//!   leaves a stale `true` behind.
//! - Key events reach the state only as messages through `ControlsSender`.
//! - Hosts never share the state mutably; consumers read a `Copy` snapshot.

pub mod bindings;
pub mod controls;
pub mod intent;

pub use bindings::{Key, KeyBindings};
pub use controls::{Controls, ControlsSender, KeyEvent};
pub use intent::{InputState, Intent};

pub fn crate_info() -> &'static str {
    "mirrorworld-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
