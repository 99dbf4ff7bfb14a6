use serde::{Deserialize, Serialize};
use std::fmt;

/// A movement intent a player can hold down.
///
/// Crouch and attack are carried to the character's animation state machine
/// but drive no camera or world logic of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Jump,
    Crouch,
    Attack,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::MoveForward,
        Intent::MoveBackward,
        Intent::MoveLeft,
        Intent::MoveRight,
        Intent::Jump,
        Intent::Crouch,
        Intent::Attack,
    ];
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::MoveForward => "move_forward",
            Intent::MoveBackward => "move_backward",
            Intent::MoveLeft => "move_left",
            Intent::MoveRight => "move_right",
            Intent::Jump => "jump",
            Intent::Crouch => "crouch",
            Intent::Attack => "attack",
        };
        f.write_str(name)
    }
}

/// Snapshot of the held movement intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputState {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    pub crouch: bool,
    pub attack: bool,
}

impl InputState {
    pub fn get(&self, intent: Intent) -> bool {
        match intent {
            Intent::MoveForward => self.move_forward,
            Intent::MoveBackward => self.move_backward,
            Intent::MoveLeft => self.move_left,
            Intent::MoveRight => self.move_right,
            Intent::Jump => self.jump,
            Intent::Crouch => self.crouch,
            Intent::Attack => self.attack,
        }
    }

    pub fn set(&mut self, intent: Intent, held: bool) {
        let flag = match intent {
            Intent::MoveForward => &mut self.move_forward,
            Intent::MoveBackward => &mut self.move_backward,
            Intent::MoveLeft => &mut self.move_left,
            Intent::MoveRight => &mut self.move_right,
            Intent::Jump => &mut self.jump,
            Intent::Crouch => &mut self.crouch,
            Intent::Attack => &mut self.attack,
        };
        *flag = held;
    }

    /// Movement intent: true while any flag is held.
    pub fn is_moving(&self) -> bool {
        Intent::ALL.iter().any(|i| self.get(*i))
    }
}
