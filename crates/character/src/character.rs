use crate::animation::{AnimationState, PlaybackDirection};
use crate::config::CharacterConfig;
use crate::error::CharacterError;
use crate::loader::CharacterParts;
use crate::locomotion::Locomotion;
use glam::{Quat, Vec3};
use mirrorworld_common::Transform;
use mirrorworld_input::InputState;

/// An animated, keyboard-driven character.
///
/// Skin and weapon selections made before the parts arrive are remembered
/// and checked once they do.
#[derive(Debug, Clone)]
pub struct Character {
    config: CharacterConfig,
    root: Transform,
    cast_shadow: bool,
    skin: usize,
    weapon: usize,
    parts: Option<CharacterParts>,
    locomotion: Locomotion,
    animation: AnimationState,
}

impl Character {
    pub fn new(config: CharacterConfig) -> Self {
        let locomotion = Locomotion::new(config.walk_speed, config.crouch_speed);
        let animation = AnimationState::new(config.animations.idle.clone());
        Self {
            config,
            root: Transform::default(),
            cast_shadow: false,
            skin: 0,
            weapon: 0,
            parts: None,
            locomotion,
            animation,
        }
    }

    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    pub fn root(&self) -> &Transform {
        &self.root
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.root.position = position;
    }

    /// Uniform scale of the root.
    pub fn scale(&self) -> f32 {
        self.root.scale.x
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.root.scale = Vec3::splat(scale);
    }

    pub fn enable_shadows(&mut self, enabled: bool) {
        self.cast_shadow = enabled;
    }

    pub fn casts_shadow(&self) -> bool {
        self.cast_shadow
    }

    pub fn skin(&self) -> usize {
        self.skin
    }

    pub fn weapon(&self) -> usize {
        self.weapon
    }

    pub fn set_skin(&mut self, index: usize) -> Result<(), CharacterError> {
        match &self.parts {
            Some(parts) if index >= parts.skins.len() => {
                return Err(CharacterError::IndexOutOfRange {
                    part: "skin",
                    index,
                    len: parts.skins.len(),
                });
            }
            _ => {}
        }
        self.skin = index;
        Ok(())
    }

    pub fn set_weapon(&mut self, index: usize) -> Result<(), CharacterError> {
        match &self.parts {
            Some(parts) if index >= parts.weapons.len() => {
                return Err(CharacterError::IndexOutOfRange {
                    part: "weapon",
                    index,
                    len: parts.weapons.len(),
                });
            }
            _ => {}
        }
        self.weapon = index;
        Ok(())
    }

    pub fn set_animation(&mut self, name: &str) {
        self.animation.set(name);
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn locomotion(&self) -> &Locomotion {
        &self.locomotion
    }

    pub fn is_loaded(&self) -> bool {
        self.parts.is_some()
    }

    /// Install loaded parts. Out-of-range pending selections fall back to 0.
    pub fn attach_parts(&mut self, parts: CharacterParts) {
        if self.skin >= parts.skins.len() {
            tracing::warn!(skin = self.skin, available = parts.skins.len(), "skin out of range, using 0");
            self.skin = 0;
        }
        if self.weapon >= parts.weapons.len() {
            tracing::warn!(weapon = self.weapon, available = parts.weapons.len(), "weapon out of range, using 0");
            self.weapon = 0;
        }
        self.parts = Some(parts);
    }

    /// Advance movement, behavior and animation by `dt` seconds.
    pub fn update(&mut self, dt: f32, input: &InputState) {
        let displacement = self.locomotion.step(dt, input);
        self.root.position += displacement;
        self.root.rotation = Quat::from_rotation_y(self.locomotion.body_orientation());

        if self.parts.is_some() {
            self.update_behaviors(input);
            self.animation.update(dt);
        }
    }

    fn update_behaviors(&mut self, input: &InputState) {
        let anims = &self.config.animations;
        let (mut move_anim, mut idle_anim) = if input.crouch {
            (&anims.crouch_move, &anims.crouch_idle)
        } else {
            (&anims.r#move, &anims.idle)
        };
        if input.jump {
            move_anim = &anims.jump;
            idle_anim = &anims.jump;
        }
        if input.attack {
            let attack = if input.crouch { &anims.crouch_attack } else { &anims.attack };
            move_anim = attack;
            idle_anim = attack;
        }

        let steering = input.move_forward || input.move_backward || input.move_left || input.move_right;
        let (move_anim, idle_anim) = (move_anim.clone(), idle_anim.clone());
        if steering {
            self.animation.set(&move_anim);
        }
        if self.locomotion.speed().abs() < 0.2 * self.locomotion.max_speed() && !steering {
            self.animation.set(&idle_anim);
        }

        if input.move_forward {
            self.animation.set_direction(PlaybackDirection::Forward);
        }
        if input.move_backward {
            self.animation.set_direction(PlaybackDirection::Backward);
        }
    }
}
