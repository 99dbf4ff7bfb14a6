use crate::config::RigConfig;
use crate::error::EngineError;
use glam::Vec3;
use mirrorworld_character::{Character, CharacterParts};
use mirrorworld_common::{NodeId, ViewRole};
use mirrorworld_input::InputState;
use mirrorworld_render::{CharacterNode, Clock, Node, NodeKind, Scene};

/// Where a rig is in its one-way load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Attached(NodeId),
    Failed,
}

/// A character bound to one view, with its own clock.
///
/// The character lives outside any scene until its parts arrive; then its
/// root joins the paired scene once and stays there.
pub struct CharacterRig {
    role: ViewRole,
    character: Character,
    clock: Box<dyn Clock>,
    state: LoadState,
}

impl CharacterRig {
    pub fn new(role: ViewRole, config: &RigConfig, clock: Box<dyn Clock>) -> Self {
        let mut character = Character::new(config.character.clone());
        character.set_scale(config.scale);
        character.enable_shadows(config.cast_shadow);
        character.set_position(config.position);
        // Nothing is loaded yet, so selections are only recorded here.
        let _ = character.set_weapon(config.weapon);
        let _ = character.set_skin(config.skin);
        character.set_animation(&config.initial_animation);
        Self {
            role,
            character,
            clock,
            state: LoadState::Pending,
        }
    }

    pub fn role(&self) -> ViewRole {
        self.role
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, LoadState::Attached(_))
    }

    pub fn node(&self) -> Option<NodeId> {
        match self.state {
            LoadState::Attached(id) => Some(id),
            _ => None,
        }
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    /// Root position, once attached.
    pub fn root_position(&self) -> Option<Vec3> {
        self.is_attached().then(|| self.character.root().position)
    }

    /// Take the loaded parts and insert the root into `scene`.
    pub fn attach(&mut self, scene: &mut Scene, parts: CharacterParts) -> Result<NodeId, EngineError> {
        match self.state {
            LoadState::Attached(_) => return Err(EngineError::RigAlreadyAttached(self.role)),
            LoadState::Failed => return Err(EngineError::RigFailed(self.role)),
            LoadState::Pending => {}
        }
        self.character.attach_parts(parts);
        let mut node = Node::new(format!("character:{}", self.role), NodeKind::Character(self.node_state()));
        node.transform = *self.character.root();
        node.cast_shadow = self.character.casts_shadow();
        let id = scene.add(node);
        self.state = LoadState::Attached(id);
        tracing::info!(role = %self.role, node = %id.short(), "character attached");
        Ok(id)
    }

    /// Record a failed load. The rig never attaches afterwards.
    pub fn fail(&mut self) -> Result<(), EngineError> {
        match self.state {
            LoadState::Attached(_) => Err(EngineError::RigAlreadyAttached(self.role)),
            LoadState::Failed => Err(EngineError::RigFailed(self.role)),
            LoadState::Pending => {
                self.state = LoadState::Failed;
                Ok(())
            }
        }
    }

    /// Advance the character by its own clock and mirror it into its node.
    ///
    /// Does nothing, and leaves the clock unread, until attached.
    pub fn update(&mut self, input: &InputState, scene: &mut Scene) {
        let LoadState::Attached(id) = self.state else {
            return;
        };
        let dt = self.clock.delta();
        self.character.update(dt, input);

        let Some(node) = scene.get_mut(id) else {
            tracing::warn!(role = %self.role, "character node missing from scene");
            return;
        };
        node.transform = *self.character.root();
        node.cast_shadow = self.character.casts_shadow();
        node.kind = NodeKind::Character(self.node_state());
    }

    fn node_state(&self) -> CharacterNode {
        CharacterNode {
            animation: self.character.animation().active().to_string(),
            skin: self.character.skin(),
            weapon: self.character.weapon(),
        }
    }
}

impl std::fmt::Debug for CharacterRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterRig")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("root", &self.character.root().position)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorworld_common::Rgb;
    use mirrorworld_render::FixedClock;

    fn rig() -> CharacterRig {
        CharacterRig::new(ViewRole::Primary, &RigConfig::default(), Box::new(FixedClock::new(0.1)))
    }

    fn parts() -> CharacterParts {
        CharacterParts {
            body: vec![1],
            skins: vec![vec![2]],
            weapons: vec![(vec![3], vec![4])],
        }
    }

    #[test]
    fn new_rig_is_pending_with_stock_setup() {
        let r = rig();
        assert_eq!(r.state(), LoadState::Pending);
        assert_eq!(r.character().scale(), 3.0);
        assert!(r.character().casts_shadow());
        assert_eq!(r.character().animation().active(), "stand");
        assert!(r.root_position().is_none());
    }

    #[test]
    fn attaches_once() {
        let mut r = rig();
        let mut scene = Scene::new(Rgb::WHITE);
        let id = r.attach(&mut scene, parts()).unwrap();
        assert_eq!(scene.len(), 1);
        assert_eq!(r.node(), Some(id));
        let node = scene.get(id).unwrap();
        assert!(node.cast_shadow);
        assert_eq!(node.transform.scale, Vec3::splat(3.0));

        assert!(matches!(
            r.attach(&mut scene, parts()),
            Err(EngineError::RigAlreadyAttached(ViewRole::Primary))
        ));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn root_starts_at_configured_position() {
        let config = RigConfig {
            position: Vec3::new(40.0, 0.0, -25.0),
            ..RigConfig::default()
        };
        let mut r = CharacterRig::new(ViewRole::Secondary, &config, Box::new(FixedClock::new(0.1)));
        let mut scene = Scene::new(Rgb::WHITE);
        let id = r.attach(&mut scene, parts()).unwrap();
        assert_eq!(r.root_position(), Some(Vec3::new(40.0, 0.0, -25.0)));
        assert_eq!(scene.get(id).unwrap().transform.position, config.position);
    }

    #[test]
    fn failed_rig_never_attaches() {
        let mut r = rig();
        let mut scene = Scene::new(Rgb::WHITE);
        r.fail().unwrap();
        assert_eq!(r.state(), LoadState::Failed);
        assert!(matches!(r.fail(), Err(EngineError::RigFailed(_))));
        assert!(matches!(r.attach(&mut scene, parts()), Err(EngineError::RigFailed(_))));
        assert!(scene.is_empty());
    }

    #[test]
    fn update_syncs_node() {
        let mut r = rig();
        let mut scene = Scene::new(Rgb::WHITE);
        let id = r.attach(&mut scene, parts()).unwrap();
        let input = InputState {
            move_forward: true,
            ..InputState::default()
        };
        r.update(&input, &mut scene);
        let node = scene.get(id).unwrap();
        assert!(node.transform.position.z > 0.0);
        assert!(matches!(&node.kind, NodeKind::Character(c) if c.animation == "run"));
        assert_eq!(r.root_position(), Some(node.transform.position));
    }

    #[test]
    fn pending_update_is_noop() {
        let mut r = rig();
        let mut scene = Scene::new(Rgb::WHITE);
        let input = InputState {
            move_forward: true,
            ..InputState::default()
        };
        r.update(&input, &mut scene);
        assert_eq!(r.character().root().position, Vec3::ZERO);
        assert!(scene.is_empty());
    }
}
