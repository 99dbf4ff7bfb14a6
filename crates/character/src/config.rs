use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Animation clip names for each behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSet {
    pub r#move: String,
    pub idle: String,
    pub jump: String,
    pub attack: String,
    pub crouch_move: String,
    pub crouch_idle: String,
    pub crouch_attack: String,
}

impl Default for AnimationSet {
    fn default() -> Self {
        Self {
            r#move: "run".into(),
            idle: "stand".into(),
            jump: "jump".into(),
            attack: "attack".into(),
            crouch_move: "cwalk".into(),
            crouch_idle: "cstand".into(),
            crouch_attack: "crattack".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponParts {
    pub model: String,
    pub skin: String,
}

/// Where a character's parts live and how fast it moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterConfig {
    pub base_path: PathBuf,
    pub body: String,
    pub skins: Vec<String>,
    pub weapons: Vec<WeaponParts>,
    pub animations: AnimationSet,
    pub walk_speed: f32,
    pub crouch_speed: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./models/ogro/"),
            body: "ogro.md2".into(),
            skins: vec!["ctf_r.png".into()],
            weapons: vec![WeaponParts {
                model: "weapon.md2".into(),
                skin: "weapon.jpg".into(),
            }],
            animations: AnimationSet::default(),
            walk_speed: 350.0,
            crouch_speed: 175.0,
        }
    }
}

impl CharacterConfig {
    pub fn body_path(&self) -> PathBuf {
        self.base_path.join(&self.body)
    }

    pub fn skin_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.skins.iter().map(|s| self.base_path.join(s))
    }

    pub fn weapon_paths(&self) -> impl Iterator<Item = (PathBuf, PathBuf)> + '_ {
        self.weapons
            .iter()
            .map(|w| (self.base_path.join(&w.model), self.base_path.join(&w.skin)))
    }

    /// Copy with `base_path` resolved against `root` when relative.
    pub fn rooted_at(&self, root: &Path) -> Self {
        let mut config = self.clone();
        if config.base_path.is_relative() {
            config.base_path = root.join(&self.base_path);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_ogro() {
        let c = CharacterConfig::default();
        assert_eq!(c.body_path(), PathBuf::from("./models/ogro/ogro.md2"));
        assert_eq!(c.skin_paths().count(), 1);
        assert_eq!(c.animations.r#move, "run");
        assert_eq!(c.animations.crouch_attack, "crattack");
        assert_eq!(c.walk_speed, 350.0);
        assert_eq!(c.crouch_speed, 175.0);
    }

    #[test]
    fn yaml_uses_plain_move_key() {
        let yaml = serde_yaml::to_string(&AnimationSet::default()).unwrap();
        assert!(yaml.contains("move: run"));
        let back: AnimationSet = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, AnimationSet::default());
    }

    #[test]
    fn rooting_keeps_absolute_paths() {
        let mut c = CharacterConfig::default();
        let rooted = c.rooted_at(Path::new("/srv/assets"));
        assert!(rooted.body_path().starts_with("/srv/assets"));

        c.base_path = PathBuf::from("/abs/ogro");
        assert_eq!(c.rooted_at(Path::new("/srv")).base_path, PathBuf::from("/abs/ogro"));
    }
}
