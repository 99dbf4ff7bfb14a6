use crate::error::ConfigError;
use glam::{Vec2, Vec3};
use mirrorworld_character::CharacterConfig;
use mirrorworld_common::Rgb;
use mirrorworld_input::KeyBindings;
use mirrorworld_render::{
    AmbientLight, BloomSettings, ColorSpace, DirectionalLight, Fog, Material, Pass,
    RendererOptions, ShadowCamera, ShadowSettings, Texture, Wrapping,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Lens, backdrop and post chain of the perspective view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub background: Rgb,
    pub fog: Option<Fog>,
    pub passes: Vec<Pass>,
}

impl Default for PerspectiveConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 1.0,
            far: 4000.0,
            background: Rgb::WHITE,
            fog: Some(default_fog()),
            passes: vec![
                Pass::Render,
                Pass::Bloom(BloomSettings {
                    intensity: 0.75,
                    luminance_threshold: 0.5,
                    luminance_smoothing: 0.5,
                }),
            ],
        }
    }
}

/// Fixed vantage points for the orthographic view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewpoint {
    Top,
    Front,
    Right,
    #[default]
    Left,
}

impl Viewpoint {
    pub const ALL: [Viewpoint; 4] = [
        Viewpoint::Top,
        Viewpoint::Front,
        Viewpoint::Right,
        Viewpoint::Left,
    ];

    /// Camera position; the camera always looks at the origin from here.
    pub fn position(self) -> Vec3 {
        match self {
            Viewpoint::Top => Vec3::new(0.0, 500.0, 0.0),
            Viewpoint::Front => Vec3::new(0.0, 0.0, 500.0),
            Viewpoint::Right => Vec3::new(500.0, 0.0, 0.0),
            Viewpoint::Left => Vec3::new(-500.0, 100.0, 0.0),
        }
    }
}

impl fmt::Display for Viewpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Viewpoint::Top => "top",
            Viewpoint::Front => "front",
            Viewpoint::Right => "right",
            Viewpoint::Left => "left",
        };
        f.write_str(name)
    }
}

impl FromStr for Viewpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Viewpoint::ALL
            .into_iter()
            .find(|v| v.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::Invalid(format!("unknown viewpoint `{s}`")))
    }
}

/// Lens, backdrop and post chain of the orthographic view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrthographicConfig {
    /// Frustum half-height before zoom; the half-width follows the aspect.
    pub frustum_size: f32,
    pub near: f32,
    pub far: f32,
    pub zoom: f32,
    pub background: Rgb,
    pub fog: Option<Fog>,
    pub passes: Vec<Pass>,
    pub viewpoint: Viewpoint,
}

impl Default for OrthographicConfig {
    fn default() -> Self {
        Self {
            frustum_size: 2.0,
            near: 0.1,
            far: 1000.0,
            zoom: 0.0075,
            background: Rgb::WHITE,
            fog: Some(default_fog()),
            passes: vec![
                Pass::Render,
                Pass::Pixelation { granularity: 2 },
                Pass::Bloom(BloomSettings {
                    intensity: 0.25,
                    ..BloomSettings::default()
                }),
            ],
            viewpoint: Viewpoint::Left,
        }
    }
}

fn default_fog() -> Fog {
    Fog {
        color: Rgb::WHITE,
        near: 1000.0,
        far: 4000.0,
    }
}

/// Damped follow of the perspective camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EaseConfig {
    /// Approximate seconds to reach the goal.
    pub smooth_time: f32,
    /// Distance under which a transition snaps to its goal.
    pub rest_threshold: f32,
    pub initial_eye: Vec3,
    pub initial_target: Vec3,
    /// Eye offset from the character root while following.
    pub follow_offset: Vec3,
}

impl Default for EaseConfig {
    fn default() -> Self {
        Self {
            smooth_time: 0.25,
            rest_threshold: 0.01,
            initial_eye: Vec3::new(0.0, 270.0, -500.0),
            initial_target: Vec3::ZERO,
            follow_offset: Vec3::new(0.0, 200.0, -500.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub size: Vec2,
    pub material: Material,
    pub receive_shadow: bool,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: Vec2::splat(16000.0),
            material: Material {
                color: Rgb::WHITE,
                map: Some(Texture {
                    source: "textures/terrain/grasslight-big.jpg".into(),
                    wrap_s: Wrapping::Repeat,
                    wrap_t: Wrapping::Repeat,
                    repeat: Vec2::splat(64.0),
                    color_space: ColorSpace::Srgb,
                }),
            },
            receive_shadow: true,
        }
    }
}

/// Lights and ground shared by both scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
    pub sun_position: Vec3,
    pub ground: GroundConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: Rgb(0x666666),
                intensity: 3.0,
            },
            sun: DirectionalLight {
                color: Rgb::WHITE,
                intensity: 7.0,
                shadow: Some(ShadowSettings {
                    map_width: 1024,
                    map_height: 512,
                    camera: ShadowCamera {
                        near: 100.0,
                        far: 1200.0,
                        left: -1000.0,
                        right: 1000.0,
                        top: 350.0,
                        bottom: -350.0,
                    },
                }),
            },
            sun_position: Vec3::new(200.0, 450.0, 500.0),
            ground: GroundConfig::default(),
        }
    }
}

/// Per-rig setup applied before the parts arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub character: CharacterConfig,
    pub scale: f32,
    pub skin: usize,
    pub weapon: usize,
    pub initial_animation: String,
    pub cast_shadow: bool,
    /// Where the root stands on the ground plane before it moves.
    pub position: Vec3,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            character: CharacterConfig::default(),
            scale: 3.0,
            skin: 0,
            weapon: 0,
            initial_animation: "stand".into(),
            cast_shadow: true,
            position: Vec3::ZERO,
        }
    }
}

/// Everything the engine is built from. `Default` is the stock setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub primary: PerspectiveConfig,
    pub secondary: OrthographicConfig,
    pub ease: EaseConfig,
    pub renderer: RendererOptions,
    pub world: WorldConfig,
    pub rig: RigConfig,
    pub bindings: KeyBindings,
    /// How long the secondary view shows its freeze-frame after a resize.
    pub freeze_frame_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary: PerspectiveConfig::default(),
            secondary: OrthographicConfig::default(),
            ease: EaseConfig::default(),
            renderer: RendererOptions::default(),
            world: WorldConfig::default(),
            rig: RigConfig::default(),
            bindings: KeyBindings::default(),
            freeze_frame_ms: 100,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Parse and validate. Missing fields take their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.primary;
        if !(p.fov > 0.0 && p.fov < 180.0) {
            return Err(ConfigError::Invalid(format!("primary fov {} out of range", p.fov)));
        }
        check_clip("primary", p.near, p.far)?;
        check_passes("primary", &p.passes)?;

        let s = &self.secondary;
        if s.frustum_size <= 0.0 || s.zoom <= 0.0 {
            return Err(ConfigError::Invalid(
                "secondary frustum_size and zoom must be positive".into(),
            ));
        }
        check_clip("secondary", s.near, s.far)?;
        check_passes("secondary", &s.passes)?;

        if self.ease.smooth_time < 0.0 {
            return Err(ConfigError::Invalid("ease smooth_time must not be negative".into()));
        }
        if self.rig.scale <= 0.0 {
            return Err(ConfigError::Invalid("rig scale must be positive".into()));
        }
        Ok(())
    }
}

fn check_clip(view: &str, near: f32, far: f32) -> Result<(), ConfigError> {
    if near > 0.0 && far > near {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{view} clip planes must satisfy 0 < near < far (got {near}..{far})"
        )))
    }
}

fn check_passes(view: &str, passes: &[Pass]) -> Result<(), ConfigError> {
    match passes.first() {
        Some(Pass::Render) => Ok(()),
        _ => Err(ConfigError::Invalid(format!(
            "{view} passes must start with `render`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn yaml_dump_parses_back() {
        let config = EngineConfig::default();
        let text = config.to_yaml().unwrap();
        assert!(text.contains("freeze_frame_ms: 100"));
        assert_eq!(EngineConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = EngineConfig::from_yaml_str(
            "secondary:\n  viewpoint: top\n  zoom: 0.01\nfreeze_frame_ms: 250\n",
        )
        .unwrap();
        assert_eq!(config.secondary.viewpoint, Viewpoint::Top);
        assert_eq!(config.secondary.zoom, 0.01);
        assert_eq!(config.secondary.frustum_size, 2.0);
        assert_eq!(config.freeze_frame_ms, 250);
        assert_eq!(config.primary, PerspectiveConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_yaml_str("primary:\n  near: 10\n  far: 5\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("secondary:\n  passes: []\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("primary: 7"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        std::fs::write(&path, "rig:\n  scale: 2.5\n").unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap().rig.scale, 2.5);

        let missing = EngineConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn viewpoints_parse_case_insensitively() {
        assert_eq!("TOP".parse::<Viewpoint>().unwrap(), Viewpoint::Top);
        assert_eq!(Viewpoint::default().position(), Vec3::new(-500.0, 100.0, 0.0));
        assert!("diagonal".parse::<Viewpoint>().is_err());
    }

    #[test]
    fn stock_constants() {
        let c = EngineConfig::default();
        assert_eq!(c.primary.passes.len(), 2);
        assert_eq!(c.secondary.passes[1], Pass::Pixelation { granularity: 2 });
        assert_eq!(c.world.ambient.color, Rgb(0x666666));
        assert_eq!(c.world.sun.shadow.map(|s| s.map_width), Some(1024));
        assert_eq!(c.rig.character.walk_speed, 350.0);
        assert_eq!(c.ease.follow_offset, Vec3::new(0.0, 200.0, -500.0));
    }
}
