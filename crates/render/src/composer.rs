use crate::camera::Camera;
use crate::scene::Scene;
use crate::surface::{Frame, RenderError, RenderSurface};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloomSettings {
    pub intensity: f32,
    pub luminance_threshold: f32,
    pub luminance_smoothing: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            luminance_threshold: 0.9,
            luminance_smoothing: 0.025,
        }
    }
}

/// One stage of a post-processing chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    /// Draw the scene through the camera.
    Render,
    Bloom(BloomSettings),
    /// Downsample by `granularity` pixels per block.
    Pixelation { granularity: u32 },
}

/// Ordered post-processing pipeline for one surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composer {
    passes: Vec<Pass>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_passes(passes: impl IntoIterator<Item = Pass>) -> Self {
        let mut composer = Self::new();
        for pass in passes {
            composer.add_pass(pass);
        }
        composer
    }

    pub fn add_pass(&mut self, pass: Pass) {
        self.passes.push(pass);
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Run the chain once against `surface`.
    pub fn render<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        scene: &Scene,
        camera: &Camera,
    ) -> Result<(), RenderError> {
        if !matches!(self.passes.first(), Some(Pass::Render)) {
            return Err(RenderError::MissingRenderPass);
        }
        surface.render(&Frame {
            scene,
            camera,
            passes: &self.passes,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    Default,
    LowPower,
    HighPerformance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowFilter {
    Basic,
    Pcf,
    PcfSoft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowMapMode {
    pub enabled: bool,
    pub filter: ShadowFilter,
}

/// Options a surface is created with.
///
/// `stencil` and `depth` describe the presented framebuffer only; the scene
/// pass always renders with its own depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererOptions {
    pub power_preference: PowerPreference,
    pub antialias: bool,
    pub stencil: bool,
    pub depth: bool,
    pub shadow_map: ShadowMapMode,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            power_preference: PowerPreference::HighPerformance,
            antialias: true,
            stencil: false,
            depth: false,
            shadow_map: ShadowMapMode {
                enabled: true,
                filter: ShadowFilter::PcfSoft,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::surface::HeadlessSurface;
    use mirrorworld_common::{Rgb, SurfaceSize};

    fn camera() -> Camera {
        Camera::Perspective(PerspectiveCamera::new(45.0, 1.0, 1.0, 100.0))
    }

    #[test]
    fn passes_keep_insertion_order() {
        let c = Composer::with_passes([
            Pass::Render,
            Pass::Pixelation { granularity: 2 },
            Pass::Bloom(BloomSettings::default()),
        ]);
        assert_eq!(c.passes().len(), 3);
        assert_eq!(c.passes()[1], Pass::Pixelation { granularity: 2 });
    }

    #[test]
    fn render_forwards_passes_to_surface() {
        let c = Composer::with_passes([Pass::Render, Pass::Bloom(BloomSettings::default())]);
        let mut surface = HeadlessSurface::new(SurfaceSize::new(10, 10));
        c.render(&mut surface, &Scene::new(Rgb::WHITE), &camera()).unwrap();
        assert_eq!(surface.frames_rendered(), 1);
        assert_eq!(surface.last_frame().unwrap().passes, c.passes());
    }

    #[test]
    fn chain_without_render_pass_is_rejected() {
        let c = Composer::with_passes([Pass::Bloom(BloomSettings::default())]);
        let mut surface = HeadlessSurface::new(SurfaceSize::new(10, 10));
        let err = c
            .render(&mut surface, &Scene::new(Rgb::WHITE), &camera())
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingRenderPass));
        assert_eq!(surface.frames_rendered(), 0);
    }

    #[test]
    fn default_options_match_engine_setup() {
        let o = RendererOptions::default();
        assert_eq!(o.power_preference, PowerPreference::HighPerformance);
        assert!(o.antialias);
        assert!(!o.stencil && !o.depth);
        assert!(o.shadow_map.enabled);
        assert_eq!(o.shadow_map.filter, ShadowFilter::PcfSoft);
    }
}
