//! Rendering Adapter: renderer-agnostic scene graph, cameras, post-processing
//! passes and the `RenderSurface` interface backends implement.
//!
//! # Invariants
//! - Surfaces read scene and camera state; they never mutate it.
//! - Every node carries its own identity; cloning a node always mints a new one.
//!
//! `HeadlessSurface` records what it was asked to draw and backs the tests and
//! the CLI. The wgpu backend lives in `mirrorworld-render-wgpu`.

mod camera;
mod clock;
mod composer;
mod renderer;
mod scene;
mod surface;

pub use camera::{Camera, OrthographicCamera, PerspectiveCamera};
pub use clock::{Clock, FixedClock, SystemClock};
pub use composer::{
    BloomSettings, Composer, Pass, PowerPreference, RendererOptions, ShadowFilter, ShadowMapMode,
};
pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::{
    AmbientLight, CharacterNode, ColorSpace, DirectionalLight, Fog, Geometry, Material, Mesh,
    Node, NodeKind, Scene, ShadowCamera, ShadowSettings, Texture, Wrapping,
};
pub use surface::{Frame, FrameCapture, FrameRecord, HeadlessSurface, RenderError, RenderSurface};

pub fn crate_info() -> &'static str {
    "mirrorworld-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
