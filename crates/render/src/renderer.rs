use crate::camera::Camera;
use crate::scene::{NodeKind, Scene};
use std::fmt::Write;

/// Renderer-agnostic interface for producing one output from a scene.
///
/// Renderers read the scene and camera, never mutate them.
pub trait Renderer {
    type Output;

    fn render(&self, scene: &Scene, camera: &Camera) -> Self::Output;
}

/// Human-readable dump of a scene, for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn kind_label(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::AmbientLight(_) => "ambient",
        NodeKind::DirectionalLight(_) => "directional",
        NodeKind::Mesh(_) => "mesh",
        NodeKind::Character(_) => "character",
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &Camera) -> String {
        let mut out = String::new();
        let lens = match camera {
            Camera::Perspective(c) => format!("perspective fov={:.0}", c.fov),
            Camera::Orthographic(c) => format!("orthographic zoom={}", c.zoom),
        };
        let eye = camera.position();
        let target = camera.target();
        let _ = writeln!(out, "=== Scene ({} nodes) ===", scene.len());
        let _ = writeln!(
            out,
            "Camera: {lens} eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1})",
            eye.x, eye.y, eye.z, target.x, target.y, target.z
        );

        for node in scene.nodes() {
            let p = node.transform.position;
            let _ = write!(
                out,
                "  [{}] {:<11} {:<10} pos=({:.2}, {:.2}, {:.2})",
                node.id().short(),
                kind_label(&node.kind),
                node.name,
                p.x,
                p.y,
                p.z
            );
            if let NodeKind::Character(c) = &node.kind {
                let _ = write!(out, " anim={}", c.animation);
            }
            out.push('\n');
        }

        out
    }
}
