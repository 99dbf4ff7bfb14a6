use glam::{Vec2, Vec3};
use mirrorworld_common::{NodeId, Rgb, Transform};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Linear distance fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Rgb,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Rgb,
    pub intensity: f32,
}

/// Orthographic frustum the shadow map is rendered through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowCamera {
    pub near: f32,
    pub far: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    pub map_width: u32,
    pub map_height: u32,
    pub camera: ShadowCamera,
}

/// Directional light. Its direction runs from the node position toward the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: Rgb,
    pub intensity: f32,
    pub shadow: Option<ShadowSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wrapping {
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    Linear,
    Srgb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub source: PathBuf,
    pub wrap_s: Wrapping,
    pub wrap_t: Wrapping,
    pub repeat: Vec2,
    pub color_space: ColorSpace,
}

impl Texture {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            wrap_s: Wrapping::ClampToEdge,
            wrap_t: Wrapping::ClampToEdge,
            repeat: Vec2::ONE,
            color_space: ColorSpace::Linear,
        }
    }
}

/// Phong-shaded surface description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Rgb,
    pub map: Option<Texture>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Plane in the local XY plane, centered on the origin.
    Plane { width: f32, height: f32 },
    Box { size: Vec3 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
}

/// Render-side view of an animated character's root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterNode {
    pub animation: String,
    pub skin: usize,
    pub weapon: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    AmbientLight(AmbientLight),
    DirectionalLight(DirectionalLight),
    Mesh(Mesh),
    Character(CharacterNode),
}

/// A scene-graph node.
///
/// `Node` deliberately does not implement `Clone`: copies go through
/// `deep_clone`, which assigns a fresh `NodeId`.
#[derive(Debug, PartialEq)]
pub struct Node {
    id: NodeId,
    pub name: String,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            transform: Transform::default(),
            cast_shadow: false,
            receive_shadow: false,
            kind,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Independent copy with its own identity.
    pub fn deep_clone(&self) -> Node {
        Node {
            id: NodeId::new(),
            name: self.name.clone(),
            transform: self.transform,
            cast_shadow: self.cast_shadow,
            receive_shadow: self.receive_shadow,
            kind: self.kind.clone(),
        }
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(m) => Some(m),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(m) => Some(m),
            _ => None,
        }
    }
}

/// Root container for everything one view draws.
#[derive(Debug)]
pub struct Scene {
    pub background: Rgb,
    pub fog: Option<Fog>,
    nodes: Vec<Node>,
}

impl Scene {
    pub fn new(background: Rgb) -> Self {
        Self {
            background,
            fog: None,
            nodes: Vec::new(),
        }
    }

    /// Insert a node. Returns its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = node.id();
        tracing::trace!(node = %id.short(), name = %node.name, "node added");
        self.nodes.push(node);
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let idx = self.nodes.iter().position(|n| n.id() == id)?;
        Some(self.nodes.remove(idx))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// First node with the given name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground() -> Node {
        Node::new(
            "ground",
            NodeKind::Mesh(Mesh {
                geometry: Geometry::Plane {
                    width: 10.0,
                    height: 10.0,
                },
                material: Material {
                    color: Rgb::WHITE,
                    map: Some(Texture::new("grass.jpg")),
                },
            }),
        )
    }

    #[test]
    fn add_get_remove() {
        let mut scene = Scene::new(Rgb::WHITE);
        let id = scene.add(ground());
        assert_eq!(scene.len(), 1);
        assert!(scene.contains(id));
        assert_eq!(scene.find("ground").map(|n| n.id()), Some(id));

        let removed = scene.remove(id).unwrap();
        assert_eq!(removed.id(), id);
        assert!(scene.is_empty());
        assert!(scene.remove(id).is_none());
    }

    #[test]
    fn deep_clone_mints_new_identity() {
        let original = ground();
        let copy = original.deep_clone();
        assert_ne!(original.id(), copy.id());
        assert_eq!(original.kind, copy.kind);
        assert_eq!(original.name, copy.name);
    }

    #[test]
    fn deep_clone_is_independent() {
        let original = ground();
        let mut copy = original.deep_clone();
        copy.mesh_mut().unwrap().material.color = Rgb(0x123456);
        copy.transform.position = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(original.mesh().unwrap().material.color, Rgb::WHITE);
        assert_eq!(original.transform.position, Vec3::ZERO);
    }

    #[test]
    fn texture_defaults() {
        let t = Texture::new("a.png");
        assert_eq!(t.wrap_s, Wrapping::ClampToEdge);
        assert_eq!(t.repeat, Vec2::ONE);
    }
}
