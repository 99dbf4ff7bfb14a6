use crate::config::WorldConfig;
use glam::Quat;
use mirrorworld_common::{NodeId, Transform};
use mirrorworld_render::{Geometry, Mesh, Node, NodeKind, Scene};
use std::f32::consts::FRAC_PI_2;

pub const AMBIENT: &str = "ambient";
pub const SUN: &str = "sun";
pub const GROUND: &str = "ground";

/// Ids of the world nodes inserted into one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldHandles {
    pub ambient: NodeId,
    pub sun: NodeId,
    pub ground: NodeId,
}

/// Builds the lights and ground once and hands each scene its own copy.
#[derive(Debug)]
pub struct WorldBuilder {
    ambient: Node,
    sun: Node,
    ground: Node,
}

impl WorldBuilder {
    pub fn new(config: &WorldConfig) -> Self {
        let ambient = Node::new(AMBIENT, NodeKind::AmbientLight(config.ambient));

        let mut sun = Node::new(SUN, NodeKind::DirectionalLight(config.sun));
        sun.transform = Transform::from_position(config.sun_position);
        sun.cast_shadow = config.sun.shadow.is_some();

        let g = &config.ground;
        let mut ground = Node::new(
            GROUND,
            NodeKind::Mesh(Mesh {
                geometry: Geometry::Plane {
                    width: g.size.x,
                    height: g.size.y,
                },
                material: g.material.clone(),
            }),
        );
        ground.transform.rotation = Quat::from_rotation_x(-FRAC_PI_2);
        ground.receive_shadow = g.receive_shadow;

        Self {
            ambient,
            sun,
            ground,
        }
    }

    /// Insert fresh clones of every world node into `scene`.
    pub fn populate(&self, scene: &mut Scene) -> WorldHandles {
        let handles = WorldHandles {
            ambient: scene.add(self.ambient.deep_clone()),
            sun: scene.add(self.sun.deep_clone()),
            ground: scene.add(self.ground.deep_clone()),
        };
        tracing::debug!(
            ground = %handles.ground.short(),
            nodes = scene.len(),
            "world populated"
        );
        handles
    }
}
