/// Scene-graph node data: keys, flags and renderable classification.

use bitflags::bitflags;
use glam::{Mat4, Vec4};
use slotmap::new_key_type;
use crate::bounds::BoundingVolume;

new_key_type! {
    /// Stable key for a node within a SceneGraph.
    ///
    /// Keys remain valid even after other nodes are removed.
    /// A key becomes invalid only when its own node is removed.
    pub struct NodeKey;
}

bitflags! {
    /// Per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node and its subtree take part in culling.
        const VISIBLE = 1 << 0;
        /// Bounds were set explicitly and override aggregation.
        const EXPLICIT_BOUNDS = 1 << 1;
        /// Subtree holds a global light, clip plane or fog leaf.
        const GLOBAL_EFFECTS = 1 << 2;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        NodeFlags::VISIBLE
    }
}

/// Opaque handle interpreted only by the draw stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderableHandle(pub u64);

/// A light source leaf. Global lights affect the whole pass; local
/// lights affect only the subtree of the group that holds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Light {
    pub handle: RenderableHandle,
    pub global: bool,
}

/// A user clip plane `(A, B, C, D)` in the frame of the group holding it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    pub handle: RenderableHandle,
    pub plane: Vec4,
    pub global: bool,
}

impl ClipPlane {
    /// Plane moved into world space by `world`.
    ///
    /// Planes transform by the inverse transpose; a singular `world`
    /// leaves the plane unchanged.
    pub fn world_plane(&self, world: &Mat4) -> Vec4 {
        if world.determinant() == 0.0 {
            return self.plane;
        }
        world.inverse().transpose() * self.plane
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fog {
    pub handle: RenderableHandle,
    pub global: bool,
}

/// Classification of a leaf's renderable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Renderable {
    /// Drawable geometry; the only kind tested against the frustum.
    Geometry(RenderableHandle),
    Light(Light),
    ClipPlane(ClipPlane),
    Fog(Fog),
    /// Any other drawable effect (backgrounds, overlays). Carries no bounds
    /// and is emitted whenever its group is visited.
    Effect(RenderableHandle),
}

impl Renderable {
    pub fn handle(&self) -> RenderableHandle {
        match self {
            Renderable::Geometry(handle) | Renderable::Effect(handle) => *handle,
            Renderable::Light(light) => light.handle,
            Renderable::ClipPlane(clip) => clip.handle,
            Renderable::Fog(fog) => fog.handle,
        }
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, Renderable::Geometry(_))
    }

    /// Lights, clip planes and fog scope their group instead of drawing.
    pub fn is_scoping(&self) -> bool {
        matches!(self, Renderable::Light(_) | Renderable::ClipPlane(_) | Renderable::Fog(_))
    }

    /// Scoping renderable that applies to the whole pass.
    pub fn is_global_scoping(&self) -> bool {
        match self {
            Renderable::Light(light) => light.global,
            Renderable::ClipPlane(clip) => clip.global,
            Renderable::Fog(fog) => fog.global,
            Renderable::Geometry(_) | Renderable::Effect(_) => false,
        }
    }
}

/// Structural role of a node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeKind {
    Group { children: Vec<NodeKey> },
    Single { child: Option<NodeKey> },
    Leaf { renderable: Renderable },
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parents: Vec<NodeKey>,
    /// Local transform (groups only)
    pub(crate) transform: Option<Mat4>,
    /// Cached bounds in the node's own frame; explicit when flagged
    pub(crate) bounds: BoundingVolume,
    /// Geometry bounds of a leaf, kept apart from the cache
    pub(crate) geometry_bounds: BoundingVolume,
    pub(crate) flags: NodeFlags,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, transform: Option<Mat4>) -> Self {
        let mut flags = NodeFlags::default();
        if let NodeKind::Leaf { renderable } = &kind {
            flags.set(NodeFlags::GLOBAL_EFFECTS, renderable.is_global_scoping());
        }
        Self {
            kind,
            parents: Vec::new(),
            transform,
            bounds: BoundingVolume::Void,
            geometry_bounds: BoundingVolume::Void,
            flags,
        }
    }

    pub(crate) fn children(&self) -> &[NodeKey] {
        match &self.kind {
            NodeKind::Group { children } => children,
            NodeKind::Single { child: Some(child) } => std::slice::from_ref(child),
            NodeKind::Single { child: None } => &[],
            NodeKind::Leaf { .. } => &[],
        }
    }

    pub(crate) fn local_transform(&self) -> Mat4 {
        self.transform.unwrap_or(Mat4::IDENTITY)
    }
}
