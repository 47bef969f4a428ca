/// Cullable: the read-only view of a scene graph consumed by the cull stage.
///
/// The cull stage never mutates the graph and never interprets renderable
/// contents beyond their `Renderable` classification. Any graph storage
/// can be culled by implementing this trait.

use glam::Mat4;
use crate::bounds::BoundingVolume;
use super::node::Renderable;

/// Child layout of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeArity<'a, K> {
    Leaf(&'a Renderable),
    /// Shared-subgraph reference; `None` until a child is attached.
    Single(Option<K>),
    Group(&'a [K]),
}

/// Per-node data exposed to the cull stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullNode<'a, K> {
    pub arity: NodeArity<'a, K>,
    /// Bounds in the node's own frame (before its local transform).
    pub bounds: &'a BoundingVolume,
    /// Local transform of a group node. Ignored on singles and leaves.
    pub transform: Option<&'a Mat4>,
    pub visible: bool,
    /// Node is reachable through more than one parent.
    pub multiple_parents: bool,
    /// Subtree holds global lights, clip planes or fog. A subtree rejected
    /// by the frustum is still searched for them when set.
    pub holds_global_effects: bool,
}

pub trait Cullable {
    type Key: Copy + Eq + std::fmt::Debug;

    /// `None` when `key` does not name a live node.
    fn cull_node(&self, key: Self::Key) -> Option<CullNode<'_, Self::Key>>;

    /// True while cached bounds lag behind pending edits.
    fn bounds_stale(&self) -> bool {
        false
    }
}
