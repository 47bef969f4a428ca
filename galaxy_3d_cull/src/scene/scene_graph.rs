/// SceneGraph: live node storage with lazily aggregated bounds.
///
/// Uses a SlotMap for O(1) insert/remove with stable keys. Nodes may be
/// shared (several parents), so the graph is a DAG; edits that would
/// create a cycle are rejected.
///
/// Bounds are cached per node in the node's own frame. An edit marks the
/// node and every ancestor dirty; dirty nodes are recomputed on demand
/// (`bounds`, `update_bounds`, `begin_cull`) and clean nodes reuse their
/// cached value.
///
/// Mutations are only permitted in `ScenePhase::Update`. Between
/// `begin_cull` and `end_cull` the graph is read-only.

use glam::Mat4;
use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use crate::bounds::{BoundingVolume, BoundsAccumulator};
use crate::engine_debug;
use crate::error::{Error, Result};
use super::cullable::{CullNode, Cullable, NodeArity};
use super::node::{Node, NodeFlags, NodeKey, NodeKind, Renderable, RenderableHandle};

const SOURCE: &str = "galaxy3d::SceneGraph";

/// Phase gate between application edits and culling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenePhase {
    /// Graph edits allowed
    #[default]
    Update,
    /// Graph is read-only
    Cull,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, Node>,
    root: Option<NodeKey>,
    /// Nodes whose cached bounds are stale (always closed under ancestors)
    dirty_bounds: FxHashSet<NodeKey>,
    phase: ScenePhase,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== CREATION =====

    /// Group without a local transform.
    pub fn create_group(&mut self) -> Result<NodeKey> {
        self.insert(NodeKind::Group { children: Vec::new() }, None)
    }

    /// Group whose children live in the frame given by `transform`.
    pub fn create_transform_group(&mut self, transform: Mat4) -> Result<NodeKey> {
        self.insert(NodeKind::Group { children: Vec::new() }, Some(transform))
    }

    /// Single-child node referencing a (possibly shared) subgraph.
    pub fn create_single(&mut self) -> Result<NodeKey> {
        self.insert(NodeKind::Single { child: None }, None)
    }

    /// Leaf with Void bounds. Use `set_geometry_bounds` for geometry.
    pub fn create_leaf(&mut self, renderable: Renderable) -> Result<NodeKey> {
        self.insert(NodeKind::Leaf { renderable }, None)
    }

    /// Geometry leaf with its local-space bounds.
    pub fn create_geometry(&mut self, handle: RenderableHandle, bounds: BoundingVolume) -> Result<NodeKey> {
        let key = self.create_leaf(Renderable::Geometry(handle))?;
        self.set_geometry_bounds(key, bounds)?;
        Ok(key)
    }

    fn insert(&mut self, kind: NodeKind, transform: Option<Mat4>) -> Result<NodeKey> {
        self.ensure_update_phase("create node")?;
        Ok(self.nodes.insert(Node::new(kind, transform)))
    }

    // ===== TOPOLOGY =====

    /// Attach `child` under `parent`.
    ///
    /// # Errors
    ///
    /// - `InvalidNode` if either key is unknown
    /// - `InvalidTopology` if `parent` is a leaf, a single that already has
    ///   a child, already holds `child`, or if the edge would create a cycle
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.ensure_update_phase("add_child")?;
        self.node(parent)?;
        self.node(child)?;

        if parent == child || self.is_ancestor(child, parent) {
            return Err(topology(format!("adding {:?} under {:?} would create a cycle", child, parent)));
        }

        let node = self.node_mut(parent)?;
        match &mut node.kind {
            NodeKind::Group { children } => {
                if children.contains(&child) {
                    return Err(topology(format!("{:?} is already a child of {:?}", child, parent)));
                }
                children.push(child);
            }
            NodeKind::Single { child: slot } => {
                if slot.is_some() {
                    return Err(topology(format!("single node {:?} already has a child", parent)));
                }
                *slot = Some(child);
            }
            NodeKind::Leaf { .. } => {
                return Err(topology(format!("leaf {:?} cannot have children", parent)));
            }
        }

        self.node_mut(child)?.parents.push(parent);
        self.mark_bounds_dirty(parent);
        Ok(())
    }

    /// Detach `child` from `parent`. The child itself stays alive.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.ensure_update_phase("remove_child")?;
        self.node(child)?;

        let node = self.node_mut(parent)?;
        let removed = match &mut node.kind {
            NodeKind::Group { children } => {
                let before = children.len();
                children.retain(|&c| c != child);
                children.len() != before
            }
            NodeKind::Single { child: slot } => {
                if *slot == Some(child) {
                    *slot = None;
                    true
                } else {
                    false
                }
            }
            NodeKind::Leaf { .. } => false,
        };
        if !removed {
            return Err(topology(format!("{:?} is not a child of {:?}", child, parent)));
        }

        let child_node = self.node_mut(child)?;
        if let Some(index) = child_node.parents.iter().position(|&p| p == parent) {
            child_node.parents.swap_remove(index);
        }
        self.mark_bounds_dirty(parent);
        Ok(())
    }

    /// Remove a node. Its parents lose it as a child and its children
    /// become detached from it (they are not removed).
    pub fn remove_node(&mut self, key: NodeKey) -> Result<()> {
        self.ensure_update_phase("remove_node")?;
        let node = self.node(key)?;
        let parents = node.parents.clone();
        let children = node.children().to_vec();

        for parent in parents {
            self.remove_child(parent, key)?;
        }
        for child in children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parents.retain(|&p| p != key);
            }
        }

        self.nodes.remove(key);
        self.dirty_bounds.remove(&key);
        if self.root == Some(key) {
            self.root = None;
        }
        Ok(())
    }

    pub fn set_root(&mut self, key: NodeKey) -> Result<()> {
        self.ensure_update_phase("set_root")?;
        self.node(key)?;
        self.root = Some(key);
        Ok(())
    }

    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    // ===== NODE STATE =====

    /// Set or clear a group's local transform.
    pub fn set_transform(&mut self, key: NodeKey, transform: Option<Mat4>) -> Result<()> {
        self.ensure_update_phase("set_transform")?;
        let node = self.node_mut(key)?;
        if !matches!(node.kind, NodeKind::Group { .. }) {
            return Err(topology(format!("only group nodes carry a transform, {:?} is not a group", key)));
        }
        node.transform = transform;
        // Parents aggregate this node's bounds through its transform
        let parents = node.parents.clone();
        for parent in parents {
            self.mark_bounds_dirty(parent);
        }
        Ok(())
    }

    pub fn transform(&self, key: NodeKey) -> Result<Option<Mat4>> {
        Ok(self.node(key)?.transform)
    }

    /// Override (or with `None`, restore) automatic aggregation on a
    /// group or single node.
    pub fn set_explicit_bounds(&mut self, key: NodeKey, bounds: Option<BoundingVolume>) -> Result<()> {
        self.ensure_update_phase("set_explicit_bounds")?;
        let node = self.node_mut(key)?;
        if matches!(node.kind, NodeKind::Leaf { .. }) {
            return Err(topology(format!("leaf {:?} takes geometry bounds, not explicit bounds", key)));
        }
        match bounds {
            Some(volume) => {
                node.flags.insert(NodeFlags::EXPLICIT_BOUNDS);
                node.bounds = volume;
            }
            None => node.flags.remove(NodeFlags::EXPLICIT_BOUNDS),
        }
        self.mark_bounds_dirty(key);
        Ok(())
    }

    pub fn has_explicit_bounds(&self, key: NodeKey) -> Result<bool> {
        Ok(self.node(key)?.flags.contains(NodeFlags::EXPLICIT_BOUNDS))
    }

    /// Set a geometry leaf's local-space bounds.
    pub fn set_geometry_bounds(&mut self, key: NodeKey, bounds: BoundingVolume) -> Result<()> {
        self.ensure_update_phase("set_geometry_bounds")?;
        let node = self.node_mut(key)?;
        match &node.kind {
            NodeKind::Leaf { renderable } if renderable.is_geometry() => {
                node.geometry_bounds = bounds;
            }
            _ => {
                return Err(topology(format!("{:?} is not a geometry leaf", key)));
            }
        }
        self.mark_bounds_dirty(key);
        Ok(())
    }

    pub fn set_visible(&mut self, key: NodeKey, visible: bool) -> Result<()> {
        self.ensure_update_phase("set_visible")?;
        self.node_mut(key)?.flags.set(NodeFlags::VISIBLE, visible);
        Ok(())
    }

    pub fn is_visible(&self, key: NodeKey) -> Result<bool> {
        Ok(self.node(key)?.flags.contains(NodeFlags::VISIBLE))
    }

    pub fn renderable(&self, key: NodeKey) -> Result<Option<&Renderable>> {
        Ok(match &self.node(key)?.kind {
            NodeKind::Leaf { renderable } => Some(renderable),
            _ => None,
        })
    }

    pub fn children(&self, key: NodeKey) -> Result<&[NodeKey]> {
        Ok(self.node(key)?.children())
    }

    pub fn parents(&self, key: NodeKey) -> Result<&[NodeKey]> {
        Ok(&self.node(key)?.parents)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ===== BOUNDS =====

    /// Bounds of `key` in its own frame, recomputing stale aggregates first.
    pub fn bounds(&mut self, key: NodeKey) -> Result<BoundingVolume> {
        self.node(key)?;
        self.refresh_bounds(key);
        Ok(self.node(key)?.bounds)
    }

    pub fn is_bounds_dirty(&self, key: NodeKey) -> bool {
        self.dirty_bounds.contains(&key)
    }

    /// Recompute every stale node. Returns the number of nodes recomputed.
    pub fn update_bounds(&mut self) -> usize {
        let pending: Vec<NodeKey> = self.dirty_bounds.iter().copied().collect();
        let mut recomputed = 0;
        for key in pending {
            recomputed += self.refresh_bounds(key);
        }
        recomputed
    }

    /// Post-order recompute of `key` and its dirty descendants.
    fn refresh_bounds(&mut self, key: NodeKey) -> usize {
        let mut recomputed = 0;
        let mut stack = vec![(key, false)];

        while let Some((current, expanded)) = stack.pop() {
            if !self.dirty_bounds.contains(&current) {
                continue;
            }
            let Some(node) = self.nodes.get(current) else {
                self.dirty_bounds.remove(&current);
                continue;
            };
            if expanded {
                let bounds = self.compute_bounds(node);
                let global_effects = self.holds_global_effects(node);
                if let Some(node) = self.nodes.get_mut(current) {
                    node.bounds = bounds;
                    node.flags.set(NodeFlags::GLOBAL_EFFECTS, global_effects);
                }
                self.dirty_bounds.remove(&current);
                recomputed += 1;
            } else {
                stack.push((current, true));
                for &child in node.children() {
                    if self.dirty_bounds.contains(&child) {
                        stack.push((child, false));
                    }
                }
            }
        }
        recomputed
    }

    /// Children are expected to be clean.
    fn compute_bounds(&self, node: &Node) -> BoundingVolume {
        if node.flags.contains(NodeFlags::EXPLICIT_BOUNDS) {
            return node.bounds;
        }
        match &node.kind {
            NodeKind::Leaf { .. } => node.geometry_bounds,
            NodeKind::Single { child } => child
                .and_then(|c| self.nodes.get(c))
                .map(|c| c.bounds.transformed(&c.local_transform()))
                .unwrap_or_default(),
            NodeKind::Group { children } => {
                let mut acc = BoundsAccumulator::new();
                for child in children.iter().filter_map(|&c| self.nodes.get(c)) {
                    acc.add_transformed(&child.bounds, &child.local_transform());
                }
                acc.finish()
            }
        }
    }

    /// Children are expected to be clean.
    fn holds_global_effects(&self, node: &Node) -> bool {
        match &node.kind {
            NodeKind::Leaf { renderable } => renderable.is_global_scoping(),
            _ => node
                .children()
                .iter()
                .filter_map(|&c| self.nodes.get(c))
                .any(|c| c.flags.contains(NodeFlags::GLOBAL_EFFECTS)),
        }
    }

    /// Flag `key` and all its ancestors; stops at already-dirty nodes.
    fn mark_bounds_dirty(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if !self.dirty_bounds.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                stack.extend_from_slice(&node.parents);
            }
        }
    }

    // ===== PHASES =====

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    /// Flush stale bounds and freeze the graph for culling.
    pub fn begin_cull(&mut self) -> Result<()> {
        if self.phase == ScenePhase::Cull {
            return Err(Error::BoundsWriteNotPermitted("begin_cull called during the cull phase".to_string())
                .logged(SOURCE));
        }
        let recomputed = self.update_bounds();
        if recomputed > 0 {
            engine_debug!(SOURCE, "Recomputed bounds of {} node(s) before culling", recomputed);
        }
        self.phase = ScenePhase::Cull;
        Ok(())
    }

    /// Return to the update phase.
    pub fn end_cull(&mut self) {
        self.phase = ScenePhase::Update;
    }

    // ===== INTERNAL HELPERS =====

    fn ensure_update_phase(&self, operation: &str) -> Result<()> {
        if self.phase != ScenePhase::Update {
            return Err(Error::BoundsWriteNotPermitted(format!(
                "{} is only permitted during the update phase", operation
            )).logged(SOURCE));
        }
        Ok(())
    }

    fn node(&self, key: NodeKey) -> Result<&Node> {
        self.nodes
            .get(key)
            .ok_or_else(|| Error::InvalidNode(format!("{:?}", key)).logged(SOURCE))
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut Node> {
        self.nodes
            .get_mut(key)
            .ok_or_else(|| Error::InvalidNode(format!("{:?}", key)).logged(SOURCE))
    }

    /// True if `ancestor` is reachable from `key` by following parent links.
    fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if current == ancestor {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                stack.extend_from_slice(&node.parents);
            }
        }
        false
    }
}

fn topology(message: String) -> Error {
    Error::InvalidTopology(message).logged(SOURCE)
}

impl Cullable for SceneGraph {
    type Key = NodeKey;

    fn cull_node(&self, key: NodeKey) -> Option<CullNode<'_, NodeKey>> {
        let node = self.nodes.get(key)?;
        let arity = match &node.kind {
            NodeKind::Group { children } => NodeArity::Group(children),
            NodeKind::Single { child } => NodeArity::Single(*child),
            NodeKind::Leaf { renderable } => NodeArity::Leaf(renderable),
        };
        Some(CullNode {
            arity,
            bounds: &node.bounds,
            transform: node.transform.as_ref(),
            visible: node.flags.contains(NodeFlags::VISIBLE),
            multiple_parents: node.parents.len() > 1,
            holds_global_effects: node.flags.contains(NodeFlags::GLOBAL_EFFECTS),
        })
    }

    fn bounds_stale(&self) -> bool {
        !self.dirty_bounds.is_empty()
    }
}

#[cfg(test)]
#[path = "scene_graph_tests.rs"]
mod tests;
