/// Tests for SceneGraph
///
/// These tests validate node lifecycle, topology rules, lazy bounds
/// aggregation, the update/cull phase gate, and the Cullable view.

use glam::{Mat4, Vec3};
use crate::bounds::{BoundingVolume, BoundingVolumeType};
use crate::error::Error;
use crate::scene::{Cullable, Light, NodeArity, Renderable, RenderableHandle};
use super::*;

// ============================================================================
// Helper Functions
// ============================================================================

fn aabb(min: [f32; 3], max: [f32; 3]) -> BoundingVolume {
    BoundingVolume::new_box(Vec3::from(min), Vec3::from(max))
}

fn geometry(graph: &mut SceneGraph, id: u64, bounds: BoundingVolume) -> NodeKey {
    graph.create_geometry(RenderableHandle(id), bounds).unwrap()
}

fn light(global: bool) -> Renderable {
    Renderable::Light(Light { handle: RenderableHandle(100), global })
}

// ============================================================================
// Aggregate bounds
// ============================================================================

#[test]
fn test_add_remove_children_updates_root_aggregate() {
    let mut graph = SceneGraph::new();
    let root = graph.create_group().unwrap();
    graph.set_root(root).unwrap();
    assert!(graph.bounds(root).unwrap().is_void());

    let first = geometry(&mut graph, 1, aabb([-2.0, 0.0, 0.0], [0.0, 2.0, 1.0]));
    graph.add_child(root, first).unwrap();
    assert_eq!(graph.bounds(root).unwrap(), aabb([-2.0, 0.0, 0.0], [0.0, 2.0, 1.0]));

    let second = geometry(&mut graph, 2, aabb([0.0, 0.0, 0.0], [2.0, 2.0, 1.0]));
    graph.add_child(root, second).unwrap();
    assert_eq!(graph.bounds(root).unwrap(), aabb([-2.0, 0.0, 0.0], [2.0, 2.0, 1.0]));

    graph.remove_child(root, first).unwrap();
    assert_eq!(graph.bounds(root).unwrap(), aabb([0.0, 0.0, 0.0], [2.0, 2.0, 1.0]));

    graph.remove_child(root, second).unwrap();
    assert!(graph.bounds(root).unwrap().is_void());
}

#[test]
fn test_child_transform_applies_to_aggregate() {
    let mut graph = SceneGraph::new();
    let root = graph.create_group().unwrap();
    let moved = graph.create_transform_group(Mat4::from_translation(Vec3::new(-1.0, 1.0, 0.5))).unwrap();
    let shape = geometry(&mut graph, 1, aabb([-1.0, -1.0, -0.5], [1.0, 1.0, 0.5]));
    graph.add_child(root, moved).unwrap();
    graph.add_child(moved, shape).unwrap();

    // The transform group's own bounds stay in its local frame
    assert_eq!(graph.bounds(moved).unwrap(), aabb([-1.0, -1.0, -0.5], [1.0, 1.0, 0.5]));
    assert_eq!(graph.bounds(root).unwrap(), aabb([-2.0, 0.0, 0.0], [0.0, 2.0, 1.0]));

    graph.set_transform(moved, None).unwrap();
    assert!(graph.is_bounds_dirty(root));
    assert_eq!(graph.bounds(root).unwrap(), aabb([-1.0, -1.0, -0.5], [1.0, 1.0, 0.5]));
}

#[test]
fn test_void_children_contribute_nothing() {
    let mut graph = SceneGraph::new();
    let root = graph.create_group().unwrap();
    let lamp = graph.create_leaf(light(false)).unwrap();
    let empty = graph.create_group().unwrap();
    graph.add_child(root, lamp).unwrap();
    graph.add_child(root, empty).unwrap();
    assert!(graph.bounds(root).unwrap().is_void());

    let shape = geometry(&mut graph, 1, aabb([0.0; 3], [1.0; 3]));
    graph.add_child(root, shape).unwrap();
    assert_eq!(graph.bounds(root).unwrap(), aabb([0.0; 3], [1.0; 3]));
}

#[test]
fn test_single_forwards_child_bounds() {
    let mut graph = SceneGraph::new();
    let single = graph.create_single().unwrap();
    assert!(graph.bounds(single).unwrap().is_void());

    let ball = geometry(&mut graph, 1, BoundingVolume::new_sphere(Vec3::ZERO, 2.0));
    graph.add_child(single, ball).unwrap();
    let bounds = graph.bounds(single).unwrap();
    assert_eq!(bounds.volume_type(), BoundingVolumeType::Sphere);
    assert_eq!(bounds, BoundingVolume::new_sphere(Vec3::ZERO, 2.0));

    // Groups always aggregate into a box
    let group = graph.create_group().unwrap();
    graph.add_child(group, single).unwrap();
    assert_eq!(graph.bounds(group).unwrap(), aabb([-2.0; 3], [2.0; 3]));
}

#[test]
fn test_explicit_bounds_override_aggregation() {
    let mut graph = SceneGraph::new();
    let root = graph.create_group().unwrap();
    let shape = geometry(&mut graph, 1, aabb([0.0; 3], [1.0; 3]));
    graph.add_child(root, shape).unwrap();

    let fixed = BoundingVolume::new_sphere(Vec3::ZERO, 50.0);
    graph.set_explicit_bounds(root, Some(fixed)).unwrap();
    assert!(graph.has_explicit_bounds(root).unwrap());
    assert_eq!(graph.bounds(root).unwrap(), fixed);

    graph.set_geometry_bounds(shape, aabb([0.0; 3], [3.0; 3])).unwrap();
    assert_eq!(graph.bounds(root).unwrap(), fixed);

    graph.set_explicit_bounds(root, None).unwrap();
    assert_eq!(graph.bounds(root).unwrap(), aabb([0.0; 3], [3.0; 3]));
}

#[test]
fn test_inverted_bounds_round_trip() {
    let mut graph = SceneGraph::new();
    let inverted = aabb([1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]);
    let shape = geometry(&mut graph, 1, inverted);
    let bounds = graph.bounds(shape).unwrap();
    assert_eq!(bounds.minimum(), Vec3::ONE);
    assert_eq!(bounds.maximum(), -Vec3::ONE);
}

// ============================================================================
// Lazy recomputation
// ============================================================================

#[test]
fn test_dirty_flags_climb_ancestors_only() {
    let mut graph = SceneGraph::new();
    let root = graph.create_group().unwrap();
    let a = graph.create_group().unwrap();
    let b = graph.create_group().unwrap();
    let leaf_a = geometry(&mut graph, 1, aabb([0.0; 3], [1.0; 3]));
    let leaf_b = geometry(&mut graph, 2, aabb([2.0; 3], [3.0; 3]));
    graph.add_child(root, a).unwrap();
    graph.add_child(root, b).unwrap();
    graph.add_child(a, leaf_a).unwrap();
    graph.add_child(b, leaf_b).unwrap();
    graph.update_bounds();
    assert!(!graph.bounds_stale());

    graph.set_geometry_bounds(leaf_a, aabb([-1.0; 3], [1.0; 3])).unwrap();
    assert!(graph.is_bounds_dirty(leaf_a));
    assert!(graph.is_bounds_dirty(a));
    assert!(graph.is_bounds_dirty(root));
    assert!(!graph.is_bounds_dirty(b));
    assert!(!graph.is_bounds_dirty(leaf_b));

    assert_eq!(graph.update_bounds(), 3);
    assert_eq!(graph.bounds(root).unwrap(), aabb([-1.0; 3], [3.0; 3]));
    assert_eq!(graph.update_bounds(), 0);
}

#[test]
fn test_shared_child_dirties_every_parent() {
    let mut graph = SceneGraph::new();
    let left = graph.create_group().unwrap();
    let right = graph.create_group().unwrap();
    let shared = geometry(&mut graph, 1, aabb([0.0; 3], [1.0; 3]));
    graph.add_child(left, shared).unwrap();
    graph.add_child(right, shared).unwrap();
    graph.update_bounds();

    graph.set_geometry_bounds(shared, aabb([0.0; 3], [2.0; 3])).unwrap();
    assert!(graph.is_bounds_dirty(left));
    assert!(graph.is_bounds_dirty(right));
    assert_eq!(graph.bounds(right).unwrap(), aabb([0.0; 3], [2.0; 3]));
    // Refreshing one parent leaves the other pending
    assert!(graph.is_bounds_dirty(left));
    assert_eq!(graph.bounds(left).unwrap(), aabb([0.0; 3], [2.0; 3]));
}

// ============================================================================
// Topology rules
// ============================================================================

#[test]
fn test_cycles_are_rejected() {
    let mut graph = SceneGraph::new();
    let a = graph.create_group().unwrap();
    let b = graph.create_group().unwrap();
    let c = graph.create_single().unwrap();
    graph.add_child(a, b).unwrap();
    graph.add_child(b, c).unwrap();

    assert!(matches!(graph.add_child(c, a), Err(Error::InvalidTopology(_))));
    assert!(matches!(graph.add_child(a, a), Err(Error::InvalidTopology(_))));
    assert_eq!(graph.children(c).unwrap(), &[] as &[NodeKey]);
}

#[test]
fn test_arity_rules() {
    let mut graph = SceneGraph::new();
    let group = graph.create_group().unwrap();
    let single = graph.create_single().unwrap();
    let leaf = geometry(&mut graph, 1, aabb([0.0; 3], [1.0; 3]));
    let other = geometry(&mut graph, 2, aabb([0.0; 3], [1.0; 3]));

    assert!(matches!(graph.add_child(leaf, other), Err(Error::InvalidTopology(_))));

    graph.add_child(single, leaf).unwrap();
    assert!(matches!(graph.add_child(single, other), Err(Error::InvalidTopology(_))));

    graph.add_child(group, leaf).unwrap();
    assert!(matches!(graph.add_child(group, leaf), Err(Error::InvalidTopology(_))));
    assert!(matches!(graph.remove_child(group, other), Err(Error::InvalidTopology(_))));
}

#[test]
fn test_node_role_restrictions() {
    let mut graph = SceneGraph::new();
    let leaf = geometry(&mut graph, 1, aabb([0.0; 3], [1.0; 3]));
    let lamp = graph.create_leaf(light(true)).unwrap();
    let single = graph.create_single().unwrap();

    assert!(matches!(graph.set_transform(leaf, Some(Mat4::IDENTITY)), Err(Error::InvalidTopology(_))));
    assert!(matches!(graph.set_transform(single, Some(Mat4::IDENTITY)), Err(Error::InvalidTopology(_))));
    assert!(matches!(graph.set_explicit_bounds(leaf, None), Err(Error::InvalidTopology(_))));
    assert!(matches!(
        graph.set_geometry_bounds(lamp, aabb([0.0; 3], [1.0; 3])),
        Err(Error::InvalidTopology(_))
    ));
    assert!(graph.bounds(lamp).unwrap().is_void());
}

#[test]
fn test_remove_node_detaches_edges() {
    let mut graph = SceneGraph::new();
    let root = graph.create_group().unwrap();
    let middle = graph.create_group().unwrap();
    let leaf = geometry(&mut graph, 1, aabb([0.0; 3], [1.0; 3]));
    graph.set_root(root).unwrap();
    graph.add_child(root, middle).unwrap();
    graph.add_child(middle, leaf).unwrap();
    assert_eq!(graph.bounds(root).unwrap(), aabb([0.0; 3], [1.0; 3]));

    graph.remove_node(middle).unwrap();
    assert!(!graph.contains(middle));
    assert_eq!(graph.node_count(), 2);
    assert!(graph.children(root).unwrap().is_empty());
    assert!(graph.parents(leaf).unwrap().is_empty());
    assert!(graph.bounds(root).unwrap().is_void());

    graph.remove_node(root).unwrap();
    assert_eq!(graph.root(), None);
}

#[test]
fn test_unknown_keys_are_errors() {
    let mut graph = SceneGraph::new();
    let gone = graph.create_group().unwrap();
    graph.remove_node(gone).unwrap();

    assert!(matches!(graph.bounds(gone), Err(Error::InvalidNode(_))));
    assert!(matches!(graph.set_root(gone), Err(Error::InvalidNode(_))));
    assert!(matches!(graph.remove_node(gone), Err(Error::InvalidNode(_))));
    let group = graph.create_group().unwrap();
    assert!(matches!(graph.add_child(group, gone), Err(Error::InvalidNode(_))));
    assert!(graph.cull_node(gone).is_none());
}

// ============================================================================
// Phases
// ============================================================================

#[test]
fn test_mutations_rejected_during_cull_phase() {
    let mut graph = SceneGraph::new();
    let root = graph.create_group().unwrap();
    let leaf = geometry(&mut graph, 1, aabb([0.0; 3], [1.0; 3]));
    graph.add_child(root, leaf).unwrap();

    graph.begin_cull().unwrap();
    assert_eq!(graph.phase(), ScenePhase::Cull);
    assert!(!graph.bounds_stale());

    assert!(matches!(graph.create_group(), Err(Error::BoundsWriteNotPermitted(_))));
    assert!(matches!(
        graph.set_geometry_bounds(leaf, aabb([0.0; 3], [2.0; 3])),
        Err(Error::BoundsWriteNotPermitted(_))
    ));
    assert!(matches!(graph.remove_child(root, leaf), Err(Error::BoundsWriteNotPermitted(_))));
    assert!(matches!(graph.set_visible(leaf, false), Err(Error::BoundsWriteNotPermitted(_))));
    assert!(matches!(graph.begin_cull(), Err(Error::BoundsWriteNotPermitted(_))));

    // Reads still work
    assert_eq!(graph.bounds(root).unwrap(), aabb([0.0; 3], [1.0; 3]));

    graph.end_cull();
    assert_eq!(graph.phase(), ScenePhase::Update);
    graph.set_visible(leaf, false).unwrap();
    assert!(!graph.is_visible(leaf).unwrap());
}

// ============================================================================
// Cullable view
// ============================================================================

#[test]
fn test_cull_node_view() {
    let mut graph = SceneGraph::new();
    let left = graph.create_transform_group(Mat4::from_translation(Vec3::X)).unwrap();
    let right = graph.create_group().unwrap();
    let single = graph.create_single().unwrap();
    let leaf = geometry(&mut graph, 9, aabb([0.0; 3], [1.0; 3]));
    graph.add_child(left, single).unwrap();
    graph.add_child(right, single).unwrap();
    graph.add_child(single, leaf).unwrap();
    graph.begin_cull().unwrap();

    let view = graph.cull_node(left).unwrap();
    assert_eq!(view.arity, NodeArity::Group(&[single]));
    assert_eq!(view.transform, Some(&Mat4::from_translation(Vec3::X)));
    assert!(view.visible);
    assert!(!view.multiple_parents);

    let view = graph.cull_node(single).unwrap();
    assert_eq!(view.arity, NodeArity::Single(Some(leaf)));
    assert!(view.multiple_parents);

    let view = graph.cull_node(leaf).unwrap();
    assert_eq!(view.arity, NodeArity::Leaf(&Renderable::Geometry(RenderableHandle(9))));
    assert_eq!(*view.bounds, aabb([0.0; 3], [1.0; 3]));
    assert_eq!(graph.renderable(leaf).unwrap(), Some(&Renderable::Geometry(RenderableHandle(9))));
}

#[test]
fn test_global_effects_tracked_per_subtree() {
    let mut graph = SceneGraph::new();
    let root = graph.create_group().unwrap();
    let single = graph.create_single().unwrap();
    let holder = graph.create_group().unwrap();
    let other = graph.create_group().unwrap();
    let sun = graph.create_leaf(light(true)).unwrap();
    let lamp = graph.create_leaf(light(false)).unwrap();
    graph.add_child(root, single).unwrap();
    graph.add_child(single, holder).unwrap();
    graph.add_child(holder, sun).unwrap();
    graph.add_child(root, other).unwrap();
    graph.add_child(other, lamp).unwrap();
    graph.begin_cull().unwrap();

    let holds = |graph: &SceneGraph, key| graph.cull_node(key).unwrap().holds_global_effects;
    assert!(holds(&graph, sun));
    assert!(!holds(&graph, lamp));
    assert!(holds(&graph, holder));
    assert!(holds(&graph, single));
    assert!(holds(&graph, root));
    assert!(!holds(&graph, other));
    graph.end_cull();

    graph.remove_child(holder, sun).unwrap();
    graph.begin_cull().unwrap();
    assert!(!holds(&graph, holder));
    assert!(!holds(&graph, root));
}
