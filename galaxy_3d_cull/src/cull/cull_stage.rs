/// Cull stage: depth-first traversal of a `Cullable` graph that turns one
/// viewpoint into a `RenderList`.
///
/// Per node:
/// - Group: tested against the frustum unless an ancestor was `AllIn`;
///   `AllOut` prunes the subtree. Its light, clip-plane and fog leaves are
///   scanned before its other children and popped when the group is left.
/// - Single: followed straight to its child (chains are iterated), with
///   no test of its own.
/// - Leaf: geometry is tested only below a `Partial` ancestor, effects are
///   emitted whenever their group is reached.
///
/// A group with Void bounds has no extent to test and inherits its
/// parent's classification. A rejected group whose subtree holds global
/// effects is still walked for them, so global output does not depend on
/// where the viewpoint looks.
///
/// The traversal runs from an explicit work stack, so graph depth is
/// bounded by memory rather than by the thread stack. All scratch stacks
/// and the output list belong to the stage and keep their capacity across
/// passes, so a steady-state frame allocates nothing.
/// One stage per worker allows passes to run in parallel over a shared graph.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use glam::Mat4;
use crate::bounds::BoundingVolume;
use crate::camera::{Frustum, FrustumResult, Viewpoint};
use crate::engine_err;
use crate::engine_trace;
use crate::error::{Error, Result};
use crate::scene::{CullNode, Cullable, NodeArity, Renderable};
use super::config::{CullConfig, EffectScope};
use super::render_list::{RenderList, ResolvedClipPlane, ResolvedFog, ResolvedLight};

const SOURCE: &str = "galaxy3d::Cull";

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullStatus {
    Complete,
    /// The terminate flag was raised; the list holds what was emitted
    /// before unwinding.
    Terminated,
}

/// Counters for the last pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CullStats {
    /// Nodes fetched from the graph (singles included)
    pub visited: usize,
    /// Tests that returned `AllOut`
    pub culled: usize,
    pub emitted: usize,
    /// Tests skipped below an `AllIn` ancestor
    pub all_in_skips: usize,
    /// Visits of nodes with more than one parent
    pub shared_visits: usize,
}

/// Application-defined test run after the frustum test.
///
/// The most restrictive of the two classifications wins. Not called for
/// nodes below an `AllIn` ancestor, nor when the frustum already
/// rejected the node.
pub trait CullTest<K> {
    fn classify(&self, node: K, bounds: &BoundingVolume, world: &Mat4) -> FrustumResult;
}

impl<K, F> CullTest<K> for F
where
    F: Fn(K, &BoundingVolume, &Mat4) -> FrustumResult,
{
    fn classify(&self, node: K, bounds: &BoundingVolume, world: &Mat4) -> FrustumResult {
        self(node, bounds, world)
    }
}

/// Light / clip-plane / fog stack lengths on entering a group.
type EffectMarks = (usize, usize, usize);

/// Pending traversal work. Children are pushed in reverse so they run in
/// graph order.
#[derive(Debug, Clone, Copy)]
enum Frame<K> {
    Visit { key: K, inherited: FrustumResult },
    /// Collect global effects only; nothing is emitted below
    Harvest { key: K },
    /// Leave a group: restore the effect stacks and pop its transform
    Leave { marks: EffectMarks, pops_transform: bool },
}

/// Read-only inputs of one pass.
struct Pass<'a, G: Cullable> {
    graph: &'a G,
    /// `None` for background passes
    frustum: Option<Frustum>,
    test: Option<&'a dyn CullTest<G::Key>>,
}

impl<G: Cullable> Pass<'_, G> {
    fn is_background(&self) -> bool {
        self.frustum.is_none()
    }
}

pub struct CullStage<K> {
    config: CullConfig,
    transforms: Vec<Mat4>,
    lights: Vec<ResolvedLight>,
    clip_planes: Vec<ResolvedClipPlane>,
    fogs: Vec<ResolvedFog>,
    /// Pool ranges of the current light / clip-plane scopes, taken lazily
    light_snapshot: Option<std::ops::Range<usize>>,
    clip_snapshot: Option<std::ops::Range<usize>>,
    frames: Vec<Frame<K>>,
    list: RenderList<K>,
    stats: CullStats,
    terminate: Arc<AtomicBool>,
}

impl<K: Copy + Eq + Debug> CullStage<K> {
    pub fn new(config: CullConfig) -> Self {
        Self {
            config,
            transforms: Vec::new(),
            lights: Vec::new(),
            clip_planes: Vec::new(),
            fogs: Vec::new(),
            light_snapshot: None,
            clip_snapshot: None,
            frames: Vec::new(),
            list: RenderList::with_capacity(config.initial_capacity),
            stats: CullStats::default(),
            terminate: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &CullConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CullConfig) {
        self.config = config;
    }

    /// Flag shared with the owning pipeline. Setting it makes an in-flight
    /// pass unwind at its next node; it stays set until the owner clears it.
    pub fn terminate_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.terminate)
    }

    /// Output of the last pass.
    pub fn render_list(&self) -> &RenderList<K> {
        &self.list
    }

    pub fn stats(&self) -> CullStats {
        self.stats
    }

    // ===== PASSES =====

    /// Cull the subtree at `root` against `viewpoint`.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` if the graph reports stale bounds
    /// - `InvalidNode` if the traversal meets a key the graph does not know
    pub fn cull<G>(&mut self, graph: &G, root: K, viewpoint: &Viewpoint) -> Result<CullStatus>
    where
        G: Cullable<Key = K>,
    {
        let pass = Pass { graph, frustum: Some(viewpoint.frustum()), test: None };
        self.run(&pass, root)
    }

    /// Like `cull`, with an additional application test per node.
    pub fn cull_with_test<G>(
        &mut self,
        graph: &G,
        root: K,
        viewpoint: &Viewpoint,
        test: &dyn CullTest<K>,
    ) -> Result<CullStatus>
    where
        G: Cullable<Key = K>,
    {
        let pass = Pass { graph, frustum: Some(viewpoint.frustum()), test: Some(test) };
        self.run(&pass, root)
    }

    /// Background (2D) pass: no frustum, identity transforms everywhere.
    pub fn cull_background<G>(&mut self, graph: &G, root: K) -> Result<CullStatus>
    where
        G: Cullable<Key = K>,
    {
        let pass = Pass { graph, frustum: None, test: None };
        self.run(&pass, root)
    }

    fn run<G>(&mut self, pass: &Pass<'_, G>, root: K) -> Result<CullStatus>
    where
        G: Cullable<Key = K>,
    {
        if pass.graph.bounds_stale() {
            return Err(engine_err!(SOURCE, "Scene bounds are stale, flush them (begin_cull) before culling"));
        }

        self.begin_frame();
        self.frames.push(Frame::Visit { key: root, inherited: FrustumResult::Partial });
        let outcome = self.traverse(pass);
        self.end_frame();
        outcome?;

        let status = if self.terminate.load(Ordering::Relaxed) {
            CullStatus::Terminated
        } else {
            CullStatus::Complete
        };
        engine_trace!(
            SOURCE,
            "Pass {:?}: visited={} culled={} emitted={} all_in_skips={} shared={}",
            status,
            self.stats.visited,
            self.stats.culled,
            self.stats.emitted,
            self.stats.all_in_skips,
            self.stats.shared_visits
        );
        Ok(status)
    }

    fn begin_frame(&mut self) {
        self.list.clear();
        self.stats = CullStats::default();
        self.transforms.clear();
        self.transforms.push(Mat4::IDENTITY);
        self.lights.clear();
        self.clip_planes.clear();
        self.fogs.clear();
        self.light_snapshot = None;
        self.clip_snapshot = None;
        self.frames.clear();
    }

    fn end_frame(&mut self) {
        self.frames.clear();
        self.transforms.clear();
        self.lights.clear();
        self.clip_planes.clear();
        self.fogs.clear();
        self.light_snapshot = None;
        self.clip_snapshot = None;
    }

    // ===== TRAVERSAL =====

    fn should_stop(&self) -> bool {
        self.terminate.load(Ordering::Relaxed)
    }

    fn fetch<'g, G>(&mut self, pass: &Pass<'g, G>, key: K) -> Result<CullNode<'g, K>>
    where
        G: Cullable<Key = K>,
    {
        let node = pass
            .graph
            .cull_node(key)
            .ok_or_else(|| Error::InvalidNode(format!("{:?} reached during cull", key)).logged(SOURCE))?;
        self.stats.visited += 1;
        if node.multiple_parents {
            self.stats.shared_visits += 1;
        }
        Ok(node)
    }

    fn traverse<G>(&mut self, pass: &Pass<'_, G>) -> Result<()>
    where
        G: Cullable<Key = K>,
    {
        while let Some(frame) = self.frames.pop() {
            match frame {
                Frame::Leave { marks, pops_transform } => {
                    self.pop_effects(marks);
                    if pops_transform {
                        self.transforms.pop();
                    }
                }
                _ if self.should_stop() => break,
                Frame::Visit { key, inherited } => self.visit(pass, key, inherited)?,
                Frame::Harvest { key } => self.harvest(pass, key)?,
            }
        }
        Ok(())
    }

    /// Follow a chain of singles to the first group or leaf. `None` when
    /// the chain ends empty, meets an invisible node, or the pass stops.
    fn resolve<'g, G>(&mut self, pass: &Pass<'g, G>, key: K) -> Result<Option<(K, CullNode<'g, K>)>>
    where
        G: Cullable<Key = K>,
    {
        let mut key = key;
        let mut node = self.fetch(pass, key)?;
        while let NodeArity::Single(child) = node.arity {
            if !node.visible || self.should_stop() {
                return Ok(None);
            }
            let Some(child) = child else {
                return Ok(None);
            };
            key = child;
            node = self.fetch(pass, key)?;
        }
        Ok(node.visible.then_some((key, node)))
    }

    fn visit<G>(&mut self, pass: &Pass<'_, G>, key: K, inherited: FrustumResult) -> Result<()>
    where
        G: Cullable<Key = K>,
    {
        let Some((key, node)) = self.resolve(pass, key)? else {
            return Ok(());
        };
        match node.arity {
            NodeArity::Group(children) => self.visit_group(pass, key, &node, children, inherited),
            NodeArity::Leaf(renderable) => self.visit_leaf(pass, key, &node, renderable, inherited),
            NodeArity::Single(_) => {}
        }
        Ok(())
    }

    fn visit_group<G>(
        &mut self,
        pass: &Pass<'_, G>,
        key: K,
        node: &CullNode<'_, K>,
        children: &[K],
        inherited: FrustumResult,
    ) where
        G: Cullable<Key = K>,
    {
        let (world, has_local) = self.group_world(pass, node);

        let result = if node.bounds.is_void() {
            inherited
        } else {
            self.classify(pass, key, node.bounds, &world, inherited)
        };
        if result == FrustumResult::AllOut {
            self.reject(key);
            if node.holds_global_effects {
                self.enter_harvest(pass, children, world, has_local);
            }
            return;
        }

        self.enter_group(world, has_local);
        let local_allowed = self.config.effect_scope == EffectScope::All;
        self.scope_effects(pass, children, &world, local_allowed);
        self.frames
            .extend(children.iter().rev().map(|&key| Frame::Visit { key, inherited: result }));
    }

    /// Walk a rejected subtree for its global effects.
    fn harvest<G>(&mut self, pass: &Pass<'_, G>, key: K) -> Result<()>
    where
        G: Cullable<Key = K>,
    {
        let Some((_, node)) = self.resolve(pass, key)? else {
            return Ok(());
        };
        if let NodeArity::Group(children) = node.arity {
            if node.holds_global_effects {
                let (world, has_local) = self.group_world(pass, &node);
                self.enter_harvest(pass, children, world, has_local);
            }
        }
        Ok(())
    }

    fn enter_harvest<G>(&mut self, pass: &Pass<'_, G>, children: &[K], world: Mat4, has_local: bool)
    where
        G: Cullable<Key = K>,
    {
        self.enter_group(world, has_local);
        self.scope_effects(pass, children, &world, false);

        // Leaves were handled by the scan above
        let graph = pass.graph;
        self.frames.extend(
            children
                .iter()
                .rev()
                .filter(|&&child| {
                    graph.cull_node(child).is_some_and(|n| {
                        n.holds_global_effects && !matches!(n.arity, NodeArity::Leaf(_))
                    })
                })
                .map(|&key| Frame::Harvest { key }),
        );
    }

    /// World transform of a group, and whether it adds a level to the
    /// transform stack. Background passes ignore local transforms.
    fn group_world<G>(&self, pass: &Pass<'_, G>, node: &CullNode<'_, K>) -> (Mat4, bool)
    where
        G: Cullable<Key = K>,
    {
        match node.transform.filter(|_| !pass.is_background()) {
            Some(local) => (self.current_transform() * *local, true),
            None => (self.current_transform(), false),
        }
    }

    /// Push the group's transform and the frame that undoes its scope.
    fn enter_group(&mut self, world: Mat4, has_local: bool) {
        if has_local {
            self.transforms.push(world);
        }
        let marks = (self.lights.len(), self.clip_planes.len(), self.fogs.len());
        self.frames.push(Frame::Leave { marks, pops_transform: has_local });
    }

    fn visit_leaf<G>(
        &mut self,
        pass: &Pass<'_, G>,
        key: K,
        node: &CullNode<'_, K>,
        renderable: &Renderable,
        inherited: FrustumResult,
    ) where
        G: Cullable<Key = K>,
    {
        match renderable {
            // Scoped by the enclosing group's scan
            Renderable::Light(_) | Renderable::ClipPlane(_) | Renderable::Fog(_) => {}
            Renderable::Geometry(_) => {
                let world = self.current_transform();
                if self.classify(pass, key, node.bounds, &world, inherited) == FrustumResult::AllOut {
                    self.reject(key);
                } else {
                    self.emit(key, world, *renderable);
                }
            }
            Renderable::Effect(_) => {
                let world = self.current_transform();
                self.emit(key, world, *renderable);
            }
        }
    }

    fn classify<G>(
        &mut self,
        pass: &Pass<'_, G>,
        key: K,
        bounds: &BoundingVolume,
        world: &Mat4,
        inherited: FrustumResult,
    ) -> FrustumResult
    where
        G: Cullable<Key = K>,
    {
        if inherited == FrustumResult::AllIn && self.config.propagate_all_in {
            self.stats.all_in_skips += 1;
            return FrustumResult::AllIn;
        }

        let mut result = match (&pass.frustum, self.config.frustum_culling) {
            (Some(frustum), true) => frustum.classify(bounds, world),
            _ => FrustumResult::AllIn,
        };
        if result != FrustumResult::AllOut {
            if let Some(test) = pass.test {
                result = result.restrict(test.classify(key, bounds, world));
            }
        }
        if result == FrustumResult::AllOut {
            self.stats.culled += 1;
        }
        result
    }

    fn current_transform(&self) -> Mat4 {
        self.transforms.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    fn reject(&mut self, key: K) {
        if self.config.record_culled {
            self.list.push_culled(key);
        }
    }

    fn emit(&mut self, key: K, world: Mat4, renderable: Renderable) {
        let lights = match self.light_snapshot.clone() {
            Some(range) => range,
            None => {
                let range = self.list.snapshot_lights(&self.lights);
                self.light_snapshot = Some(range.clone());
                range
            }
        };
        let clip_planes = match self.clip_snapshot.clone() {
            Some(range) => range,
            None => {
                let range = self.list.snapshot_clip_planes(&self.clip_planes);
                self.clip_snapshot = Some(range.clone());
                range
            }
        };
        let fog = self.fogs.last().copied();
        self.list.push_instruction(key, world, renderable, fog, lights, clip_planes);
        self.stats.emitted += 1;
    }

    // ===== EFFECT SCOPES =====

    /// Push the light, clip-plane and fog leaves among `children`. Local
    /// ones are skipped unless `local_allowed`.
    fn scope_effects<G>(&mut self, pass: &Pass<'_, G>, children: &[K], world: &Mat4, local_allowed: bool)
    where
        G: Cullable<Key = K>,
    {

        // Unknown children surface as errors when visited
        for node in children.iter().filter_map(|&child| pass.graph.cull_node(child)) {
            if !node.visible {
                continue;
            }
            let NodeArity::Leaf(renderable) = node.arity else {
                continue;
            };
            match *renderable {
                Renderable::Light(light) => {
                    let resolved = ResolvedLight { light, transform: *world };
                    if light.global {
                        self.list.add_global_light(resolved);
                    } else if local_allowed {
                        self.lights.push(resolved);
                        self.light_snapshot = None;
                    }
                }
                Renderable::ClipPlane(clip_plane) => {
                    let resolved = ResolvedClipPlane {
                        clip_plane,
                        transform: *world,
                        world_plane: clip_plane.world_plane(world),
                    };
                    if clip_plane.global {
                        self.list.add_global_clip_plane(resolved);
                    } else if local_allowed {
                        self.clip_planes.push(resolved);
                        self.clip_snapshot = None;
                    }
                }
                Renderable::Fog(fog) => {
                    let resolved = ResolvedFog { fog, transform: *world };
                    if fog.global {
                        self.list.set_global_fog(resolved);
                    } else if local_allowed {
                        self.fogs.push(resolved);
                    }
                }
                Renderable::Geometry(_) | Renderable::Effect(_) => {}
            }
        }
    }

    fn pop_effects(&mut self, (lights, clip_planes, fogs): EffectMarks) {
        if self.lights.len() != lights {
            self.lights.truncate(lights);
            self.light_snapshot = None;
        }
        if self.clip_planes.len() != clip_planes {
            self.clip_planes.truncate(clip_planes);
            self.clip_snapshot = None;
        }
        self.fogs.truncate(fogs);
    }
}

#[cfg(test)]
#[path = "cull_stage_tests.rs"]
mod tests;
