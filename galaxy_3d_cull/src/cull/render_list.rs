/// RenderList: the flattened per-frame output of a cull pass.
///
/// Storage is owned by one cull stage and reused across frames: every
/// pass clears the vectors to length 0 and keeps their capacity. Content
/// is frame-local and invalidated by the next pass of the same stage.
///
/// Light and clip-plane snapshots live in shared pools; each instruction
/// holds a range into them, so instructions under the same scope share
/// one snapshot.

use std::ops::Range;
use glam::{Mat4, Vec4};
use crate::scene::{ClipPlane, Fog, Light, Renderable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLight {
    pub light: Light,
    /// World transform of the group holding the light
    pub transform: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedClipPlane {
    pub clip_plane: ClipPlane,
    pub transform: Mat4,
    /// `clip_plane.plane` in world space
    pub world_plane: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedFog {
    pub fog: Fog,
    pub transform: Mat4,
}

/// One visible leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstruction<K> {
    pub node: K,
    /// World transform at the time of traversal
    pub transform: Mat4,
    pub renderable: Renderable,
    /// Innermost local fog in scope
    pub fog: Option<ResolvedFog>,
    lights: Range<usize>,
    clip_planes: Range<usize>,
}

/// Borrowed view of an instruction with its resolved snapshots.
#[derive(Debug, Clone, Copy)]
pub struct RenderEntry<'a, K> {
    pub instruction: &'a RenderInstruction<K>,
    pub lights: &'a [ResolvedLight],
    pub clip_planes: &'a [ResolvedClipPlane],
}

#[derive(Debug, Clone)]
pub struct RenderList<K> {
    instructions: Vec<RenderInstruction<K>>,
    light_pool: Vec<ResolvedLight>,
    clip_plane_pool: Vec<ResolvedClipPlane>,
    global_lights: Vec<ResolvedLight>,
    global_clip_planes: Vec<ResolvedClipPlane>,
    global_fog: Option<ResolvedFog>,
    culled: Vec<K>,
}

impl<K> Default for RenderList<K> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<K> RenderList<K> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instructions: Vec::with_capacity(capacity),
            light_pool: Vec::new(),
            clip_plane_pool: Vec::new(),
            global_lights: Vec::new(),
            global_clip_planes: Vec::new(),
            global_fog: None,
            culled: Vec::new(),
        }
    }

    /// Number of valid instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instructions backing storage can hold without growing.
    pub fn capacity(&self) -> usize {
        self.instructions.capacity()
    }

    pub fn instructions(&self) -> &[RenderInstruction<K>] {
        &self.instructions
    }

    pub fn entry(&self, index: usize) -> Option<RenderEntry<'_, K>> {
        self.instructions.get(index).map(|instruction| self.resolve(instruction))
    }

    /// Instructions in traversal order.
    pub fn entries(&self) -> impl Iterator<Item = RenderEntry<'_, K>> + '_ {
        self.instructions.iter().map(|instruction| self.resolve(instruction))
    }

    pub fn lights(&self, instruction: &RenderInstruction<K>) -> &[ResolvedLight] {
        &self.light_pool[instruction.lights.clone()]
    }

    pub fn clip_planes(&self, instruction: &RenderInstruction<K>) -> &[ResolvedClipPlane] {
        &self.clip_plane_pool[instruction.clip_planes.clone()]
    }

    pub fn global_lights(&self) -> &[ResolvedLight] {
        &self.global_lights
    }

    pub fn global_clip_planes(&self) -> &[ResolvedClipPlane] {
        &self.global_clip_planes
    }

    pub fn global_fog(&self) -> Option<&ResolvedFog> {
        self.global_fog.as_ref()
    }

    /// Roots of rejected subtrees; only filled with `record_culled`.
    pub fn culled(&self) -> &[K] {
        &self.culled
    }

    fn resolve<'a>(&'a self, instruction: &'a RenderInstruction<K>) -> RenderEntry<'a, K> {
        RenderEntry {
            instruction,
            lights: self.lights(instruction),
            clip_planes: self.clip_planes(instruction),
        }
    }

    // ===== STAGE-SIDE WRITES =====

    pub(crate) fn clear(&mut self) {
        self.instructions.clear();
        self.light_pool.clear();
        self.clip_plane_pool.clear();
        self.global_lights.clear();
        self.global_clip_planes.clear();
        self.global_fog = None;
        self.culled.clear();
    }

    /// Copy the active lights into the pool; returns the snapshot range.
    pub(crate) fn snapshot_lights(&mut self, active: &[ResolvedLight]) -> Range<usize> {
        let start = self.light_pool.len();
        self.light_pool.extend_from_slice(active);
        start..self.light_pool.len()
    }

    pub(crate) fn snapshot_clip_planes(&mut self, active: &[ResolvedClipPlane]) -> Range<usize> {
        let start = self.clip_plane_pool.len();
        self.clip_plane_pool.extend_from_slice(active);
        start..self.clip_plane_pool.len()
    }

    pub(crate) fn push_instruction(
        &mut self,
        node: K,
        transform: Mat4,
        renderable: Renderable,
        fog: Option<ResolvedFog>,
        lights: Range<usize>,
        clip_planes: Range<usize>,
    ) {
        self.instructions.push(RenderInstruction { node, transform, renderable, fog, lights, clip_planes });
    }

    /// Global lights are reported once per pass, keyed by handle.
    pub(crate) fn add_global_light(&mut self, light: ResolvedLight) {
        if !self.global_lights.iter().any(|l| l.light.handle == light.light.handle) {
            self.global_lights.push(light);
        }
    }

    pub(crate) fn add_global_clip_plane(&mut self, clip_plane: ResolvedClipPlane) {
        let handle = clip_plane.clip_plane.handle;
        if !self.global_clip_planes.iter().any(|c| c.clip_plane.handle == handle) {
            self.global_clip_planes.push(clip_plane);
        }
    }

    /// First global fog found wins.
    pub(crate) fn set_global_fog(&mut self, fog: ResolvedFog) {
        if self.global_fog.is_none() {
            self.global_fog = Some(fog);
        }
    }

    pub(crate) fn push_culled(&mut self, node: K) {
        self.culled.push(node);
    }
}
