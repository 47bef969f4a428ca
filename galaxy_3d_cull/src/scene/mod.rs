//! Scene graph module
//!
//! Provides the node model, the live `SceneGraph`, and the read-only
//! `Cullable` view the cull stage traverses.

mod cullable;
mod node;
mod scene_graph;

pub use cullable::{Cullable, CullNode, NodeArity};
pub use node::{
    ClipPlane, Fog, Light, NodeFlags, NodeKey, Renderable, RenderableHandle,
};
pub use scene_graph::{SceneGraph, ScenePhase};
