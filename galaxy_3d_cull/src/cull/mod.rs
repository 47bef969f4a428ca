//! Cull module
//!
//! Turns a `Cullable` graph and a viewpoint into a flat `RenderList`,
//! one pass per stage, optionally fanned out over rayon.

mod config;
mod cull_stage;
mod parallel;
mod render_list;

pub use config::{CullConfig, EffectScope};
pub use cull_stage::{CullStage, CullStats, CullStatus, CullTest};
pub use parallel::{cull_parallel, CullJob};
pub use render_list::{
    RenderEntry, RenderInstruction, RenderList, ResolvedClipPlane, ResolvedFog, ResolvedLight,
};
