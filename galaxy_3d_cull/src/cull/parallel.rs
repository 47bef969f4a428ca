/// Parallel cull: several viewpoints over one shared graph, one stage per job.
///
/// The graph is only read; every job owns its stage and therefore its
/// scratch stacks and render list, so passes never contend.

use std::fmt::Debug;
use rayon::prelude::*;
use crate::camera::Viewpoint;
use crate::engine_debug;
use crate::error::Result;
use crate::scene::Cullable;
use super::cull_stage::{CullStage, CullStatus};

const SOURCE: &str = "galaxy3d::Cull";

/// One viewpoint to cull, with the stage that receives its render list.
pub struct CullJob<K> {
    pub root: K,
    pub viewpoint: Viewpoint,
    pub stage: CullStage<K>,
}

impl<K: Copy + Eq + Debug> CullJob<K> {
    pub fn new(root: K, viewpoint: Viewpoint, stage: CullStage<K>) -> Self {
        Self { root, viewpoint, stage }
    }
}

/// Run every job on the rayon pool. Results come back in job order.
///
/// The graph must not be mutated while this runs (bounds flushed, cull
/// phase); a stale graph makes every job fail with `InvalidOperation`.
pub fn cull_parallel<G>(graph: &G, jobs: &mut [CullJob<G::Key>]) -> Vec<Result<CullStatus>>
where
    G: Cullable + Sync,
    G::Key: Send,
{
    engine_debug!(SOURCE, "Culling {} viewpoints in parallel", jobs.len());

    jobs.par_iter_mut()
        .map(|job| job.stage.cull(graph, job.root, &job.viewpoint))
        .collect()
}

#[cfg(test)]
#[path = "parallel_tests.rs"]
mod tests;
