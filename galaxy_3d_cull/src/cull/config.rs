/// Cull stage configuration.

/// Which light / clip-plane / fog leaves a pass takes into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectScope {
    /// Global effects are reported for the whole pass, local ones are
    /// scoped to the group holding them
    #[default]
    All,
    /// Only global effects; local effects are ignored
    GlobalOnly,
}

/// Per-stage culling options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CullConfig {
    /// Test bounds against the viewpoint frustum. When false, every
    /// visible node is emitted (custom tests still apply).
    pub frustum_culling: bool,
    /// Skip testing below an `AllIn` ancestor
    pub propagate_all_in: bool,
    pub effect_scope: EffectScope,
    /// Keep the keys of rejected subtrees in `RenderList::culled`
    pub record_culled: bool,
    /// Instructions reserved up front by a new stage
    pub initial_capacity: usize,
}

impl Default for CullConfig {
    fn default() -> Self {
        Self {
            frustum_culling: true,
            propagate_all_in: true,
            effect_scope: EffectScope::All,
            record_culled: false,
            initial_capacity: 256,
        }
    }
}
