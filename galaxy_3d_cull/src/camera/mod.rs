//! Camera module: viewpoint and frustum.
//!
//! Passive data for the cull stage. The engine does NOT store or manage
//! viewpoints; they are owned and driven by the caller and handed to each
//! cull pass.

mod frustum;
mod viewpoint;

pub use frustum::{
    Frustum, FrustumResult,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
pub use viewpoint::{Projection, Viewpoint};
