/// Frustum: six clipping planes for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing unit normal
/// - D is the signed distance
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
///
/// `Viewpoint::frustum()` derives planes from a projection and view, but
/// the caller may build a frustum by other means.

use glam::{Mat4, Vec3, Vec4};
use crate::bounds::BoundingVolume;

/// Result of a 3-way frustum classification.
///
/// - `AllOut` → reject the entire subtree
/// - `AllIn` → descendants are visible without further testing
/// - `Partial` → recurse and re-test children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrustumResult {
    /// Volume is entirely outside at least one plane
    AllOut,
    /// Volume is entirely inside every plane
    AllIn,
    /// Volume straddles at least one plane
    Partial,
}

impl FrustumResult {
    /// Combine two classifications of the same volume, keeping the most
    /// restrictive one: `AllOut` over `Partial` over `AllIn`.
    pub fn restrict(self, other: FrustumResult) -> FrustumResult {
        match (self, other) {
            (FrustumResult::AllOut, _) | (_, FrustumResult::AllOut) => FrustumResult::AllOut,
            (FrustumResult::Partial, _) | (_, FrustumResult::Partial) => FrustumResult::Partial,
            _ => FrustumResult::AllIn,
        }
    }

    pub fn is_visible(self) -> bool {
        self != FrustumResult::AllOut
    }
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes for culling.
///
/// Each plane is (A, B, C, D) where Ax + By + Cz + D = 0.
/// Normal (A, B, C) points inward (toward the visible volume).
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    pub fn new(planes: [Vec4; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Uses the Gribb & Hartmann method with an OpenGL-style `[-1, 1]`
    /// clip depth. Works for both perspective and orthographic projections.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        // Gribb & Hartmann: extract planes from rows of the VP matrix
        let mut planes = [
            // Left:   row3 + row0
            Vec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            Vec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            Vec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            Vec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row3 + row2
            Vec4::new(m[0][3] + m[0][2], m[1][3] + m[1][2], m[2][3] + m[2][2], m[3][3] + m[3][2]),
            // Far:    row3 - row2
            Vec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ];

        // Normalize each plane so that (A, B, C) is a unit vector
        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Signed distance from `point` to plane `index` (positive inside).
    pub fn signed_distance(&self, index: usize, point: Vec3) -> f32 {
        let plane = self.planes[index];
        plane.truncate().dot(point) + plane.w
    }

    /// Inclusive: points on a plane count as inside.
    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..6).all(|i| self.signed_distance(i, point) >= 0.0)
    }

    /// Classify `volume`, placed in world space by `world`.
    pub fn classify(&self, volume: &BoundingVolume, world: &Mat4) -> FrustumResult {
        volume.check_intersection_frustum(&self.planes, world)
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
