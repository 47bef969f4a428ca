/// BoundingVolume: closed set of bounds carried by scene nodes.
///
/// Every query is answered for every variant, so callers never need to
/// know which concrete volume a node carries:
/// - `Box` / `Sphere` answer geometrically
/// - `Void` (no geometry) reports NaN extents, never intersects, and
///   classifies as `AllOut` against any frustum

use glam::{Mat4, Vec3, Vec4};
use crate::camera::FrustumResult;
use super::bounding_box::BoundingBox;
use super::bounding_sphere::BoundingSphere;
use super::primitives::{Cone, Cylinder};

/// Discriminator reported by `BoundingVolume::volume_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundingVolumeType {
    Box,
    Sphere,
    Null,
}

const UNDEFINED: Vec3 = Vec3::splat(f32::NAN);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BoundingVolume {
    Box(BoundingBox),
    Sphere(BoundingSphere),
    /// Empty volume, identity element of aggregation.
    #[default]
    Void,
}

impl From<BoundingBox> for BoundingVolume {
    fn from(value: BoundingBox) -> Self {
        BoundingVolume::Box(value)
    }
}

impl From<BoundingSphere> for BoundingVolume {
    fn from(value: BoundingSphere) -> Self {
        BoundingVolume::Sphere(value)
    }
}

impl BoundingVolume {
    /// Shorthand for `BoundingVolume::Box(BoundingBox::new(min, max))`.
    pub fn new_box(min: Vec3, max: Vec3) -> Self {
        BoundingVolume::Box(BoundingBox::new(min, max))
    }

    pub fn new_sphere(center: Vec3, radius: f32) -> Self {
        BoundingVolume::Sphere(BoundingSphere::new(center, radius))
    }

    pub fn volume_type(&self) -> BoundingVolumeType {
        match self {
            BoundingVolume::Box(_) => BoundingVolumeType::Box,
            BoundingVolume::Sphere(_) => BoundingVolumeType::Sphere,
            BoundingVolume::Void => BoundingVolumeType::Null,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, BoundingVolume::Void)
    }

    // ===== EXTENTS =====

    pub fn center(&self) -> Vec3 {
        match self {
            BoundingVolume::Box(b) => b.center(),
            BoundingVolume::Sphere(s) => s.center(),
            BoundingVolume::Void => UNDEFINED,
        }
    }

    pub fn minimum(&self) -> Vec3 {
        match self {
            BoundingVolume::Box(b) => b.minimum(),
            BoundingVolume::Sphere(s) => s.minimum(),
            BoundingVolume::Void => UNDEFINED,
        }
    }

    pub fn maximum(&self) -> Vec3 {
        match self {
            BoundingVolume::Box(b) => b.maximum(),
            BoundingVolume::Sphere(s) => s.maximum(),
            BoundingVolume::Void => UNDEFINED,
        }
    }

    /// Half extents of the volume's enclosing box.
    pub fn size(&self) -> Vec3 {
        match self {
            BoundingVolume::Box(b) => b.size(),
            BoundingVolume::Sphere(s) => s.size(),
            BoundingVolume::Void => UNDEFINED,
        }
    }

    /// `(min, max)` extents, `None` for Void.
    pub fn extents(&self) -> Option<(Vec3, Vec3)> {
        match self {
            BoundingVolume::Box(b) => Some((b.minimum(), b.maximum())),
            BoundingVolume::Sphere(s) => Some((s.minimum(), s.maximum())),
            BoundingVolume::Void => None,
        }
    }

    // ===== TRANSFORM =====

    pub fn transform(&mut self, matrix: &Mat4) {
        match self {
            BoundingVolume::Box(b) => b.transform(matrix),
            BoundingVolume::Sphere(s) => s.transform(matrix),
            BoundingVolume::Void => {}
        }
    }

    pub fn transformed(&self, matrix: &Mat4) -> BoundingVolume {
        let mut out = *self;
        out.transform(matrix);
        out
    }

    // ===== INTERSECTION TESTS =====

    pub fn check_intersection_point(&self, point: Vec3) -> bool {
        match self {
            BoundingVolume::Box(b) => b.check_intersection_point(point),
            BoundingVolume::Sphere(s) => s.check_intersection_point(point),
            BoundingVolume::Void => false,
        }
    }

    pub fn check_intersection_ray(&self, origin: Vec3, direction: Vec3) -> bool {
        match self {
            BoundingVolume::Box(b) => b.check_intersection_ray(origin, direction),
            BoundingVolume::Sphere(s) => s.check_intersection_ray(origin, direction),
            BoundingVolume::Void => false,
        }
    }

    pub fn check_intersection_segment(&self, start: Vec3, end: Vec3) -> bool {
        match self {
            BoundingVolume::Box(b) => b.check_intersection_segment(start, end),
            BoundingVolume::Sphere(s) => s.check_intersection_segment(start, end),
            BoundingVolume::Void => false,
        }
    }

    pub fn check_intersection_sphere(&self, center: Vec3, radius: f32) -> bool {
        match self {
            BoundingVolume::Box(b) => b.check_intersection_sphere(center, radius),
            BoundingVolume::Sphere(s) => s.check_intersection_sphere(center, radius),
            BoundingVolume::Void => false,
        }
    }

    pub fn check_intersection_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> bool {
        match self {
            BoundingVolume::Box(b) => b.check_intersection_triangle(v0, v1, v2),
            BoundingVolume::Sphere(s) => s.check_intersection_triangle(v0, v1, v2),
            BoundingVolume::Void => false,
        }
    }

    pub fn check_intersection_box(&self, min: Vec3, max: Vec3) -> bool {
        match self {
            BoundingVolume::Box(b) => b.check_intersection_box(min, max),
            BoundingVolume::Sphere(s) => s.check_intersection_box(min, max),
            BoundingVolume::Void => false,
        }
    }

    pub fn check_intersection_cone(&self, cone: &Cone) -> bool {
        match self {
            BoundingVolume::Box(b) => b.check_intersection_cone(cone),
            BoundingVolume::Sphere(s) => s.check_intersection_cone(cone),
            BoundingVolume::Void => false,
        }
    }

    pub fn check_intersection_cylinder(&self, cylinder: &Cylinder) -> bool {
        match self {
            BoundingVolume::Box(b) => b.check_intersection_cylinder(cylinder),
            BoundingVolume::Sphere(s) => s.check_intersection_cylinder(cylinder),
            BoundingVolume::Void => false,
        }
    }

    /// Classify against 6 planes with the volume placed by `world`.
    pub fn check_intersection_frustum(&self, planes: &[Vec4; 6], world: &Mat4) -> FrustumResult {
        match self {
            BoundingVolume::Box(b) => b.check_intersection_frustum(planes, world),
            BoundingVolume::Sphere(s) => s.check_intersection_frustum(planes, world),
            BoundingVolume::Void => FrustumResult::AllOut,
        }
    }

    /// Volume-volume overlap (both in the same frame).
    pub fn check_intersection_volume(&self, other: &BoundingVolume) -> bool {
        match (self, other) {
            (BoundingVolume::Void, _) | (_, BoundingVolume::Void) => false,
            (_, BoundingVolume::Box(b)) => self.check_intersection_box(b.minimum(), b.maximum()),
            (_, BoundingVolume::Sphere(s)) => self.check_intersection_sphere(s.center(), s.radius()),
        }
    }
}

#[cfg(test)]
#[path = "bounding_volume_tests.rs"]
mod tests;
