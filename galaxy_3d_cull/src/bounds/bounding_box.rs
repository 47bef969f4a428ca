/// Axis-aligned bounding box.
///
/// Stored in the owning node's local space and classified against world
/// space planes through the accumulated transform at cull time.
///
/// `min <= max` is not enforced: setters store what they are given, and an
/// inverted box simply fails every containment test.

use glam::{Mat4, Vec3, Vec4};
use crate::camera::FrustumResult;
use super::primitives::{Cone, Cylinder, PARALLEL_EPSILON};

/// Iterations of the golden-section search in `distance_squared_to_segment`.
const SEGMENT_SEARCH_STEPS: usize = 48;

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl Default for BoundingBox {
    /// Zero-size box at the origin.
    fn default() -> Self {
        Self { min: Vec3::ZERO, max: Vec3::ZERO }
    }
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box from a center and half extents.
    pub fn from_center_size(center: Vec3, half_extents: Vec3) -> Self {
        Self { min: center - half_extents, max: center + half_extents }
    }

    // ===== EXTENTS =====

    pub fn minimum(&self) -> Vec3 {
        self.min
    }

    pub fn maximum(&self) -> Vec3 {
        self.max
    }

    /// `(min + max) / 2`
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half extents `(max - min) / 2`.
    pub fn size(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Store a new minimum corner as given.
    pub fn set_minimum(&mut self, min: Vec3) {
        self.min = min;
    }

    /// Store a new maximum corner as given.
    pub fn set_maximum(&mut self, max: Vec3) {
        self.max = max;
    }

    pub fn set_extents(&mut self, min: Vec3, max: Vec3) {
        self.min = min;
        self.max = max;
    }

    /// True if `min > max` on any axis.
    pub fn is_inverted(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Grow to include `[min, max]`.
    pub fn expand(&mut self, min: Vec3, max: Vec3) {
        self.min = self.min.min(min);
        self.max = self.max.max(max);
    }

    /// The 8 corners, bit 0 = X, bit 1 = Y, bit 2 = Z (0 = min, 1 = max).
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// The 12 edges as corner pairs.
    pub fn edges(&self) -> [(Vec3, Vec3); 12] {
        let c = self.corners();
        [
            (c[0], c[1]), (c[2], c[3]), (c[4], c[5]), (c[6], c[7]),
            (c[0], c[2]), (c[1], c[3]), (c[4], c[6]), (c[5], c[7]),
            (c[0], c[4]), (c[1], c[5]), (c[2], c[6]), (c[3], c[7]),
        ]
    }

    // ===== TRANSFORM =====

    /// Replace this box by the AABB of its 8 transformed corners.
    ///
    /// Rotations can widen the box. Each basis column is projected onto the
    /// extents (Arvo) instead of transforming every corner.
    pub fn transform(&mut self, matrix: &Mat4) {
        let translation = matrix.col(3).truncate();
        let mut min = translation;
        let mut max = translation;
        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            min += a.min(b);
            max += a.max(b);
        }
        self.min = min;
        self.max = max;
    }

    /// Transformed copy.
    pub fn transformed(&self, matrix: &Mat4) -> BoundingBox {
        let mut out = *self;
        out.transform(matrix);
        out
    }

    // ===== DISTANCE HELPERS =====

    /// Squared distance from `point` to the box (0 inside).
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        let nearest = point.max(self.min).min(self.max);
        nearest.distance_squared(point)
    }

    /// Squared distance between the segment `start..end` and the box.
    ///
    /// The distance to a convex set is convex along a segment, so a
    /// golden-section search converges on the minimum.
    pub fn distance_squared_to_segment(&self, start: Vec3, end: Vec3) -> f32 {
        if self.check_intersection_segment(start, end) {
            return 0.0;
        }

        let direction = end - start;
        let f = |t: f32| self.distance_squared_to_point(start + direction * t);
        let ratio = 0.5 * (5.0_f32.sqrt() - 1.0);
        let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
        let mut x1 = hi - ratio * (hi - lo);
        let mut x2 = lo + ratio * (hi - lo);
        let (mut f1, mut f2) = (f(x1), f(x2));
        for _ in 0..SEGMENT_SEARCH_STEPS {
            if f1 <= f2 {
                hi = x2;
                x2 = x1;
                f2 = f1;
                x1 = hi - ratio * (hi - lo);
                f1 = f(x1);
            } else {
                lo = x1;
                x1 = x2;
                f1 = f2;
                x2 = lo + ratio * (hi - lo);
                f2 = f(x2);
            }
        }
        f(0.0).min(f(1.0)).min(f1).min(f2)
    }

    // ===== INTERSECTION TESTS =====

    /// Closed-interval containment on all three axes.
    pub fn check_intersection_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test clipping the parametric interval `[t_near, t_far]`.
    fn clip_slabs(&self, origin: Vec3, direction: Vec3, mut t_near: f32, mut t_far: f32) -> bool {
        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let lo = self.min[axis];
            let hi = self.max[axis];

            if d.abs() < PARALLEL_EPSILON {
                // Parallel to this slab: must already be inside it
                if o < lo || o > hi {
                    return false;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return false;
            }
        }
        true
    }

    /// Ray `origin + t * direction`, t >= 0. An origin inside the box hits.
    pub fn check_intersection_ray(&self, origin: Vec3, direction: Vec3) -> bool {
        self.clip_slabs(origin, direction, 0.0, f32::INFINITY)
    }

    /// Segment `start..end`; a zero-length segment degrades to a point test.
    pub fn check_intersection_segment(&self, start: Vec3, end: Vec3) -> bool {
        self.clip_slabs(start, end - start, 0.0, 1.0)
    }

    /// Nearest box point within `radius` of `center`.
    pub fn check_intersection_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.distance_squared_to_point(center) <= radius * radius
    }

    /// Complete separating-axis test: 3 box normals (via the AABB pretest),
    /// the triangle normal and the 9 edge cross products.
    pub fn check_intersection_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> bool {
        let tri_min = v0.min(v1).min(v2);
        let tri_max = v0.max(v1).max(v2);
        if !self.check_intersection_box(tri_min, tri_max) {
            return false;
        }

        let center = self.center();
        let half = self.size();
        let p = [v0 - center, v1 - center, v2 - center];
        let edges = [p[1] - p[0], p[2] - p[1], p[0] - p[2]];

        let separated = |axis: Vec3| {
            let d0 = axis.dot(p[0]);
            let d1 = axis.dot(p[1]);
            let d2 = axis.dot(p[2]);
            let r = half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs();
            d0.min(d1).min(d2) > r || d0.max(d1).max(d2) < -r
        };

        for edge in edges {
            for box_axis in [Vec3::X, Vec3::Y, Vec3::Z] {
                if separated(box_axis.cross(edge)) {
                    return false;
                }
            }
        }

        !separated(edges[0].cross(edges[1]))
    }

    /// Inclusive interval overlap on all three axes; touching counts.
    pub fn check_intersection_box(&self, other_min: Vec3, other_max: Vec3) -> bool {
        self.min.cmple(other_max).all() && self.max.cmpge(other_min).all()
    }

    /// Infinite cone. The overlap is non-empty iff the apex is inside the
    /// box, the axis ray enters the box, or some box edge crosses the cone.
    pub fn check_intersection_cone(&self, cone: &Cone) -> bool {
        if self.check_intersection_point(cone.apex())
            || self.check_intersection_ray(cone.apex(), cone.axis())
        {
            return true;
        }
        self.edges().iter().any(|(a, b)| cone.intersects_segment(*a, *b))
    }

    /// Finite cylinder.
    ///
    /// Conservative: requires overlap of the tight extents, of the box's
    /// projection with the axis span, and of the box with the capsule
    /// around the axis. Never misses a real overlap.
    pub fn check_intersection_cylinder(&self, cylinder: &Cylinder) -> bool {
        let (c_min, c_max) = cylinder.extents();
        if !self.check_intersection_box(c_min, c_max) {
            return false;
        }

        let axis = cylinder.axis();
        let projected = (self.center() - cylinder.start()).dot(axis);
        let half = self.size();
        let reach = half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs();
        if projected + reach < 0.0 || projected - reach > cylinder.length() {
            return false;
        }

        let r = cylinder.radius();
        self.distance_squared_to_segment(cylinder.start(), cylinder.end()) <= r * r
    }

    /// Classify the 8 corners, transformed by `world`, against 6 planes
    /// (inside = positive side, on-plane counts inside).
    pub fn check_intersection_frustum(&self, planes: &[Vec4; 6], world: &Mat4) -> FrustumResult {
        let corners = self.corners().map(|c| world.transform_point3(c));
        let mut all_in = true;

        for plane in planes {
            let normal = plane.truncate();
            let inside = corners.iter().filter(|c| normal.dot(**c) + plane.w >= 0.0).count();
            if inside == 0 {
                return FrustumResult::AllOut;
            }
            if inside != corners.len() {
                all_in = false;
            }
        }

        if all_in { FrustumResult::AllIn } else { FrustumResult::Partial }
    }
}

#[cfg(test)]
#[path = "bounding_box_tests.rs"]
mod tests;
