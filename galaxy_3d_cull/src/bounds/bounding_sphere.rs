/// Bounding sphere: center and radius in the owning node's local space.

use glam::{Mat4, Vec3, Vec4};
use crate::camera::FrustumResult;
use super::bounding_box::BoundingBox;
use super::primitives::{
    closest_point_on_ray, closest_point_on_segment, closest_point_on_triangle, Cone, Cylinder,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    center: Vec3,
    radius: f32,
}

impl Default for BoundingSphere {
    /// Unit sphere at the origin.
    fn default() -> Self {
        Self { center: Vec3::ZERO, radius: 1.0 }
    }
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    /// `center - radius` on every axis.
    pub fn minimum(&self) -> Vec3 {
        self.center - Vec3::splat(self.radius)
    }

    /// `center + radius` on every axis.
    pub fn maximum(&self) -> Vec3 {
        self.center + Vec3::splat(self.radius)
    }

    /// Half extents of the enclosing box: `(r, r, r)`.
    pub fn size(&self) -> Vec3 {
        Vec3::splat(self.radius)
    }

    /// Move the center as a point and scale the radius by the largest
    /// axis scale of `matrix`, so the result still encloses the original.
    pub fn transform(&mut self, matrix: &Mat4) {
        self.center = matrix.transform_point3(self.center);
        self.radius *= max_axis_scale(matrix);
    }

    pub fn transformed(&self, matrix: &Mat4) -> BoundingSphere {
        let mut out = *self;
        out.transform(matrix);
        out
    }

    // ===== INTERSECTION TESTS =====

    pub fn check_intersection_point(&self, point: Vec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    pub fn check_intersection_ray(&self, origin: Vec3, direction: Vec3) -> bool {
        self.check_intersection_point(closest_point_on_ray(self.center, origin, direction))
    }

    pub fn check_intersection_segment(&self, start: Vec3, end: Vec3) -> bool {
        self.check_intersection_point(closest_point_on_segment(self.center, start, end))
    }

    pub fn check_intersection_sphere(&self, center: Vec3, radius: f32) -> bool {
        let reach = self.radius + radius;
        self.center.distance_squared(center) <= reach * reach
    }

    pub fn check_intersection_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> bool {
        self.check_intersection_point(closest_point_on_triangle(self.center, v0, v1, v2))
    }

    pub fn check_intersection_box(&self, min: Vec3, max: Vec3) -> bool {
        BoundingBox::new(min, max).check_intersection_sphere(self.center, self.radius)
    }

    pub fn check_intersection_cone(&self, cone: &Cone) -> bool {
        cone.intersects_sphere(self.center, self.radius)
    }

    pub fn check_intersection_cylinder(&self, cylinder: &Cylinder) -> bool {
        cylinder.intersects_sphere(self.center, self.radius)
    }

    /// Signed distance of the world-space center to each plane:
    /// `d < -r` on any plane is out, `d > r` on every plane is in.
    pub fn check_intersection_frustum(&self, planes: &[Vec4; 6], world: &Mat4) -> FrustumResult {
        let center = world.transform_point3(self.center);
        let radius = self.radius * max_axis_scale(world);
        let mut all_in = true;

        for plane in planes {
            let distance = plane.truncate().dot(center) + plane.w;
            if distance < -radius {
                return FrustumResult::AllOut;
            }
            if distance <= radius {
                all_in = false;
            }
        }

        if all_in { FrustumResult::AllIn } else { FrustumResult::Partial }
    }
}

/// Largest length among the matrix's three basis columns.
pub(crate) fn max_axis_scale(matrix: &Mat4) -> f32 {
    matrix.x_axis.truncate().length()
        .max(matrix.y_axis.truncate().length())
        .max(matrix.z_axis.truncate().length())
}

#[cfg(test)]
#[path = "bounding_sphere_tests.rs"]
mod tests;
