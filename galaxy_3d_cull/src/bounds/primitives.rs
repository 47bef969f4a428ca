/// Query primitives used by the bounding-volume intersection tests.
///
/// Points, rays, segments and triangles are passed as plain `Vec3`s.
/// Cones and cylinders carry derived data (unit axis, trigonometry),
/// so they are validated once at construction.

use glam::Vec3;
use crate::error::{Error, Result};

/// Tolerance below which a direction component is treated as parallel.
pub(crate) const PARALLEL_EPSILON: f32 = 1e-6;

/// Tolerance on parametric roots (segment vs cone).
const ROOT_EPSILON: f32 = 1e-5;

// ===== CONE =====

/// An infinite single-nappe cone: apex, unit axis and half-angle.
///
/// A point P is inside when it lies on the forward side of the apex and
/// within `half_angle` of the axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    apex: Vec3,
    axis: Vec3,
    half_angle: f32,
    cos_sq: f32,
    sin: f32,
    sin_sq: f32,
}

impl Cone {
    /// Create a cone. `axis` need not be normalized.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the axis is zero or `half_angle` is not in (0, π/2).
    pub fn new(apex: Vec3, axis: Vec3, half_angle: f32) -> Result<Self> {
        if !(axis.length_squared() > 0.0) || !axis.is_finite() {
            return Err(Error::InvalidArgument(format!("cone axis must be non-zero, got {}", axis))
                .logged("galaxy3d::Cone"));
        }
        if !(half_angle > 0.0 && half_angle < std::f32::consts::FRAC_PI_2) {
            return Err(Error::InvalidArgument(format!(
                "cone half angle must be in (0, pi/2), got {}", half_angle
            )).logged("galaxy3d::Cone"));
        }
        let (sin, cos) = half_angle.sin_cos();
        Ok(Self {
            apex,
            axis: axis.normalize(),
            half_angle,
            cos_sq: cos * cos,
            sin,
            sin_sq: sin * sin,
        })
    }

    pub fn apex(&self) -> Vec3 {
        self.apex
    }

    /// Unit axis direction.
    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn half_angle(&self) -> f32 {
        self.half_angle
    }

    /// Whether `point` lies inside the cone (boundary included).
    pub fn contains_point(&self, point: Vec3) -> bool {
        let v = point - self.apex;
        let along = v.dot(self.axis);
        along >= 0.0 && along * along >= self.cos_sq * v.length_squared()
    }

    /// Whether the segment `start..end` touches the cone.
    ///
    /// Solves `(w·a + t v·a)² = cos²θ |w + t v|²` for t in [0, 1] and keeps
    /// roots on the forward nappe. If neither endpoint is inside, any
    /// overlap must enter through such a root.
    pub fn intersects_segment(&self, start: Vec3, end: Vec3) -> bool {
        if self.contains_point(start) || self.contains_point(end) {
            return true;
        }

        let w = start - self.apex;
        let v = end - start;
        let wa = w.dot(self.axis);
        let va = v.dot(self.axis);

        let a = va * va - self.cos_sq * v.dot(v);
        let b = 2.0 * (wa * va - self.cos_sq * w.dot(v));
        let c = wa * wa - self.cos_sq * w.dot(w);

        let on_forward_nappe = |t: f32| {
            t >= -ROOT_EPSILON && t <= 1.0 + ROOT_EPSILON && wa + t * va >= -ROOT_EPSILON
        };

        if a.abs() < PARALLEL_EPSILON {
            if b.abs() < PARALLEL_EPSILON {
                return false;
            }
            return on_forward_nappe(-c / b);
        }

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return false;
        }
        let root = discriminant.sqrt();
        on_forward_nappe((-b - root) / (2.0 * a)) || on_forward_nappe((-b + root) / (2.0 * a))
    }

    /// Whether a sphere touches the cone.
    ///
    /// The sphere hits the cone iff its center lies in the cone shifted back
    /// along the axis by `radius / sin θ`, except near the apex where the
    /// test falls back to the distance to the apex.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        if radius <= 0.0 {
            return self.contains_point(center);
        }

        let shifted_apex = self.apex - self.axis * (radius / self.sin);
        let d = center - shifted_apex;
        let e = self.axis.dot(d);
        if e > 0.0 && e * e >= d.length_squared() * self.cos_sq {
            let d = center - self.apex;
            let e = -self.axis.dot(d);
            if e > 0.0 && e * e >= d.length_squared() * self.sin_sq {
                return d.length_squared() <= radius * radius;
            }
            return true;
        }
        false
    }
}

// ===== CYLINDER =====

/// A finite cylinder between two cap centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    start: Vec3,
    end: Vec3,
    radius: f32,
    axis: Vec3,
    length: f32,
}

impl Cylinder {
    /// # Errors
    ///
    /// `InvalidArgument` if the caps coincide or the radius is negative.
    pub fn new(start: Vec3, end: Vec3, radius: f32) -> Result<Self> {
        let span = end - start;
        let length = span.length();
        if !(length > 0.0) || !length.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "cylinder caps must be distinct, got {} and {}", start, end
            )).logged("galaxy3d::Cylinder"));
        }
        if !(radius >= 0.0) {
            return Err(Error::InvalidArgument(format!("cylinder radius must be >= 0, got {}", radius))
                .logged("galaxy3d::Cylinder"));
        }
        Ok(Self { start, end, radius, axis: span / length, length })
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn end(&self) -> Vec3 {
        self.end
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Unit direction from `start` to `end`.
    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    /// Squared distance from `point` to the solid cylinder (0 inside).
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        let rel = point - self.start;
        let t = rel.dot(self.axis);
        let radial = (rel - self.axis * t).length();
        let radial_excess = (radial - self.radius).max(0.0);
        let axial_excess = if t < 0.0 {
            -t
        } else if t > self.length {
            t - self.length
        } else {
            0.0
        };
        radial_excess * radial_excess + axial_excess * axial_excess
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.distance_squared_to_point(point) <= 0.0
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.distance_squared_to_point(center) <= radius * radius
    }

    /// Tight axis-aligned extents `(min, max)` of the cylinder.
    pub fn extents(&self) -> (Vec3, Vec3) {
        let a = self.axis;
        let spread = Vec3::new(
            (1.0 - a.x * a.x).max(0.0).sqrt(),
            (1.0 - a.y * a.y).max(0.0).sqrt(),
            (1.0 - a.z * a.z).max(0.0).sqrt(),
        ) * self.radius;
        (self.start.min(self.end) - spread, self.start.max(self.end) + spread)
    }
}

// ===== CLOSEST POINTS =====

/// Closest point to `point` on the segment `start..end`.
pub fn closest_point_on_segment(point: Vec3, start: Vec3, end: Vec3) -> Vec3 {
    let d = end - start;
    let len_sq = d.length_squared();
    if len_sq <= 0.0 {
        return start;
    }
    let t = ((point - start).dot(d) / len_sq).clamp(0.0, 1.0);
    start + d * t
}

/// Closest point to `point` on the ray `origin + t * direction`, t >= 0.
pub fn closest_point_on_ray(point: Vec3, origin: Vec3, direction: Vec3) -> Vec3 {
    let len_sq = direction.length_squared();
    if len_sq <= 0.0 {
        return origin;
    }
    let t = ((point - origin).dot(direction) / len_sq).max(0.0);
    origin + direction * t
}

/// Closest point to `p` on triangle `a, b, c` (Voronoi region walk).
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let denom = d1 - d3;
        return if denom != 0.0 { a + ab * (d1 / denom) } else { a };
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let denom = d2 - d6;
        return if denom != 0.0 { a + ac * (d2 / denom) } else { a };
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let denom = (d4 - d3) + (d5 - d6);
        return if denom != 0.0 { b + (c - b) * ((d4 - d3) / denom) } else { b };
    }

    let sum = va + vb + vc;
    if sum == 0.0 {
        // Degenerate (collinear) triangle: best of the three edges.
        return [
            closest_point_on_segment(p, a, b),
            closest_point_on_segment(p, b, c),
            closest_point_on_segment(p, c, a),
        ]
        .into_iter()
        .min_by(|x, y| x.distance_squared(p).total_cmp(&y.distance_squared(p)))
        .unwrap_or(a);
    }
    let denom = 1.0 / sum;
    a + ab * (vb * denom) + ac * (vc * denom)
}

#[cfg(test)]
#[path = "primitives_tests.rs"]
mod tests;
