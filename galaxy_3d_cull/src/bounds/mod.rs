//! Bounding volumes and the geometric intersection tests used by culling.

mod aggregate;
mod bounding_box;
mod bounding_sphere;
mod bounding_volume;
mod primitives;

pub use aggregate::{union, BoundsAccumulator};
pub use bounding_box::BoundingBox;
pub use bounding_sphere::BoundingSphere;
pub use bounding_volume::{BoundingVolume, BoundingVolumeType};
pub use primitives::{
    closest_point_on_ray, closest_point_on_segment, closest_point_on_triangle, Cone, Cylinder,
};
