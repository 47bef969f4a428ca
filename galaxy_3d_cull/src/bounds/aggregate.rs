/// Aggregate bounds: union of child volumes as a single enclosing box.
///
/// Void volumes are skipped. Spheres contribute their `center ± radius`
/// extents, so a non-empty union is always a `BoundingVolume::Box`.

use glam::{Mat4, Vec3};
use super::bounding_box::BoundingBox;
use super::bounding_volume::BoundingVolume;

/// Running min/max accumulator, seeded by the first non-void volume.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsAccumulator {
    extents: Option<(Vec3, Vec3)>,
}

impl BoundsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, volume: &BoundingVolume) {
        let Some((min, max)) = volume.extents() else {
            return;
        };
        self.extents = Some(match self.extents {
            None => (min, max),
            Some((acc_min, acc_max)) => (acc_min.min(min), acc_max.max(max)),
        });
    }

    /// Add `volume` after moving it into the accumulator's frame.
    pub fn add_transformed(&mut self, volume: &BoundingVolume, matrix: &Mat4) {
        if !volume.is_void() {
            self.add(&volume.transformed(matrix));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extents.is_none()
    }

    pub fn finish(&self) -> BoundingVolume {
        match self.extents {
            Some((min, max)) => BoundingVolume::Box(BoundingBox::new(min, max)),
            None => BoundingVolume::Void,
        }
    }
}

/// Union of volumes already expressed in a common frame.
pub fn union<'a, I>(volumes: I) -> BoundingVolume
where
    I: IntoIterator<Item = &'a BoundingVolume>,
{
    let mut acc = BoundsAccumulator::new();
    for volume in volumes {
        acc.add(volume);
    }
    acc.finish()
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
