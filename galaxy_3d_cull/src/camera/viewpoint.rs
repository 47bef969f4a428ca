/// Viewpoint: projection parameters plus a world-to-eye view transform.
///
/// Each cull pass reads one viewpoint to derive its frustum planes.
/// Projection parameters are validated when set; a viewpoint never holds
/// a degenerate projection. The view matrix is stored as given.

use glam::Mat4;
use crate::error::{Error, Result};
use super::frustum::Frustum;

const SOURCE: &str = "galaxy3d::Viewpoint";

/// Projection model of a viewpoint.
///
/// All variants use an OpenGL-style `[-1, 1]` clip depth so the planes
/// from `Frustum::from_view_projection` line up with the near/far clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Vertical field of view in radians, width / height aspect, clip distances.
    Perspective { fov_y: f32, aspect: f32, near: f32, far: f32 },
    Orthographic { left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32 },
    /// Caller-built projection, used as is.
    Custom(Mat4),
}

impl Projection {
    /// # Errors
    ///
    /// `InvalidArgument` for non-finite values, an empty or inverted
    /// volume, or (perspective) a field of view outside `(0, π)`.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Projection::Perspective { fov_y, aspect, near, far } => {
                if ![fov_y, aspect, near, far].iter().all(|v| v.is_finite()) {
                    return Err(invalid(format!("perspective parameters must be finite: {:?}", self)));
                }
                if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) {
                    return Err(invalid(format!("field of view must be in (0, pi), got {}", fov_y)));
                }
                if aspect <= 0.0 {
                    return Err(invalid(format!("aspect ratio must be positive, got {}", aspect)));
                }
                if near <= 0.0 || far <= near {
                    return Err(invalid(format!(
                        "perspective clip range must satisfy 0 < near < far, got near={} far={}",
                        near, far
                    )));
                }
            }
            Projection::Orthographic { left, right, bottom, top, near, far } => {
                if ![left, right, bottom, top, near, far].iter().all(|v| v.is_finite()) {
                    return Err(invalid(format!("orthographic parameters must be finite: {:?}", self)));
                }
                if left >= right || bottom >= top || near >= far {
                    return Err(invalid(format!(
                        "orthographic volume must satisfy left < right, bottom < top, near < far: {:?}",
                        self
                    )));
                }
            }
            Projection::Custom(matrix) => {
                if !matrix.is_finite() {
                    return Err(invalid("custom projection must be finite".to_string()));
                }
                if matrix.determinant() == 0.0 {
                    return Err(invalid("custom projection must be invertible".to_string()));
                }
            }
        }
        Ok(())
    }

    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, aspect, near, far } => {
                Mat4::perspective_rh_gl(fov_y, aspect, near, far)
            }
            Projection::Orthographic { left, right, bottom, top, near, far } => {
                Mat4::orthographic_rh_gl(left, right, bottom, top, near, far)
            }
            Projection::Custom(matrix) => matrix,
        }
    }

    /// Near clip distance, `None` for custom projections.
    pub fn near(&self) -> Option<f32> {
        match *self {
            Projection::Perspective { near, .. } | Projection::Orthographic { near, .. } => Some(near),
            Projection::Custom(_) => None,
        }
    }

    /// Far clip distance, `None` for custom projections.
    pub fn far(&self) -> Option<f32> {
        match *self {
            Projection::Perspective { far, .. } | Projection::Orthographic { far, .. } => Some(far),
            Projection::Custom(_) => None,
        }
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidArgument(message).logged(SOURCE)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    projection: Projection,
    view: Mat4,
}

impl Viewpoint {
    /// Viewpoint at the origin looking down -Z (identity view).
    pub fn new(projection: Projection) -> Result<Self> {
        projection.validate()?;
        Ok(Self { projection, view: Mat4::IDENTITY })
    }

    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Result<Self> {
        Self::new(Projection::Perspective { fov_y, aspect, near, far })
    }

    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Result<Self> {
        Self::new(Projection::Orthographic { left, right, bottom, top, near, far })
    }

    pub fn custom(projection: Mat4) -> Result<Self> {
        Self::new(Projection::Custom(projection))
    }

    /// Build from the camera's world transform (eye-to-world).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the projection is invalid or the camera
    /// transform is not invertible.
    pub fn from_camera_transform(projection: Projection, camera_world: Mat4) -> Result<Self> {
        let mut viewpoint = Self::new(projection)?;
        viewpoint.set_camera_transform(camera_world)?;
        Ok(viewpoint)
    }

    // ===== GETTERS =====

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// World-to-eye transform.
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection.matrix() * self.view
    }

    /// Six normalized world-space planes.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }

    // ===== SETTERS =====

    pub fn set_projection(&mut self, projection: Projection) -> Result<()> {
        projection.validate()?;
        self.projection = projection;
        Ok(())
    }

    /// Set the world-to-eye transform directly.
    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    /// Set the view as the inverse of the camera's world transform.
    pub fn set_camera_transform(&mut self, camera_world: Mat4) -> Result<()> {
        if !camera_world.is_finite() || camera_world.determinant() == 0.0 {
            return Err(invalid("camera transform must be finite and invertible".to_string()));
        }
        self.view = camera_world.inverse();
        Ok(())
    }
}

#[cfg(test)]
#[path = "viewpoint_tests.rs"]
mod tests;
