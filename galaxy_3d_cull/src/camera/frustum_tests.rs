use glam::{Mat4, Vec3, Vec4};
use crate::bounds::BoundingVolume;
use super::*;

fn perspective_frustum(fov: f32, far: f32) -> Frustum {
    let projection = Mat4::perspective_rh_gl(fov, 1.0, 0.1, far);
    let view = Mat4::look_at_rh(
        Vec3::new(0.0, 0.0, 5.0),   // eye
        Vec3::ZERO,                  // target
        Vec3::Y,                     // up
    );
    Frustum::from_view_projection(&(projection * view))
}

fn ortho_frustum() -> Frustum {
    let projection = Mat4::orthographic_rh_gl(
        -5.0, 5.0, // left, right
        -5.0, 5.0, // bottom, top
        0.1, 100.0, // near, far
    );
    Frustum::from_view_projection(&projection)
}

// ============================================================================
// Frustum::from_view_projection
// ============================================================================

#[test]
fn test_frustum_from_identity_matrix() {
    let frustum = Frustum::from_view_projection(&Mat4::IDENTITY);

    // Identity VP → NDC cube: x,y,z in [-1, 1]
    for plane in &frustum.planes {
        let normal_len = plane.truncate().length();
        assert!((normal_len - 1.0).abs() < 1e-5, "plane normal should be unit length");
    }
    assert_eq!(frustum.planes[PLANE_LEFT], Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(frustum.planes[PLANE_FAR], Vec4::new(0.0, 0.0, -1.0, 1.0));
}

#[test]
fn test_frustum_from_perspective_projection() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_4, 100.0);
    for plane in &frustum.planes {
        let normal_len = plane.truncate().length();
        assert!((normal_len - 1.0).abs() < 1e-4, "plane normal should be unit length");
    }
}

#[test]
fn test_orthographic_plane_distances() {
    let frustum = ortho_frustum();
    let p = Vec3::new(0.0, 0.0, -1.0);
    assert!((frustum.signed_distance(PLANE_LEFT, p) - 5.0).abs() < 1e-4);
    assert!((frustum.signed_distance(PLANE_RIGHT, p) - 5.0).abs() < 1e-4);
    assert!((frustum.signed_distance(PLANE_NEAR, p) - 0.9).abs() < 1e-4);
    assert!((frustum.signed_distance(PLANE_FAR, p) - 99.0).abs() < 1e-2);
}

#[test]
fn test_contains_point() {
    let frustum = ortho_frustum();
    assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -50.0)));
    assert!(frustum.contains_point(Vec3::new(5.0, 0.0, -50.0)));
    assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 1.0)));
    assert!(!frustum.contains_point(Vec3::new(6.0, 0.0, -50.0)));
}

// ============================================================================
// Frustum::classify
// ============================================================================

#[test]
fn test_box_inside_perspective_frustum() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_2, 100.0);
    let volume = BoundingVolume::new_box(Vec3::splat(-1.0), Vec3::splat(1.0));
    assert_eq!(frustum.classify(&volume, &Mat4::IDENTITY), FrustumResult::AllIn);
}

#[test]
fn test_box_far_to_the_side() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_4, 100.0);
    let volume = BoundingVolume::new_box(Vec3::splat(100.0), Vec3::splat(101.0));
    assert_eq!(frustum.classify(&volume, &Mat4::IDENTITY), FrustumResult::AllOut);
}

#[test]
fn test_box_behind_camera() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_2, 100.0);
    let volume = BoundingVolume::new_box(Vec3::new(-1.0, -1.0, 10.0), Vec3::new(1.0, 1.0, 12.0));
    assert_eq!(frustum.classify(&volume, &Mat4::IDENTITY), FrustumResult::AllOut);
}

#[test]
fn test_box_beyond_far_plane() {
    let frustum = perspective_frustum(std::f32::consts::FRAC_PI_2, 10.0);
    let volume = BoundingVolume::new_box(Vec3::new(-1.0, -1.0, -20.0), Vec3::new(1.0, 1.0, -18.0));
    assert_eq!(frustum.classify(&volume, &Mat4::IDENTITY), FrustumResult::AllOut);
}

#[test]
fn test_box_straddling_boundary() {
    let frustum = ortho_frustum();
    // Straddles the right boundary at x = 5
    let volume = BoundingVolume::new_box(Vec3::new(4.0, 0.0, -10.0), Vec3::new(6.0, 1.0, -5.0));
    assert_eq!(frustum.classify(&volume, &Mat4::IDENTITY), FrustumResult::Partial);
}

#[test]
fn test_world_transform_moves_volume_out() {
    let frustum = ortho_frustum();
    let volume = BoundingVolume::new_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0);
    assert_eq!(frustum.classify(&volume, &Mat4::IDENTITY), FrustumResult::AllIn);
    let world = Mat4::from_translation(Vec3::new(20.0, 0.0, 0.0));
    assert_eq!(frustum.classify(&volume, &world), FrustumResult::AllOut);
}

#[test]
fn test_void_is_all_out() {
    let frustum = ortho_frustum();
    assert_eq!(frustum.classify(&BoundingVolume::Void, &Mat4::IDENTITY), FrustumResult::AllOut);
}

// ============================================================================
// FrustumResult
// ============================================================================

#[test]
fn test_restrict_keeps_most_restrictive() {
    use FrustumResult::*;
    assert_eq!(AllIn.restrict(AllIn), AllIn);
    assert_eq!(AllIn.restrict(Partial), Partial);
    assert_eq!(Partial.restrict(AllIn), Partial);
    assert_eq!(Partial.restrict(AllOut), AllOut);
    assert_eq!(AllOut.restrict(AllIn), AllOut);
}

#[test]
fn test_is_visible() {
    assert!(FrustumResult::AllIn.is_visible());
    assert!(FrustumResult::Partial.is_visible());
    assert!(!FrustumResult::AllOut.is_visible());
}

// ============================================================================
// Plane constants
// ============================================================================

#[test]
fn test_plane_constants() {
    assert_eq!(PLANE_LEFT, 0);
    assert_eq!(PLANE_RIGHT, 1);
    assert_eq!(PLANE_BOTTOM, 2);
    assert_eq!(PLANE_TOP, 3);
    assert_eq!(PLANE_NEAR, 4);
    assert_eq!(PLANE_FAR, 5);
}
