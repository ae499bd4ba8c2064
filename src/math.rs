//! Small shared math helpers on top of rapier's nalgebra re-export.
//!
//! Everything goes through `rapier3d::na` so the vector types are the exact
//! ones the rigid-body backend hands out.

pub use rapier3d::na::{Point3, Unit, UnitQuaternion, Vector3};

pub type Vec3 = [f32; 3];

// World up is +Y, vehicles face +Z in their local frame.
#[inline] pub fn up() -> Vector3<f32> { Vector3::y() }
#[inline] pub fn local_forward() -> Vector3<f32> { Vector3::z() }
#[inline] pub fn local_right() -> Vector3<f32> { -Vector3::x() }

#[inline] pub fn v3(v: Vector3<f32>) -> Vec3 { [v.x, v.y, v.z] }
#[inline] pub fn p3(p: Point3<f32>) -> Vec3 { [p.x, p.y, p.z] }
#[inline] pub fn q4(q: UnitQuaternion<f32>) -> [f32; 4] { [q.i, q.j, q.k, q.w] }

/// Horizontal (ground plane) part of a vector.
#[inline]
pub fn planar(v: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, 0.0, v.z)
}

#[inline]
pub fn safe_normalize(v: Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    let n = v.norm();
    if n > 1e-6 && n.is_finite() { v / n } else { fallback }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec(a: Vector3<f32>, b: Vector3<f32>, t: f32) -> Vector3<f32> {
    a + (b - a) * t
}

/// Replaces NaN/inf with `fallback` and clamps into `[lo, hi]`.
#[inline]
pub fn sanitize(x: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if x.is_finite() { x.clamp(lo, hi) } else { fallback }
}

#[inline]
pub fn is_finite_vec(v: &Vector3<f32>) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Rotation whose local +Z looks along `dir`.
///
/// Falls back to +Z as the up hint when `dir` is (nearly) vertical, which is
/// the straight-down overhead case.
pub fn look_rotation(dir: Vector3<f32>) -> Option<UnitQuaternion<f32>> {
    let d = dir.try_normalize(1e-6)?;
    let hint = if d.dot(&up()).abs() > 0.999 { Vector3::z() } else { up() };
    Some(UnitQuaternion::face_towards(&d, &hint))
}

/// Rotation from Euler angles given as (pitch, yaw, roll) in radians.
#[inline]
pub fn euler(v: Vector3<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::from_euler_angles(v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_drops_vertical() {
        let v = planar(Vector3::new(3.0, -9.0, 4.0));
        assert_eq!(v.y, 0.0);
        assert!((v.norm() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_sanitize_nan() {
        assert_eq!(sanitize(f32::NAN, -1.0, 1.0, 0.0), 0.0);
        assert_eq!(sanitize(4.0, -1.0, 1.0, 0.0), 1.0);
    }

    #[test]
    fn test_look_rotation_points_local_z() {
        let dir = Vector3::new(1.0, 0.0, 0.0);
        let q = look_rotation(dir).expect("non-degenerate");
        let fwd = q * Vector3::z();
        assert!((fwd - dir).norm() < 1e-5);

        // straight down still resolves
        let down = look_rotation(Vector3::new(0.0, -1.0, 0.0)).expect("vertical");
        assert!(((down * Vector3::z()) - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-5);
        assert!(look_rotation(Vector3::zeros()).is_none());
    }
}
