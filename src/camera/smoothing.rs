// ==============================================================================
// smoothing.rs — FRAME-RATE INDEPENDENT EXPONENTIAL SMOOTHING + BANKING
// ------------------------------------------------------------------------------
// A smoothing factor f is "fraction of the remaining gap closed per 1/60 s".
// For an arbitrary dt the per-call fraction is
//
//   alpha(f, dt) = 1 - (1 - f)^(dt * 60)
//
// which is exactly f at 60 Hz and gives the same trajectory at any tick rate.
// ==============================================================================

use crate::camera::types::Banking;
use crate::math::{lerp_vec, up, Point3, UnitQuaternion, Vector3};

pub const REFERENCE_HZ: f32 = 60.0;

pub fn alpha(factor: f32, dt: f32) -> f32 {
    let f = factor.clamp(0.0, 1.0);
    if f >= 1.0 {
        return 1.0;
    }
    1.0 - (1.0 - f).powf(dt.max(0.0) * REFERENCE_HZ)
}

pub fn smooth_point(current: Point3<f32>, desired: Point3<f32>, factor: f32, dt: f32) -> Point3<f32> {
    Point3::from(lerp_vec(current.coords, desired.coords, alpha(factor, dt)))
}

pub fn smooth_rotation(
    current: UnitQuaternion<f32>,
    desired: UnitQuaternion<f32>,
    factor: f32,
    dt: f32,
) -> UnitQuaternion<f32> {
    // slerp is undefined for exactly opposite rotations; just take the target
    current.try_slerp(&desired, alpha(factor, dt), 1e-6).unwrap_or(desired)
}

/// Lean offset while cornering: swings wide of the turn and lifts a little.
pub fn banking_offset(banking: &Banking, right: Vector3<f32>, steer: f32, speed_ratio: f32) -> Vector3<f32> {
    let lean = steer.clamp(-1.0, 1.0) * speed_ratio.clamp(0.0, 1.0);
    -right * (banking.lateral * lean) + up() * (banking.lift * lean.abs())
}
