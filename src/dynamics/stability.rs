// ==============================================================================
// stability.rs — ANGULAR DAMPING + UPRIGHT TORQUE
// ==============================================================================

use crate::dynamics::tuning::VehicleTuning;
use crate::math::{up, UnitQuaternion, Vector3};

/// Opposes all spin, applied every tick (air or ground).
pub fn angular_damping_torque(tuning: &VehicleTuning, angular_velocity: Vector3<f32>) -> Vector3<f32> {
    -angular_velocity * tuning.angular_damping
}

/// Spring-damper pulling the chassis up axis back to world up.
///
/// `body_up x world_up` has magnitude sin(tilt) and points along the axis that
/// rotates body_up toward world_up. Yaw rate is left alone so steering is not
/// fought here.
pub fn upright_torque(
    tuning: &VehicleTuning,
    orientation: UnitQuaternion<f32>,
    angular_velocity: Vector3<f32>,
) -> Vector3<f32> {
    let body_up = orientation * up();
    let correction = body_up.cross(&up()) * tuning.upright_stiffness;

    let roll_pitch_rate = angular_velocity - up() * angular_velocity.dot(&up());
    correction - roll_pitch_rate * tuning.upright_damping
}
