// ==============================================================================
// longitudinal.rs — DRIVE, BRAKE AND DRAG (FORCE DOMAIN)
// ==============================================================================
// Computes the ground-plane longitudinal forces for one tick:
// 1) Staged drive force (launch -> tapering sustain -> plateau)
// 2) Brake force opposing the current velocity
// 3) Linear drag
//
// Important properties:
// - No engine/gearbox state. The curve is designer-tunable and nothing else.
// - The brake never reverses velocity inside a tick: its magnitude is capped
//   at the force that would stop the body exactly (m * v / dt).
// - Drag is proportional to speed so coasting decays strictly toward zero.
// ===============================================================================

use crate::dynamics::tuning::VehicleTuning;
use crate::math::{planar, Vector3};

/// Drive force magnitude (N) at full throttle for the given forward speed.
pub fn drive_force(tuning: &VehicleTuning, forward_speed: f32) -> f32 {
    let curve = &tuning.acceleration;
    let ratio = (forward_speed.max(0.0) / tuning.max_speed).max(0.0);

    if ratio < curve.low_speed_ratio {
        return curve.launch_force;
    }
    if ratio >= 1.0 {
        return curve.plateau_force;
    }

    // linear taper across [low_speed_ratio, 1)
    let span = (1.0 - curve.low_speed_ratio).max(1e-6);
    let t = ((ratio - curve.low_speed_ratio) / span).clamp(0.0, 1.0);
    curve.sustained_force + (curve.plateau_force - curve.sustained_force) * t
}

/// Brake force vector opposing planar velocity.
pub fn brake_force(tuning: &VehicleTuning, velocity: Vector3<f32>, brake: f32, dt: f32) -> Vector3<f32> {
    let v = planar(velocity);
    let speed = v.norm();

    // Deadzone near zero speed
    if brake <= 0.0 || speed < 0.05 {
        return Vector3::zeros();
    }

    let stop_force = tuning.mass * speed / dt;
    let magnitude = (tuning.brake_force * brake).min(stop_force);
    -v / speed * magnitude
}

pub fn drag_force(tuning: &VehicleTuning, velocity: Vector3<f32>) -> Vector3<f32> {
    -planar(velocity) * tuning.drag_coefficient
}
