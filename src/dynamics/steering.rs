// ==============================================================================
// steering.rs — SPEED-SENSITIVE ARCADE STEERING + LATERAL GRIP
// ==============================================================================
// Responsibilities:
// - Convert driver steer intent (-1..1) into a steering angle
// - Scale authority down as speed rises (no high-speed snap turns)
// - Rate-limit the angle and hard-clamp it to max_steer_angle
// - Produce the lateral steering force + yaw torque for the chassis
// - Cancel sideways slip (grip), weakened while drifting
// ------------------------------------------------------------------------------
// Sign convention: steer > 0 turns right. With +Y up and +Z forward, right is
// forward x up (= -X locally), so a right turn is a negative yaw about +Y.
//
// gain(v) = clamp(1 - v / steer_falloff_speed, min_steer_gain, 1)
// target  = steer * max_steer_angle * gain(v)
// ==============================================================================

use crate::dynamics::tuning::VehicleTuning;

/// Speed-dependent steering gain in `[min_steer_gain, 1]`.
pub fn steer_gain(tuning: &VehicleTuning, speed: f32) -> f32 {
    (1.0 - speed / tuning.steer_falloff_speed).clamp(tuning.min_steer_gain, 1.0)
}

/// Move the current steering angle toward the driver's target, rate limited.
pub fn update_steering_angle(tuning: &VehicleTuning, current: f32, steer: f32, speed: f32, dt: f32) -> f32 {
    let max_angle = tuning.max_steer_angle;
    let target = steer * max_angle * steer_gain(tuning, speed);

    let max_step = tuning.max_steer_rate * dt;
    let step = (target - current).clamp(-max_step, max_step);

    // Hard mechanical stops
    (current + step).clamp(-max_angle, max_angle)
}

/// Signed steering response for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringResponse {
    /// Newtons along the chassis right axis.
    pub lateral: f32,
    /// N*m about world up.
    pub yaw: f32,
}

pub fn steering_response(tuning: &VehicleTuning, steering_angle: f32, forward_speed: f32, speed: f32) -> SteeringResponse {
    if tuning.max_steer_angle <= 0.0 {
        return SteeringResponse { lateral: 0.0, yaw: 0.0 };
    }

    let lock = steering_angle / tuning.max_steer_angle; // -1..1, already speed scaled
    // no turning on the spot
    let fade = (speed / tuning.steer_min_speed).min(1.0);
    // reversing flips the yaw direction
    let direction = if forward_speed < -0.1 { -1.0 } else { 1.0 };

    SteeringResponse {
        lateral: tuning.steering_force * lock * fade,
        yaw: -tuning.steering_torque_scale * lock * fade * direction,
    }
}

/// Lateral grip force (N along chassis right) cancelling sideways slip.
///
/// Desired impulse is `-v_lat * mass`, spread over `1 / lateral_grip` seconds
/// and never more than what stops the slip this tick.
pub fn lateral_grip(tuning: &VehicleTuning, lateral_speed: f32, drift_level: f32, dt: f32) -> f32 {
    let grip = tuning.lateral_grip * (1.0 - tuning.drift_grip_loss * drift_level.clamp(0.0, 1.0));
    let rate = grip.min(1.0 / dt);
    -lateral_speed * tuning.mass * rate
}
