use serde::{Deserialize, Serialize};

use crate::math::sanitize;

/// Staged drive force curve, all forces in newtons.
///
/// Below `low_speed_ratio * max_speed` the full `launch_force` applies. From
/// there the force tapers linearly from `sustained_force` down to
/// `plateau_force`, which is what remains at (and above) `max_speed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelerationCurve {
    pub low_speed_ratio: f32,
    pub launch_force: f32,
    pub sustained_force: f32,
    pub plateau_force: f32,
}

impl Default for AccelerationCurve {
    fn default() -> Self {
        Self {
            low_speed_ratio: 0.3,
            launch_force: 3000.0,
            sustained_force: 2700.0,
            plateau_force: 450.0,
        }
    }
}

/// Gameplay tuning for one vehicle. Kept apart from server/runtime config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    pub mass: f32,                  // kg
    pub max_speed: f32,             // m/s, hard clamp
    pub acceleration: AccelerationCurve,
    pub brake_force: f32,           // N

    // --- steering ---
    pub max_steer_angle: f32,       // rad
    pub max_steer_rate: f32,        // rad/s
    pub steer_falloff_speed: f32,   // m/s at which gain would reach zero
    pub min_steer_gain: f32,        // gain floor at high speed
    pub steer_min_speed: f32,       // m/s, turning fades in below this
    pub steering_force: f32,        // N lateral at full lock
    pub steering_torque_scale: f32, // N*m yaw at full lock

    // --- damping / grip ---
    pub drag_coefficient: f32,      // N per m/s
    pub angular_damping: f32,       // N*m per rad/s
    pub lateral_grip: f32,          // 1/s, sideways slip cancelled per second
    pub drift_grip_loss: f32,       // 0..1 grip removed at drift_level 1
    pub upright_stiffness: f32,     // N*m per rad of roll/pitch
    pub upright_damping: f32,       // N*m per rad/s of roll/pitch rate

    // --- drift ---
    pub drift_steer_threshold: f32,
    pub drift_speed_threshold: f32, // m/s
    pub drift_request_steer_scale: f32,

    // --- engine sound model ---
    pub idle_rpm: f32,
    pub max_rpm: f32,

    // --- chassis ---
    pub chassis_half_extents: [f32; 3],
}

impl Default for VehicleTuning {
    fn default() -> Self {
        KART
    }
}

pub const KART: VehicleTuning = VehicleTuning {
    mass: 150.0,
    max_speed: 18.0,
    acceleration: AccelerationCurve {
        low_speed_ratio: 0.3,
        launch_force: 3000.0,
        sustained_force: 2700.0,
        plateau_force: 450.0,
    },
    brake_force: 4500.0,

    max_steer_angle: 0.6,           // ~34 degrees
    max_steer_rate: 4.0,
    steer_falloff_speed: 30.0,
    min_steer_gain: 0.35,
    steer_min_speed: 2.0,
    steering_force: 900.0,
    steering_torque_scale: 700.0,

    drag_coefficient: 10.0,
    angular_damping: 340.0,
    lateral_grip: 8.0,
    drift_grip_loss: 0.6,
    upright_stiffness: 1500.0,
    upright_damping: 200.0,

    drift_steer_threshold: 0.7,
    drift_speed_threshold: 8.0,
    drift_request_steer_scale: 0.6,

    idle_rpm: 900.0,
    max_rpm: 7500.0,

    chassis_half_extents: [0.7, 0.3, 1.1],
};

impl VehicleTuning {
    /// Clamp every field into a usable range; bad numbers never reach the solver.
    pub fn sanitized(self) -> Self {
        let d = KART;
        let pos = |x: f32, fallback: f32| sanitize(x, 1e-3, f32::MAX, fallback);
        let non_neg = |x: f32, fallback: f32| sanitize(x, 0.0, f32::MAX, fallback);

        let accel = AccelerationCurve {
            low_speed_ratio: sanitize(self.acceleration.low_speed_ratio, 0.0, 0.95, d.acceleration.low_speed_ratio),
            launch_force: non_neg(self.acceleration.launch_force, d.acceleration.launch_force),
            sustained_force: non_neg(self.acceleration.sustained_force, d.acceleration.sustained_force),
            plateau_force: non_neg(self.acceleration.plateau_force, d.acceleration.plateau_force),
        };

        let idle_rpm = non_neg(self.idle_rpm, d.idle_rpm);

        Self {
            mass: pos(self.mass, d.mass),
            max_speed: pos(self.max_speed, d.max_speed),
            acceleration: accel,
            brake_force: non_neg(self.brake_force, d.brake_force),
            max_steer_angle: sanitize(self.max_steer_angle, 0.0, std::f32::consts::FRAC_PI_2, d.max_steer_angle),
            max_steer_rate: pos(self.max_steer_rate, d.max_steer_rate),
            steer_falloff_speed: pos(self.steer_falloff_speed, d.steer_falloff_speed),
            min_steer_gain: sanitize(self.min_steer_gain, 0.0, 1.0, d.min_steer_gain),
            steer_min_speed: pos(self.steer_min_speed, d.steer_min_speed),
            steering_force: non_neg(self.steering_force, d.steering_force),
            steering_torque_scale: non_neg(self.steering_torque_scale, d.steering_torque_scale),
            drag_coefficient: non_neg(self.drag_coefficient, d.drag_coefficient),
            angular_damping: non_neg(self.angular_damping, d.angular_damping),
            lateral_grip: non_neg(self.lateral_grip, d.lateral_grip),
            drift_grip_loss: sanitize(self.drift_grip_loss, 0.0, 1.0, d.drift_grip_loss),
            upright_stiffness: non_neg(self.upright_stiffness, d.upright_stiffness),
            upright_damping: non_neg(self.upright_damping, d.upright_damping),
            drift_steer_threshold: sanitize(self.drift_steer_threshold, 0.0, 1.0, d.drift_steer_threshold),
            drift_speed_threshold: non_neg(self.drift_speed_threshold, d.drift_speed_threshold),
            drift_request_steer_scale: sanitize(self.drift_request_steer_scale, 0.0, 1.0, d.drift_request_steer_scale),
            idle_rpm,
            max_rpm: sanitize(self.max_rpm, idle_rpm, f32::MAX, d.max_rpm.max(idle_rpm)),
            chassis_half_extents: self.chassis_half_extents.map(|h| sanitize(h, 0.05, 10.0, 0.5)),
        }
    }

    /// Distance from the chassis center down to the bottom face.
    pub fn ride_height(&self) -> f32 {
        self.chassis_half_extents[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_kart() {
        let t = VehicleTuning::default();
        assert_eq!(t.max_speed, 18.0);
        assert_eq!(t, t.sanitized());
    }

    #[test]
    fn test_sanitize_clamps_garbage() {
        let t = VehicleTuning {
            mass: -5.0,
            max_speed: f32::NAN,
            drift_steer_threshold: 3.0,
            max_rpm: 10.0,
            ..KART
        }
        .sanitized();

        assert!(t.mass > 0.0);
        assert_eq!(t.max_speed, KART.max_speed);
        assert_eq!(t.drift_steer_threshold, 1.0);
        assert!(t.max_rpm >= t.idle_rpm);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let t: VehicleTuning = toml::from_str("max_speed = 22.0\n[acceleration]\nplateau_force = 500.0\n")
            .expect("valid toml");
        assert_eq!(t.max_speed, 22.0);
        assert_eq!(t.acceleration.plateau_force, 500.0);
        assert_eq!(t.acceleration.launch_force, KART.acceleration.launch_force);
        assert_eq!(t.mass, KART.mass);
    }
}
