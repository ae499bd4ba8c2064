//! Core shared types for the vehicle controller.
use serde::{Deserialize, Serialize};

use crate::math::{p3, q4, sanitize, v3, Point3, UnitQuaternion, Vec3, Vector3};

// ============================================
// ----- control input ------------------------
// ============================================

/// Per-tick driver intent, produced by the input collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlInput {
    pub accelerate: f32,       // 0..1
    pub brake: f32,            // 0..1
    pub steer: f32,            // -1 (left) .. 1 (right)
    #[serde(alias = "drift")]
    pub drift_requested: bool,
}

impl ControlInput {
    /// Clamp into valid ranges; NaN/inf becomes zero.
    pub fn sanitized(self) -> Self {
        Self {
            accelerate: sanitize(self.accelerate, 0.0, 1.0, 0.0),
            brake: sanitize(self.brake, 0.0, 1.0, 0.0),
            steer: sanitize(self.steer, -1.0, 1.0, 0.0),
            drift_requested: self.drift_requested,
        }
    }
}

// ============================================
// ----- drift --------------------------------
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DriftState {
    pub is_drifting: bool,
    pub drift_level: f32, // 0..1, always 0 when not drifting
}

// ============================================
// ----- vehicle snapshot ---------------------
// ============================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    pub position: Point3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub linear_velocity: Vector3<f32>,
    pub angular_velocity: Vector3<f32>,
    /// Ground-plane speed in m/s.
    pub speed: f32,
    pub steering_angle: f32,
    /// Driver steer input this tick, -1..1, before speed falloff.
    pub steer: f32,
    pub drift: DriftState,
    pub engine_rpm: f32,
    pub grounded: bool,
}

impl VehicleState {
    pub fn at_rest(position: Point3<f32>, orientation: UnitQuaternion<f32>, idle_rpm: f32) -> Self {
        Self {
            position,
            orientation,
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            speed: 0.0,
            steering_angle: 0.0,
            steer: 0.0,
            drift: DriftState::default(),
            engine_rpm: idle_rpm,
            grounded: false,
        }
    }
}

/// Wire form of [`VehicleState`] for the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleSnapshot {
    pub id: String,
    pub position: Vec3,
    pub rotation: [f32; 4], // quaternion (i, j, k, w)
    pub velocity: Vec3,
    pub speed: f32,
    pub steering_angle: f32,
    pub drift: DriftState,
    pub engine_rpm: f32,
    pub grounded: bool,
}

impl VehicleSnapshot {
    pub fn from_state(id: &str, s: &VehicleState) -> Self {
        Self {
            id: id.to_string(),
            position: p3(s.position),
            rotation: q4(s.orientation),
            velocity: v3(s.linear_velocity),
            speed: s.speed,
            steering_angle: s.steering_angle,
            drift: s.drift,
            engine_rpm: s.engine_rpm,
            grounded: s.grounded,
        }
    }
}

// ============================================
// ----- per-tick force record ----------------
// ============================================

/// Everything one tick pushed into the body, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceBreakdown {
    pub drive: Vector3<f32>,
    pub brake: Vector3<f32>,
    pub steering: Vector3<f32>,
    pub grip: Vector3<f32>,
    pub drag: Vector3<f32>,

    pub yaw_torque: Vector3<f32>,
    pub damping_torque: Vector3<f32>,
    pub upright_torque: Vector3<f32>,
}

impl ForceBreakdown {
    pub fn zero() -> Self {
        Self {
            drive: Vector3::zeros(),
            brake: Vector3::zeros(),
            steering: Vector3::zeros(),
            grip: Vector3::zeros(),
            drag: Vector3::zeros(),
            yaw_torque: Vector3::zeros(),
            damping_torque: Vector3::zeros(),
            upright_torque: Vector3::zeros(),
        }
    }

    pub fn total_force(&self) -> Vector3<f32> {
        self.drive + self.brake + self.steering + self.grip + self.drag
    }

    pub fn total_torque(&self) -> Vector3<f32> {
        self.yaw_torque + self.damping_torque + self.upright_torque
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_clamped() {
        let i = ControlInput { accelerate: 2.0, brake: -1.0, steer: f32::NAN, drift_requested: true }.sanitized();
        assert_eq!(i.accelerate, 1.0);
        assert_eq!(i.brake, 0.0);
        assert_eq!(i.steer, 0.0);
        assert!(i.drift_requested);
    }

    #[test]
    fn test_input_parses_short_drift_key() {
        let i: ControlInput = serde_json::from_str(r#"{"accelerate":1,"steer":-0.5,"drift":true}"#).unwrap();
        assert_eq!(i.accelerate, 1.0);
        assert_eq!(i.brake, 0.0);
        assert!(i.drift_requested);
    }
}
