// ==============================================================================
// debug_builders.rs — DEBUG OVERLAY PRIMITIVES (SERVER -> CLIENT)
// ------------------------------------------------------------------------------
// Defines serializable debug primitives:
// - DebugRay: force arrows, ground probe, camera collision probe
// - DebugChassis: chassis box pose
//
// Helpers:
// - build_vehicle_overlay(): one overlay per vehicle from its last tick
// - push_camera_probe(): adds the camera's collision ray
//
// This file is purely visualization scaffolding and should not contain physics
// side effects.
// ==============================================================================

use serde::Serialize;

use crate::camera::CameraProbe;
use crate::dynamics::{DriftState, ForceBreakdown, VehicleState, VehicleTuning};
use crate::ground::GroundContact;
use crate::math::{p3, q4, safe_normalize, up, v3, Point3, Vector3};

const RED: [f32; 3] = [1.0, 0.2, 0.2];
const GREEN: [f32; 3] = [0.2, 1.0, 0.3];
const BLUE: [f32; 3] = [0.3, 0.5, 1.0];
const YELLOW: [f32; 3] = [1.0, 0.9, 0.2];
const GREY: [f32; 3] = [0.6, 0.6, 0.6];
const MAGENTA: [f32; 3] = [1.0, 0.3, 1.0];

#[derive(Debug, Clone, Serialize)]
pub struct DebugOverlay {
    pub chassis: Option<DebugChassis>,
    pub force_rays: Vec<DebugRay>,
    pub ground_probe: Option<DebugRay>,
    pub camera_probe: Option<DebugRay>,
    pub drift: DriftState,
    pub steering_angle: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugRay {
    pub label: &'static str,
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub length: f32,
    pub hit: Option<[f32; 3]>,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugChassis {
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion
    pub half_extents: [f32; 3],
}

/// Arrow for a world-space force, drawn as acceleration (F / m) in meters.
fn force_ray(label: &'static str, origin: Point3<f32>, force: Vector3<f32>, mass: f32, color: [f32; 3]) -> Option<DebugRay> {
    let magnitude = force.norm();
    if magnitude < 1e-3 {
        return None;
    }
    Some(DebugRay {
        label,
        origin: p3(origin),
        direction: v3(force / magnitude),
        length: magnitude / mass,
        hit: None,
        color,
    })
}

pub fn build_vehicle_overlay(
    state: &VehicleState,
    forces: &ForceBreakdown,
    ground: &GroundContact,
    tuning: &VehicleTuning,
    probe_length: f32,
) -> DebugOverlay {
    let origin = state.position;
    let m = tuning.mass;

    let force_rays = [
        force_ray("drive", origin, forces.drive, m, GREEN),
        force_ray("brake", origin, forces.brake, m, RED),
        force_ray("steering", origin, forces.steering, m, BLUE),
        force_ray("grip", origin, forces.grip, m, YELLOW),
        force_ray("drag", origin, forces.drag, m, GREY),
    ]
    .into_iter()
    .flatten()
    .collect();

    let ground_probe = DebugRay {
        label: "ground",
        origin: p3(origin),
        direction: v3(-up()),
        length: tuning.ride_height() + probe_length,
        hit: ground.point.map(p3),
        color: if ground.grounded { GREEN } else { RED },
    };

    DebugOverlay {
        chassis: Some(DebugChassis {
            position: p3(state.position),
            rotation: q4(state.orientation),
            half_extents: tuning.chassis_half_extents,
        }),
        force_rays,
        ground_probe: Some(ground_probe),
        camera_probe: None,
        drift: state.drift,
        steering_angle: state.steering_angle,
    }
}

pub fn push_camera_probe(overlay: &mut DebugOverlay, probe: &CameraProbe) {
    let span = probe.to - probe.from;
    overlay.camera_probe = Some(DebugRay {
        label: "camera",
        origin: p3(probe.from),
        direction: v3(safe_normalize(span, -Vector3::z())),
        length: span.norm(),
        hit: probe.hit.map(|h| p3(h.point)),
        color: if probe.hit.is_some() { MAGENTA } else { GREY },
    });
}
