// ==============================================================================
// follow.rs — CAMERA PLACEMENT STRATEGIES
// ==============================================================================
// (mode, follow_type) resolves to one `Placement` in exactly one place
// (`Placement::resolve`). Each variant has its own pure function; none of
// them read controller state.
//
// Offset convention (target frame, +Z forward):
//   offset.x = sideways, offset.y = height, offset.z = distance behind
// ==============================================================================

use crate::camera::types::{CameraConfig, CameraMode, FollowType, TargetPose};
use crate::math::{local_forward, local_right, planar, up, Point3, Vector3};

/// Driver eye point in the chassis frame.
const COCKPIT_EYE: [f32; 3] = [0.0, 0.55, 0.25];
/// How far ahead the cockpit view looks.
const COCKPIT_SIGHT: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Free,
    Cockpit,
    Behind,
    Chase,
    Orbit,
    SideView,
    OverheadView,
    FrontView,
}

impl Placement {
    pub fn resolve(mode: CameraMode, follow_type: FollowType) -> Self {
        match mode {
            CameraMode::Free => Placement::Free,
            CameraMode::Cockpit => Placement::Cockpit,
            CameraMode::Cinematic => Placement::Orbit,
            CameraMode::Overhead => Placement::OverheadView,
            CameraMode::Side => Placement::SideView,
            CameraMode::Follow => match follow_type {
                FollowType::Behind => Placement::Behind,
                FollowType::Chase => Placement::Chase,
                FollowType::Orbit => Placement::Orbit,
                FollowType::SideView => Placement::SideView,
                FollowType::OverheadView => Placement::OverheadView,
                FollowType::FrontView => Placement::FrontView,
            },
        }
    }

    /// Placements that skip distance/height constraints and collision.
    pub fn is_attached(self) -> bool {
        matches!(self, Placement::Free | Placement::Cockpit)
    }
}

// ----------------------------------------------------------------------------
// Per-placement position functions
// ----------------------------------------------------------------------------

fn offset(cfg: &CameraConfig) -> Vector3<f32> {
    Vector3::from(cfg.offset.position)
}

pub fn behind(pose: &TargetPose, cfg: &CameraConfig) -> Point3<f32> {
    let o = offset(cfg);
    pose.position + pose.orientation * Vector3::new(o.x, o.y, -o.z)
}

pub fn chase(pose: &TargetPose, cfg: &CameraConfig) -> Point3<f32> {
    behind(pose, cfg) + pose.velocity * cfg.chase_anticipation
}

/// Straight above the target; orientation ignored.
pub fn overhead(pose: &TargetPose, cfg: &CameraConfig) -> Point3<f32> {
    pose.position + up() * offset(cfg).norm()
}

/// Off the target's right flank at `offset.z`.
pub fn side_view(pose: &TargetPose, cfg: &CameraConfig) -> Point3<f32> {
    let o = offset(cfg);
    pose.position + pose.orientation * (local_right() * o.z + up() * o.y)
}

pub fn front_view(pose: &TargetPose, cfg: &CameraConfig) -> Point3<f32> {
    let o = offset(cfg);
    pose.position + pose.orientation * Vector3::new(o.x, o.y, o.z)
}

/// World-space circle around the target, angle swept by elapsed time.
pub fn orbit(pose: &TargetPose, cfg: &CameraConfig, elapsed: f32) -> Point3<f32> {
    let o = offset(cfg);
    let radius = o.x.hypot(o.z);
    let angle = elapsed * cfg.orbit_speed;
    pose.position + Vector3::new(radius * angle.sin(), o.y, -radius * angle.cos())
}

pub fn cockpit(pose: &TargetPose) -> Point3<f32> {
    pose.position + pose.orientation * Vector3::from(COCKPIT_EYE)
}

/// Single dispatch point. `None` for Free (position comes from the user).
pub fn desired_position(placement: Placement, pose: &TargetPose, cfg: &CameraConfig, elapsed: f32) -> Option<Point3<f32>> {
    let p = match placement {
        Placement::Free => return None,
        Placement::Cockpit => cockpit(pose),
        Placement::Behind => behind(pose, cfg),
        Placement::Chase => chase(pose, cfg),
        Placement::Orbit => orbit(pose, cfg, elapsed),
        Placement::SideView => side_view(pose, cfg),
        Placement::OverheadView => overhead(pose, cfg),
        Placement::FrontView => front_view(pose, cfg),
    };
    Some(p)
}

/// Clamp distance to target, then height above it.
pub fn apply_constraints(desired: Point3<f32>, target: Point3<f32>, cfg: &CameraConfig) -> Point3<f32> {
    let c = &cfg.constraints;
    let mut rel = desired - target;

    let dist = rel.norm();
    if dist > 1e-6 {
        let clamped = dist.clamp(c.min_distance, c.max_distance);
        rel *= clamped / dist;
    }

    rel.y = rel.y.clamp(c.min_height, c.max_height);
    target + rel
}

pub fn desired_look_at(placement: Placement, pose: &TargetPose, cfg: &CameraConfig) -> Option<Point3<f32>> {
    let forward = pose.orientation * local_forward();
    match placement {
        Placement::Free => None,
        Placement::OverheadView | Placement::FrontView => Some(pose.position),
        Placement::Cockpit => Some(cockpit(pose) + forward * COCKPIT_SIGHT),
        _ => {
            let speed = planar(pose.velocity).norm();
            let ahead = (speed * cfg.look_ahead.factor).min(cfg.look_ahead.max);
            Some(pose.position + forward * ahead)
        }
    }
}
