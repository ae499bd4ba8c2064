use serde::{Deserialize, Serialize};

use crate::math::{lerp, p3, q4, sanitize, Point3, UnitQuaternion, Vec3, Vector3};
use crate::scene::EntityId;

// ============================================
// ----- modes --------------------------------
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    #[default]
    Follow,
    Free,
    Cinematic,
    Overhead,
    Side,
    Cockpit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowType {
    #[default]
    Behind,
    Chase,
    Orbit,
    SideView,
    OverheadView,
    FrontView,
}

// ============================================
// ----- config -------------------------------
// ============================================

/// Offset in the target's frame: x sideways, y up, z distance back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOffset {
    pub position: Vec3,
    pub rotation: Vec3, // extra (pitch, yaw, roll) on top of look-at, rad
}

impl Default for CameraOffset {
    fn default() -> Self {
        Self { position: [0.0, 3.0, 8.0], rotation: [0.0, 0.0, 0.0] }
    }
}

/// Fraction of the remaining gap closed per 1/60 s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Smoothing {
    pub position: f32,
    pub rotation: f32,
    pub look_at: f32,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self { position: 0.1, rotation: 0.15, look_at: 0.2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_height: f32, // relative to target
    pub max_height: f32,
    pub collision_enabled: bool,
    pub min_distance_from_surface: f32,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            min_distance: 2.0,
            max_distance: 20.0,
            min_height: 0.5,
            max_height: 15.0,
            collision_enabled: true,
            min_distance_from_surface: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookAhead {
    pub factor: f32, // seconds of travel
    pub max: f32,    // m
}

impl Default for LookAhead {
    fn default() -> Self {
        Self { factor: 0.3, max: 6.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banking {
    pub lateral: f32, // m at full steer, full speed
    pub lift: f32,    // m
}

impl Default for Banking {
    fn default() -> Self {
        Self { lateral: 1.0, lift: 0.3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub mode: CameraMode,
    pub follow_type: FollowType,
    pub offset: CameraOffset,
    pub smoothing: Smoothing,
    pub constraints: Constraints,
    pub fov: f32, // degrees
    pub near: f32,
    pub far: f32,
    pub look_ahead: LookAhead,
    pub banking: Banking,
    pub chase_anticipation: f32, // seconds of velocity added in Chase
    pub orbit_speed: f32,        // rad/s
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            mode: CameraMode::Follow,
            follow_type: FollowType::Behind,
            offset: CameraOffset::default(),
            smoothing: Smoothing::default(),
            constraints: Constraints::default(),
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            look_ahead: LookAhead::default(),
            banking: Banking::default(),
            chase_anticipation: 0.25,
            orbit_speed: 0.5,
        }
    }
}

fn vec_or(v: Vec3, fallback: Vec3) -> Vec3 {
    if v.iter().all(|x| x.is_finite()) { v } else { fallback }
}

fn lerp3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
}

impl CameraConfig {
    /// Clamp into usable ranges. Malformed values fall back to defaults.
    pub fn sanitized(self) -> Self {
        let d = CameraConfig::default();
        let unit = |x: f32, fb: f32| sanitize(x, 0.0, 1.0, fb);
        let non_neg = |x: f32, fb: f32| sanitize(x, 0.0, f32::MAX, fb);

        let min_distance = non_neg(self.constraints.min_distance, d.constraints.min_distance);
        let min_height = sanitize(self.constraints.min_height, f32::MIN, f32::MAX, d.constraints.min_height);
        let near = sanitize(self.near, 1e-3, f32::MAX, d.near);

        Self {
            mode: self.mode,
            follow_type: self.follow_type,
            offset: CameraOffset {
                position: vec_or(self.offset.position, d.offset.position),
                rotation: vec_or(self.offset.rotation, d.offset.rotation),
            },
            smoothing: Smoothing {
                position: unit(self.smoothing.position, d.smoothing.position),
                rotation: unit(self.smoothing.rotation, d.smoothing.rotation),
                look_at: unit(self.smoothing.look_at, d.smoothing.look_at),
            },
            constraints: Constraints {
                min_distance,
                max_distance: sanitize(self.constraints.max_distance, min_distance, f32::MAX, d.constraints.max_distance.max(min_distance)),
                min_height,
                max_height: sanitize(self.constraints.max_height, min_height, f32::MAX, d.constraints.max_height.max(min_height)),
                collision_enabled: self.constraints.collision_enabled,
                min_distance_from_surface: non_neg(self.constraints.min_distance_from_surface, d.constraints.min_distance_from_surface),
            },
            fov: sanitize(self.fov, 10.0, 150.0, d.fov),
            near,
            far: sanitize(self.far, near + 1e-3, f32::MAX, d.far.max(near + 1e-3)),
            look_ahead: LookAhead {
                factor: non_neg(self.look_ahead.factor, d.look_ahead.factor),
                max: non_neg(self.look_ahead.max, d.look_ahead.max),
            },
            banking: Banking {
                lateral: sanitize(self.banking.lateral, -10.0, 10.0, d.banking.lateral),
                lift: sanitize(self.banking.lift, -10.0, 10.0, d.banking.lift),
            },
            chase_anticipation: non_neg(self.chase_anticipation, d.chase_anticipation),
            orbit_speed: sanitize(self.orbit_speed, -10.0, 10.0, d.orbit_speed),
        }
    }

    /// Apply a partial update; absent fields keep their current value.
    pub fn merged(&self, patch: &CameraConfigPatch) -> Self {
        Self {
            mode: patch.mode.unwrap_or(self.mode),
            follow_type: patch.follow_type.unwrap_or(self.follow_type),
            offset: patch.offset.unwrap_or(self.offset),
            smoothing: patch.smoothing.unwrap_or(self.smoothing),
            constraints: patch.constraints.unwrap_or(self.constraints),
            fov: patch.fov.unwrap_or(self.fov),
            near: patch.near.unwrap_or(self.near),
            far: patch.far.unwrap_or(self.far),
            look_ahead: patch.look_ahead.unwrap_or(self.look_ahead),
            banking: patch.banking.unwrap_or(self.banking),
            chase_anticipation: patch.chase_anticipation.unwrap_or(self.chase_anticipation),
            orbit_speed: patch.orbit_speed.unwrap_or(self.orbit_speed),
        }
        .sanitized()
    }

    /// Numeric fields interpolate; discrete ones (mode, follow type, collision
    /// flag) stay on `self` until `t` reaches 1.
    pub fn lerp(&self, to: &CameraConfig, t: f32) -> Self {
        if t >= 1.0 {
            return *to;
        }
        let a = self;
        let b = to;
        Self {
            mode: a.mode,
            follow_type: a.follow_type,
            offset: CameraOffset {
                position: lerp3(a.offset.position, b.offset.position, t),
                rotation: lerp3(a.offset.rotation, b.offset.rotation, t),
            },
            smoothing: Smoothing {
                position: lerp(a.smoothing.position, b.smoothing.position, t),
                rotation: lerp(a.smoothing.rotation, b.smoothing.rotation, t),
                look_at: lerp(a.smoothing.look_at, b.smoothing.look_at, t),
            },
            constraints: Constraints {
                min_distance: lerp(a.constraints.min_distance, b.constraints.min_distance, t),
                max_distance: lerp(a.constraints.max_distance, b.constraints.max_distance, t),
                min_height: lerp(a.constraints.min_height, b.constraints.min_height, t),
                max_height: lerp(a.constraints.max_height, b.constraints.max_height, t),
                collision_enabled: a.constraints.collision_enabled,
                min_distance_from_surface: lerp(
                    a.constraints.min_distance_from_surface,
                    b.constraints.min_distance_from_surface,
                    t,
                ),
            },
            fov: lerp(a.fov, b.fov, t),
            near: lerp(a.near, b.near, t),
            far: lerp(a.far, b.far, t),
            look_ahead: LookAhead {
                factor: lerp(a.look_ahead.factor, b.look_ahead.factor, t),
                max: lerp(a.look_ahead.max, b.look_ahead.max, t),
            },
            banking: Banking {
                lateral: lerp(a.banking.lateral, b.banking.lateral, t),
                lift: lerp(a.banking.lift, b.banking.lift, t),
            },
            chase_anticipation: lerp(a.chase_anticipation, b.chase_anticipation, t),
            orbit_speed: lerp(a.orbit_speed, b.orbit_speed, t),
        }
    }
}

/// Partial config used by transitions and live patches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfigPatch {
    pub mode: Option<CameraMode>,
    pub follow_type: Option<FollowType>,
    pub offset: Option<CameraOffset>,
    pub smoothing: Option<Smoothing>,
    pub constraints: Option<Constraints>,
    pub fov: Option<f32>,
    pub near: Option<f32>,
    pub far: Option<f32>,
    pub look_ahead: Option<LookAhead>,
    pub banking: Option<Banking>,
    pub chase_anticipation: Option<f32>,
    pub orbit_speed: Option<f32>,
}

// ============================================
// ----- target / bounds ----------------------
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraTarget {
    pub id: EntityId,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CameraTarget {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self { id: id.into(), priority: 0, active: true }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Kinematic view of a target for one camera update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPose {
    pub position: Point3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub velocity: Vector3<f32>,
    pub steer: f32,       // -1..1, normalized steering angle
    pub speed_ratio: f32, // speed / max_speed
}

impl TargetPose {
    pub fn at(position: Point3<f32>) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            steer: 0.0,
            speed_ratio: 0.0,
        }
    }
}

/// Read-only lookup of tracked entities. Cameras never write through it.
pub trait TargetSource {
    fn target_pose(&self, id: &str) -> Option<TargetPose>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl CameraBounds {
    pub fn clamp(&self, p: Point3<f32>) -> Point3<f32> {
        let lo = |i: usize| self.min[i].min(self.max[i]);
        let hi = |i: usize| self.min[i].max(self.max[i]);
        Point3::new(p.x.clamp(lo(0), hi(0)), p.y.clamp(lo(1), hi(1)), p.z.clamp(lo(2), hi(2)))
    }
}

// ============================================
// ----- shake / transition state -------------
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeConfig {
    pub intensity: f32, // m
    pub duration: f32,  // s
    pub decay: f32,     // intensity multiplier per 1/60 s
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self { intensity: 0.3, duration: 0.5, decay: 0.92 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ShakeState {
    pub active: bool,
    pub time_remaining: f32,
    pub intensity: f32,
    pub decay: f32,
    pub offset: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TransitionStatus {
    pub active: bool,
    pub progress: f32, // 0..1, linear time
}

// ============================================
// ----- published state ----------------------
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub mode: CameraMode,
    pub follow_type: FollowType,
    pub target: Option<CameraTarget>,
    /// Smoothed position before banking, collision, bounds and shake.
    pub smoothed_position: Point3<f32>,
    pub position: Point3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub look_at: Point3<f32>,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub transition: TransitionStatus,
    pub shake: ShakeState,
}

/// Wire form of [`CameraState`].
#[derive(Debug, Clone, Serialize)]
pub struct CameraSnapshot {
    pub mode: CameraMode,
    pub follow_type: FollowType,
    pub target: Option<EntityId>,
    pub position: Vec3,
    pub rotation: [f32; 4],
    pub look_at: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub transition: TransitionStatus,
    pub shake: ShakeState,
}

impl CameraSnapshot {
    pub fn from_state(s: &CameraState) -> Self {
        Self {
            mode: s.mode,
            follow_type: s.follow_type,
            target: s.target.as_ref().map(|t| t.id.clone()),
            position: p3(s.position),
            rotation: q4(s.orientation),
            look_at: p3(s.look_at),
            fov: s.fov,
            near: s.near,
            far: s.far,
            transition: s.transition,
            shake: s.shake,
        }
    }
}
