// ==============================================================================
// controller.rs — CAMERA TRACKING CONTROLLER
// ==============================================================================
// update(dt) order:
//   1) advance an active transition; its interpolated config drives 2-8
//   2) desired position (placement) + distance/height constraints
//   3) desired look-at
//   4) exponential smoothing of position and look-at
//   5) banking offset from the target's steer and speed ratio
//   6) collision: pull in front of the nearest occluder
//   7) bounds clamp
//   8) shake (position only, never the look-at)
//   9) orientation toward the look-at, smoothed
//
// The controller only ever reads targets (`TargetSource`) and the scene
// (`RaycastService`). It owns no rigid body and mutates nothing outside itself.
// ==============================================================================

use tracing::debug;

use crate::camera::collision::{resolve_collision, CollisionHit};
use crate::camera::events::CameraEvent;
use crate::camera::follow::{apply_constraints, desired_look_at, desired_position, Placement};
use crate::camera::shake;
use crate::camera::smoothing::{banking_offset, smooth_point, smooth_rotation};
use crate::camera::transition::{Easing, Transition, TransitionCallback, TransitionInfo};
use crate::camera::types::{
    CameraBounds, CameraConfig, CameraConfigPatch, CameraMode, CameraState, CameraTarget, FollowType, ShakeConfig,
    ShakeState, Smoothing, TargetPose, TargetSource, TransitionStatus,
};
use crate::error::CameraError;
use crate::math::{euler, local_right, look_rotation, p3, v3, Point3, UnitQuaternion, Vector3};
use crate::scene::RaycastService;

/// Last collision ray, kept for the debug overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProbe {
    pub from: Point3<f32>,
    pub to: Point3<f32>,
    pub hit: Option<CollisionHit>,
}

pub struct CameraTrackingController {
    config: CameraConfig,
    target: Option<CameraTarget>,
    bounds: Option<CameraBounds>,

    transition: Option<Transition>,
    transition_status: TransitionStatus,
    next_transition_id: u64,

    shake: ShakeState,

    smoothed_position: Point3<f32>,
    position: Point3<f32>,
    orientation: UnitQuaternion<f32>,
    look_at: Point3<f32>,
    free_transform: Option<(Point3<f32>, Point3<f32>)>,

    clock: f32, // drives Orbit
    last_probe: Option<CameraProbe>,
    events: Vec<CameraEvent>,
}

impl CameraTrackingController {
    pub fn new(config: CameraConfig) -> Self {
        let config = config.sanitized();
        let o = config.offset.position;
        let position = Point3::new(o[0], o[1], -o[2]);
        let look_at = Point3::origin();

        Self {
            config,
            target: None,
            bounds: None,
            transition: None,
            transition_status: TransitionStatus::default(),
            next_transition_id: 1,
            shake: ShakeState::default(),
            smoothed_position: position,
            position,
            orientation: look_rotation(look_at - position).unwrap_or_else(UnitQuaternion::identity),
            look_at,
            free_transform: None,
            clock: 0.0,
            last_probe: None,
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Target
    // ------------------------------------------------------------------------

    pub fn set_target(&mut self, target: CameraTarget) {
        let from = self.target.as_ref().map(|t| t.id.clone());
        let to = Some(target.id.clone());
        self.target = Some(target);
        if from != to {
            self.events.push(CameraEvent::TargetChanged { from, to });
        }
    }

    pub fn clear_target(&mut self) {
        if let Some(old) = self.target.take() {
            self.events.push(CameraEvent::TargetChanged { from: Some(old.id), to: None });
        }
    }

    /// Priority-aware switch: takes `candidate` when nothing active is tracked
    /// or it outranks the current target. Returns whether it is now tracked.
    pub fn propose_target(&mut self, candidate: CameraTarget) -> bool {
        if !candidate.active {
            return false;
        }
        let take = match &self.target {
            None => true,
            Some(cur) if cur.id == candidate.id => true,
            Some(cur) => !cur.active || candidate.priority > cur.priority,
        };
        if take {
            self.set_target(candidate);
        }
        take
    }

    // ------------------------------------------------------------------------
    // Mode / placement
    // ------------------------------------------------------------------------

    pub fn set_mode(&mut self, mode: CameraMode, follow_type: Option<FollowType>) {
        let from = self.config.mode;
        self.config.mode = mode;
        if let Some(f) = follow_type {
            self.config.follow_type = f;
        }
        if let Some(tr) = self.transition.as_mut() {
            tr.retarget_mode(self.config.mode, self.config.follow_type);
        }
        if mode == CameraMode::Free && self.free_transform.is_none() {
            // hold still until told otherwise
            self.free_transform = Some((self.smoothed_position, self.look_at));
        }

        self.events.push(CameraEvent::ModeChanged { from, to: mode, follow_type: self.config.follow_type });
    }

    pub fn set_bounds(&mut self, bounds: Option<CameraBounds>) {
        self.bounds = bounds;
    }

    /// Where a Free camera sits and looks. Ignored by the other modes.
    pub fn set_free_transform(&mut self, position: Point3<f32>, look_at: Point3<f32>) {
        self.free_transform = Some((position, look_at));
    }

    /// Jump without smoothing (spawn, respawn).
    pub fn teleport(&mut self, position: Point3<f32>, look_at: Point3<f32>) {
        self.smoothed_position = position;
        self.position = position;
        self.look_at = look_at;
        if let Some(q) = look_rotation(look_at - position) {
            self.orientation = q;
        }
    }

    // ------------------------------------------------------------------------
    // Shake
    // ------------------------------------------------------------------------

    pub fn start_shake(&mut self, config: ShakeConfig) -> Result<(), CameraError> {
        self.shake = shake::start(&config)?;
        self.events.push(CameraEvent::ShakeStarted { config });
        Ok(())
    }

    pub fn stop_shake(&mut self) {
        if self.shake.active {
            self.shake = ShakeState::default();
            self.events.push(CameraEvent::ShakeEnded);
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    pub fn transition_to(
        &mut self,
        patch: CameraConfigPatch,
        duration: f32,
        easing: Easing,
    ) -> Result<TransitionInfo, CameraError> {
        self.begin_transition(patch, duration, easing, None)
    }

    /// Like [`Self::transition_to`]; `on_complete` runs once when the end
    /// config is committed. A superseded transition drops its callback.
    pub fn transition_to_with<F>(
        &mut self,
        patch: CameraConfigPatch,
        duration: f32,
        easing: Easing,
        on_complete: F,
    ) -> Result<TransitionInfo, CameraError>
    where
        F: FnOnce(&TransitionInfo) + Send + 'static,
    {
        self.begin_transition(patch, duration, easing, Some(Box::new(on_complete)))
    }

    fn begin_transition(
        &mut self,
        patch: CameraConfigPatch,
        duration: f32,
        easing: Easing,
        on_complete: Option<TransitionCallback>,
    ) -> Result<TransitionInfo, CameraError> {
        if !(duration >= 0.0 && duration.is_finite()) {
            return Err(CameraError::NegativeDuration(duration));
        }

        // always from the live (possibly mid-interpolation) config
        let from = self.config;
        let to = from.merged(&patch);

        let info = TransitionInfo { id: self.next_transition_id, duration, easing };
        self.next_transition_id += 1;

        if let Some(old) = self.transition.replace(Transition::new(info, from, to, on_complete)) {
            debug!(superseded = old.info.id, by = info.id, "camera transition replaced");
        }
        self.transition_status = TransitionStatus { active: true, progress: 0.0 };
        self.events.push(CameraEvent::TransitionStarted { transition: info });
        Ok(info)
    }

    fn advance_transition(&mut self, dt: f32) {
        let finished = match self.transition.as_mut() {
            Some(tr) => {
                let step = tr.advance(dt);
                self.config = step.config;
                self.transition_status = TransitionStatus { active: !step.finished, progress: step.progress };
                step.finished
            }
            None => false,
        };

        if finished {
            if let Some(mut tr) = self.transition.take() {
                if let Some(cb) = tr.take_callback() {
                    cb(&tr.info);
                }
                self.events.push(CameraEvent::TransitionCompleted { transition: tr.info });
            }
        }
    }

    // ------------------------------------------------------------------------
    // Per-tick update
    // ------------------------------------------------------------------------

    pub fn update(&mut self, dt: f32, targets: &dyn TargetSource, scene: &dyn RaycastService) {
        if !(dt >= 0.0 && dt.is_finite()) {
            debug!(dt, "camera update skipped: bad dt");
            return;
        }
        self.clock += dt;

        self.advance_transition(dt);

        let cfg = self.config;
        let placement = Placement::resolve(cfg.mode, cfg.follow_type);
        let pose: Option<TargetPose> = self
            .target
            .as_ref()
            .filter(|t| t.active)
            .and_then(|t| targets.target_pose(&t.id));

        // --- desired position + look-at ---
        let (desired_pos, desired_look) = match (placement, &pose) {
            (Placement::Free, _) => match self.free_transform {
                Some((p, l)) => (Some(p), Some(l)),
                None => (None, None),
            },
            (_, Some(pose)) => {
                let p = desired_position(placement, pose, &cfg, self.clock)
                    .map(|p| if placement.is_attached() { p } else { apply_constraints(p, pose.position, &cfg) });
                (p, desired_look_at(placement, pose, &cfg))
            }
            // no target: hold position
            (_, None) => (None, None),
        };

        // --- smoothing (cockpit is rigid) ---
        let s = if placement == Placement::Cockpit {
            Smoothing { position: 1.0, rotation: 1.0, look_at: 1.0 }
        } else {
            cfg.smoothing
        };
        if let Some(p) = desired_pos {
            self.smoothed_position = smooth_point(self.smoothed_position, p, s.position, dt);
        }
        if let Some(l) = desired_look {
            self.look_at = smooth_point(self.look_at, l, s.look_at, dt);
        }

        // --- banking ---
        let bank = match &pose {
            Some(pose) if !placement.is_attached() => {
                banking_offset(&cfg.banking, pose.orientation * local_right(), pose.steer, pose.speed_ratio)
            }
            _ => Vector3::zeros(),
        };
        let mut camera = self.smoothed_position + bank;

        // --- collision ---
        self.last_probe = None;
        if cfg.constraints.collision_enabled && !placement.is_attached() {
            if let (Some(pose), Some(target)) = (&pose, &self.target) {
                let hit = resolve_collision(
                    scene,
                    &target.id,
                    pose.position,
                    camera,
                    cfg.constraints.min_distance_from_surface,
                );
                self.last_probe = Some(CameraProbe { from: pose.position, to: camera, hit });

                if let Some(hit) = hit {
                    camera = hit.position;
                    // ease back out once the view clears
                    self.smoothed_position = camera - bank;
                    self.events.push(CameraEvent::CollisionDetected {
                        position: p3(hit.position),
                        normal: v3(hit.normal),
                    });
                }
            }
        }

        // --- bounds ---
        if let Some(b) = &self.bounds {
            camera = b.clamp(camera);
        }

        // --- shake ---
        let mut rng = rand::thread_rng();
        if shake::step(&mut self.shake, dt, &mut rng) {
            self.events.push(CameraEvent::ShakeEnded);
        }

        // --- orientation ---
        if let Some(look) = look_rotation(self.look_at - camera) {
            let desired = look * euler(Vector3::from(cfg.offset.rotation));
            self.orientation = smooth_rotation(self.orientation, desired, s.rotation, dt);
        }

        self.position = camera + Vector3::from(self.shake.offset);
    }

    // ------------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------------

    pub fn state(&self) -> CameraState {
        CameraState {
            mode: self.config.mode,
            follow_type: self.config.follow_type,
            target: self.target.clone(),
            smoothed_position: self.smoothed_position,
            position: self.position,
            orientation: self.orientation,
            look_at: self.look_at,
            fov: self.config.fov,
            near: self.config.near,
            far: self.config.far,
            transition: self.transition_status,
            shake: self.shake,
        }
    }

    /// Live config, including any in-flight interpolation.
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn last_probe(&self) -> Option<&CameraProbe> {
        self.last_probe.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<CameraEvent> {
        std::mem::take(&mut self.events)
    }
}
