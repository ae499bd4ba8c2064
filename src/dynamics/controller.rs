// ==============================================================================
// controller.rs — VEHICLE DYNAMICS CONTROLLER
// ==============================================================================
// Per tick (fixed order):
//   0) validate dt + handle, clamp input, clear last tick's accumulated forces
//   1) read kinematics, project velocity onto the chassis ground frame
//   2) steering angle (rate limited, speed-scaled) + drift machine
//   3) grounded only: drive, brake, steering force/yaw, lateral grip, upright
//   4) always: drag + angular damping
//   5) push one net force + one net torque into the backend
//
// After the backend integrates, `finish_tick` applies the hard planar speed
// clamp and refreshes the published state.
// ==============================================================================

use tracing::debug;

use crate::backend::RigidBodyBackend;
use crate::dynamics::drift::{evaluate_drift, DriftPhase};
use crate::dynamics::longitudinal::{brake_force, drag_force, drive_force};
use crate::dynamics::stability::{angular_damping_torque, upright_torque};
use crate::dynamics::steering::{lateral_grip, steering_response, update_steering_angle};
use crate::dynamics::tuning::VehicleTuning;
use crate::dynamics::types::{ControlInput, ForceBreakdown, VehicleState};
use crate::error::{BackendError, VehicleError};
use crate::ground::GroundContact;
use crate::math::{local_forward, planar, safe_normalize, up, Point3, UnitQuaternion, Vector3};

pub struct VehicleDynamicsController {
    tuning: VehicleTuning,
    state: VehicleState,
    drift_phase: DriftPhase,
    last_forces: ForceBreakdown,
}

impl VehicleDynamicsController {
    pub fn new(tuning: VehicleTuning) -> Self {
        let tuning = tuning.sanitized();
        Self {
            state: VehicleState::at_rest(Point3::origin(), UnitQuaternion::identity(), tuning.idle_rpm),
            tuning,
            drift_phase: DriftPhase::NotDrifting,
            last_forces: ForceBreakdown::zero(),
        }
    }

    pub fn tuning(&self) -> &VehicleTuning {
        &self.tuning
    }

    /// Snapshot as of the last `tick`/`finish_tick`/`reset`.
    pub fn state(&self) -> VehicleState {
        self.state
    }

    pub fn drift_phase(&self) -> DriftPhase {
        self.drift_phase
    }

    /// Forces pushed into the body on the last successful tick.
    pub fn last_forces(&self) -> &ForceBreakdown {
        &self.last_forces
    }

    pub fn tick<B: RigidBodyBackend + ?Sized>(
        &mut self,
        body: &mut B,
        ground: &GroundContact,
        input: ControlInput,
        dt: f32,
    ) -> Result<ForceBreakdown, VehicleError> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(VehicleError::InvalidTimestep(dt));
        }
        if !body.is_valid() {
            return Err(BackendError::Disposed.into());
        }

        let t = self.tuning;
        let input = input.sanitized();

        // rapier keeps user forces across steps
        body.clear_forces()?;
        let k = body.kinematics()?;

        // ----------------------------------------------------------------------
        // Ground frame
        // ----------------------------------------------------------------------
        let forward = safe_normalize(planar(k.orientation * local_forward()), local_forward());
        let right = forward.cross(&up());

        let v = k.linear_velocity;
        let v_planar = planar(v);
        let speed = v_planar.norm();
        let forward_speed = v_planar.dot(&forward);
        let lateral_speed = v_planar.dot(&right);

        // ----------------------------------------------------------------------
        // Steering + drift
        // ----------------------------------------------------------------------
        let steering_angle = update_steering_angle(&t, self.state.steering_angle, input.steer, speed, dt);

        let (phase, drift) = evaluate_drift(&t, &input, speed, ground.grounded);
        if phase != self.drift_phase {
            debug!(?phase, speed, steer = input.steer, "drift phase changed");
        }
        self.drift_phase = phase;

        // ----------------------------------------------------------------------
        // Forces
        // ----------------------------------------------------------------------
        let mut f = ForceBreakdown::zero();

        if ground.grounded {
            f.drive = forward * (drive_force(&t, forward_speed) * input.accelerate);
            f.brake = brake_force(&t, v, input.brake, dt);

            let steer = steering_response(&t, steering_angle, forward_speed, speed);
            f.steering = right * steer.lateral;
            f.yaw_torque = up() * steer.yaw;

            f.grip = right * lateral_grip(&t, lateral_speed, drift.drift_level, dt);
            f.upright_torque = upright_torque(&t, k.orientation, k.angular_velocity);
        }

        f.drag = drag_force(&t, v);
        f.damping_torque = angular_damping_torque(&t, k.angular_velocity);

        body.apply_force(f.total_force(), None)?;
        body.apply_torque(f.total_torque())?;

        // ----------------------------------------------------------------------
        // Publish
        // ----------------------------------------------------------------------
        let speed_ratio = (speed / t.max_speed).clamp(0.0, 1.0);
        let load = (0.8 * speed_ratio + 0.2 * input.accelerate).clamp(0.0, 1.0);

        self.state = VehicleState {
            position: k.position,
            orientation: k.orientation,
            linear_velocity: k.linear_velocity,
            angular_velocity: k.angular_velocity,
            speed,
            steering_angle,
            steer: input.steer,
            drift,
            engine_rpm: t.idle_rpm + (t.max_rpm - t.idle_rpm) * load,
            grounded: ground.grounded,
        };
        self.last_forces = f;

        Ok(f)
    }

    /// Post-integration: direction-preserving planar speed clamp, state refresh.
    pub fn finish_tick<B: RigidBodyBackend + ?Sized>(&mut self, body: &mut B) -> Result<VehicleState, VehicleError> {
        let k = body.kinematics()?;

        let mut v = k.linear_velocity;
        let v_planar = planar(v);
        let mut speed = v_planar.norm();

        if speed > self.tuning.max_speed {
            let scaled = v_planar * (self.tuning.max_speed / speed);
            v = Vector3::new(scaled.x, v.y, scaled.z);
            body.set_linear_velocity(v)?;
            speed = self.tuning.max_speed;
        }

        self.state.position = k.position;
        self.state.orientation = k.orientation;
        self.state.linear_velocity = v;
        self.state.angular_velocity = k.angular_velocity;
        self.state.speed = speed;

        Ok(self.state)
    }

    /// Teleport, zero all motion and forget steering/drift.
    pub fn reset<B: RigidBodyBackend + ?Sized>(
        &mut self,
        body: &mut B,
        position: Point3<f32>,
        orientation: UnitQuaternion<f32>,
    ) -> Result<(), VehicleError> {
        body.clear_forces()?;
        body.set_position(position)?;
        body.set_orientation(orientation)?;
        body.set_linear_velocity(Vector3::zeros())?;
        body.set_angular_velocity(Vector3::zeros())?;

        self.state = VehicleState::at_rest(position, orientation, self.tuning.idle_rpm);
        self.drift_phase = DriftPhase::NotDrifting;
        self.last_forces = ForceBreakdown::zero();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Kinematics;
    use crate::dynamics::tuning::KART;
    use rand::Rng;

    const DT: f32 = 1.0 / 60.0;

    /// Point mass with explicit Euler integration; rotation is frozen.
    struct FakeBody {
        alive: bool,
        k: Kinematics,
        force: Vector3<f32>,
        torque: Vector3<f32>,
        mass: f32,
    }

    impl FakeBody {
        fn new() -> Self {
            Self {
                alive: true,
                k: Kinematics {
                    position: Point3::new(0.0, 0.3, 0.0),
                    orientation: UnitQuaternion::identity(),
                    linear_velocity: Vector3::zeros(),
                    angular_velocity: Vector3::zeros(),
                },
                force: Vector3::zeros(),
                torque: Vector3::zeros(),
                mass: KART.mass,
            }
        }

        fn integrate(&mut self, dt: f32) {
            self.k.linear_velocity += self.force / self.mass * dt;
            self.k.position += self.k.linear_velocity * dt;
        }
    }

    impl RigidBodyBackend for FakeBody {
        fn is_valid(&self) -> bool {
            self.alive
        }
        fn apply_force(&mut self, force: Vector3<f32>, _: Option<Point3<f32>>) -> Result<(), BackendError> {
            self.force += force;
            Ok(())
        }
        fn apply_torque(&mut self, torque: Vector3<f32>) -> Result<(), BackendError> {
            self.torque += torque;
            Ok(())
        }
        fn clear_forces(&mut self) -> Result<(), BackendError> {
            self.force = Vector3::zeros();
            self.torque = Vector3::zeros();
            Ok(())
        }
        fn position(&self) -> Result<Point3<f32>, BackendError> {
            Ok(self.k.position)
        }
        fn orientation(&self) -> Result<UnitQuaternion<f32>, BackendError> {
            Ok(self.k.orientation)
        }
        fn linear_velocity(&self) -> Result<Vector3<f32>, BackendError> {
            Ok(self.k.linear_velocity)
        }
        fn angular_velocity(&self) -> Result<Vector3<f32>, BackendError> {
            Ok(self.k.angular_velocity)
        }
        fn set_position(&mut self, p: Point3<f32>) -> Result<(), BackendError> {
            self.k.position = p;
            Ok(())
        }
        fn set_orientation(&mut self, q: UnitQuaternion<f32>) -> Result<(), BackendError> {
            self.k.orientation = q;
            Ok(())
        }
        fn set_linear_velocity(&mut self, v: Vector3<f32>) -> Result<(), BackendError> {
            self.k.linear_velocity = v;
            Ok(())
        }
        fn set_angular_velocity(&mut self, w: Vector3<f32>) -> Result<(), BackendError> {
            self.k.angular_velocity = w;
            Ok(())
        }
    }

    fn step(c: &mut VehicleDynamicsController, b: &mut FakeBody, input: ControlInput) -> VehicleState {
        c.tick(b, &GroundContact::flat(0.3), input, DT).unwrap();
        b.integrate(DT);
        c.finish_tick(b).unwrap()
    }

    fn throttle() -> ControlInput {
        ControlInput { accelerate: 1.0, ..Default::default() }
    }

    #[test]
    fn test_rejects_bad_dt() {
        let mut c = VehicleDynamicsController::new(KART);
        let mut b = FakeBody::new();
        let ground = GroundContact::flat(0.3);

        assert_eq!(c.tick(&mut b, &ground, throttle(), 0.0), Err(VehicleError::InvalidTimestep(0.0)));
        assert!(c.tick(&mut b, &ground, throttle(), f32::NAN).is_err());
        assert_eq!(b.force, Vector3::zeros());
    }

    #[test]
    fn test_disposed_body_is_reported_noop() {
        let mut c = VehicleDynamicsController::new(KART);
        let mut b = FakeBody::new();
        b.alive = false;

        let r = c.tick(&mut b, &GroundContact::flat(0.3), throttle(), DT);
        assert_eq!(r, Err(VehicleError::Backend(BackendError::Disposed)));
        assert_eq!(c.state().speed, 0.0);
    }

    #[test]
    fn test_throttle_accelerates_then_clamps() {
        let mut c = VehicleDynamicsController::new(KART);
        let mut b = FakeBody::new();

        let mut prev = 0.0;
        for _ in 0..600 {
            let s = step(&mut c, &mut b, throttle());
            assert!(s.speed + 1e-4 >= prev);
            assert!(s.speed <= KART.max_speed + 1e-4);
            prev = s.speed;
        }
        assert!((prev - KART.max_speed).abs() < 1e-3);
    }

    #[test]
    fn test_coasting_decays() {
        let mut c = VehicleDynamicsController::new(KART);
        let mut b = FakeBody::new();
        b.k.linear_velocity = Vector3::new(0.0, 0.0, 12.0);

        let mut prev = 12.0;
        for _ in 0..300 {
            let s = step(&mut c, &mut b, ControlInput::default());
            assert!(s.speed < prev);
            prev = s.speed;
        }
        assert!(prev < 12.0 * 0.8);
    }

    #[test]
    fn test_airborne_gets_no_drive() {
        let mut c = VehicleDynamicsController::new(KART);
        let mut b = FakeBody::new();

        let f = c.tick(&mut b, &GroundContact::airborne(), throttle(), DT).unwrap();
        assert_eq!(f.drive, Vector3::zeros());
        assert!(!c.state().grounded);
    }

    #[test]
    fn test_drift_invariant_under_random_input() {
        let mut c = VehicleDynamicsController::new(KART);
        let mut b = FakeBody::new();
        let mut rng = rand::thread_rng();

        for _ in 0..500 {
            let input = ControlInput {
                accelerate: rng.gen_range(-0.5..1.5),
                brake: rng.gen_range(0.0..0.3),
                steer: rng.gen_range(-1.5..1.5),
                drift_requested: rng.gen_range(0..2) == 1,
            };
            let s = step(&mut c, &mut b, input);
            assert!((0.0..=1.0).contains(&s.drift.drift_level));
            if !s.drift.is_drifting {
                assert_eq!(s.drift.drift_level, 0.0);
            }
            assert!(s.steering_angle.abs() <= KART.max_steer_angle + 1e-6);
            assert!(s.speed <= KART.max_speed + 1e-4);
        }
    }

    #[test]
    fn test_reset_zeroes_motion() {
        let mut c = VehicleDynamicsController::new(KART);
        let mut b = FakeBody::new();
        for _ in 0..60 {
            step(&mut c, &mut b, ControlInput { accelerate: 1.0, steer: 1.0, ..Default::default() });
        }

        let target = Point3::new(5.0, 1.0, -3.0);
        c.reset(&mut b, target, UnitQuaternion::identity()).unwrap();

        let s = c.state();
        assert_eq!(s.position, target);
        assert_eq!(s.speed, 0.0);
        assert_eq!(s.steering_angle, 0.0);
        assert!(!s.drift.is_drifting);
        assert_eq!(b.k.linear_velocity, Vector3::zeros());
        assert_eq!(c.drift_phase(), DriftPhase::NotDrifting);
    }

    #[test]
    fn test_rpm_follows_speed_and_throttle() {
        let mut c = VehicleDynamicsController::new(KART);
        let mut b = FakeBody::new();
        let idle = step(&mut c, &mut b, ControlInput::default()).engine_rpm;
        assert_eq!(idle, KART.idle_rpm);

        for _ in 0..120 {
            step(&mut c, &mut b, throttle());
        }
        let rpm = c.state().engine_rpm;
        assert!(rpm > idle && rpm <= KART.max_rpm);
    }
}
