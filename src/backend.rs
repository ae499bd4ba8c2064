// ==============================================================================
// backend.rs — NARROW RIGID-BODY CAPABILITY USED BY THE VEHICLE CONTROLLER
// ------------------------------------------------------------------------------
// The controller only ever talks to a body through `RigidBodyBackend`. The
// backend never holds anything of the controller, so the dependency stays
// one-directional and a dead handle turns into `BackendError::Disposed`
// instead of a panic.
//
// Forces added through `apply_force`/`apply_torque` accumulate for the current
// tick. rapier keeps user forces until they are reset, so `clear_forces` must
// run before the next tick's accumulation (the controller does this itself).
// ==============================================================================

use rapier3d::prelude::{RigidBody, RigidBodyHandle, RigidBodySet};

use crate::error::BackendError;
use crate::math::{Point3, UnitQuaternion, Vector3};

pub trait RigidBodyBackend {
    fn is_valid(&self) -> bool;

    /// Force in world space; `world_point = None` applies it at the center of mass.
    fn apply_force(&mut self, force: Vector3<f32>, world_point: Option<Point3<f32>>) -> Result<(), BackendError>;
    fn apply_torque(&mut self, torque: Vector3<f32>) -> Result<(), BackendError>;
    fn clear_forces(&mut self) -> Result<(), BackendError>;

    fn position(&self) -> Result<Point3<f32>, BackendError>;
    fn orientation(&self) -> Result<UnitQuaternion<f32>, BackendError>;
    fn linear_velocity(&self) -> Result<Vector3<f32>, BackendError>;
    fn angular_velocity(&self) -> Result<Vector3<f32>, BackendError>;

    fn set_position(&mut self, position: Point3<f32>) -> Result<(), BackendError>;
    fn set_orientation(&mut self, orientation: UnitQuaternion<f32>) -> Result<(), BackendError>;
    fn set_linear_velocity(&mut self, velocity: Vector3<f32>) -> Result<(), BackendError>;
    fn set_angular_velocity(&mut self, velocity: Vector3<f32>) -> Result<(), BackendError>;

    /// All four kinematic quantities in one read.
    fn kinematics(&self) -> Result<Kinematics, BackendError> {
        Ok(Kinematics {
            position: self.position()?,
            orientation: self.orientation()?,
            linear_velocity: self.linear_velocity()?,
            angular_velocity: self.angular_velocity()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Point3<f32>,
    pub orientation: UnitQuaternion<f32>,
    pub linear_velocity: Vector3<f32>,
    pub angular_velocity: Vector3<f32>,
}

/// One chassis inside a rapier `RigidBodySet`.
pub struct RapierBody<'a> {
    bodies: &'a mut RigidBodySet,
    handle: RigidBodyHandle,
}

impl<'a> RapierBody<'a> {
    pub fn new(bodies: &'a mut RigidBodySet, handle: RigidBodyHandle) -> Self {
        Self { bodies, handle }
    }

    fn body(&self) -> Result<&RigidBody, BackendError> {
        self.bodies.get(self.handle).ok_or(BackendError::Disposed)
    }

    fn body_mut(&mut self) -> Result<&mut RigidBody, BackendError> {
        self.bodies.get_mut(self.handle).ok_or(BackendError::Disposed)
    }
}

impl RigidBodyBackend for RapierBody<'_> {
    fn is_valid(&self) -> bool {
        self.handle != RigidBodyHandle::invalid() && self.bodies.contains(self.handle)
    }

    fn apply_force(&mut self, force: Vector3<f32>, world_point: Option<Point3<f32>>) -> Result<(), BackendError> {
        let body = self.body_mut()?;
        match world_point {
            Some(p) => body.add_force_at_point(force, p, true),
            None => body.add_force(force, true),
        }
        Ok(())
    }

    fn apply_torque(&mut self, torque: Vector3<f32>) -> Result<(), BackendError> {
        self.body_mut()?.add_torque(torque, true);
        Ok(())
    }

    fn clear_forces(&mut self) -> Result<(), BackendError> {
        let body = self.body_mut()?;
        body.reset_forces(false);
        body.reset_torques(false);
        Ok(())
    }

    fn position(&self) -> Result<Point3<f32>, BackendError> {
        Ok(Point3::from(*self.body()?.translation()))
    }

    fn orientation(&self) -> Result<UnitQuaternion<f32>, BackendError> {
        Ok(*self.body()?.rotation())
    }

    fn linear_velocity(&self) -> Result<Vector3<f32>, BackendError> {
        Ok(*self.body()?.linvel())
    }

    fn angular_velocity(&self) -> Result<Vector3<f32>, BackendError> {
        Ok(*self.body()?.angvel())
    }

    fn set_position(&mut self, position: Point3<f32>) -> Result<(), BackendError> {
        self.body_mut()?.set_translation(position.coords, true);
        Ok(())
    }

    fn set_orientation(&mut self, orientation: UnitQuaternion<f32>) -> Result<(), BackendError> {
        self.body_mut()?.set_rotation(orientation, true);
        Ok(())
    }

    fn set_linear_velocity(&mut self, velocity: Vector3<f32>) -> Result<(), BackendError> {
        self.body_mut()?.set_linvel(velocity, true);
        Ok(())
    }

    fn set_angular_velocity(&mut self, velocity: Vector3<f32>) -> Result<(), BackendError> {
        self.body_mut()?.set_angvel(velocity, true);
        Ok(())
    }
}
