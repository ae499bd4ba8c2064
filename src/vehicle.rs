use crate::dynamics::{ControlInput, VehicleDynamicsController, VehicleTuning};
use crate::ground::GroundContact;
use crate::math::{Point3, UnitQuaternion};
use rapier3d::prelude::RigidBodyHandle;

/// One simulated kart: its chassis body plus the controller driving it.
pub struct Vehicle {
    pub body: RigidBodyHandle,            // the chassis body
    pub controller: VehicleDynamicsController,
    pub input: ControlInput,              // latest input, held until replaced
    pub ground: GroundContact,            // last ground probe
    pub spawn_position: Point3<f32>,      // chassis center at spawn
    pub spawn_orientation: UnitQuaternion<f32>,
}

impl Vehicle {
    pub fn new(body: RigidBodyHandle, tuning: VehicleTuning, position: Point3<f32>) -> Self {
        Self {
            body,
            controller: VehicleDynamicsController::new(tuning),
            input: ControlInput::default(),
            ground: GroundContact::airborne(),
            spawn_position: position,
            spawn_orientation: UnitQuaternion::identity(),
        }
    }
}
