//! Arcade vehicle dynamics.
//!
//! Engine-agnostic: the controller talks to the rigid body only through
//! [`crate::backend::RigidBodyBackend`] and reads ground contact handed in by
//! the caller.

pub mod controller;
pub mod drift;
pub mod longitudinal;
pub mod stability;
pub mod steering;
pub mod tuning;
pub mod types;

pub use controller::VehicleDynamicsController;
pub use drift::DriftPhase;
pub use tuning::{AccelerationCurve, VehicleTuning, KART};
pub use types::{ControlInput, DriftState, ForceBreakdown, VehicleSnapshot, VehicleState};
