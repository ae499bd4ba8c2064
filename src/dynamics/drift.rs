// ==============================================================================
// drift.rs — TWO-STATE DRIFT MACHINE
// ------------------------------------------------------------------------------
// NotDrifting -> Drifting  when |steer| > threshold AND speed > speed threshold
// Drifting    -> NotDrifting as soon as either condition fails
//
// Entry and exit use the same test, so the phase is a pure function of this
// tick's input, speed and ground contact. No history is consulted.
//
// While drifting the level is recomputed from scratch every tick:
//   drift_level = min(1, |steer| * speed / max_speed)
// No accumulation, no boost tiers.
// ==============================================================================

use crate::dynamics::tuning::VehicleTuning;
use crate::dynamics::types::{ControlInput, DriftState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DriftPhase {
    #[default]
    NotDrifting,
    Drifting,
}

/// Steer magnitude needed to enter (and stay in) a drift this tick.
pub fn steer_threshold(tuning: &VehicleTuning, drift_requested: bool) -> f32 {
    if drift_requested {
        tuning.drift_steer_threshold * tuning.drift_request_steer_scale
    } else {
        tuning.drift_steer_threshold
    }
}

pub fn drift_level(tuning: &VehicleTuning, steer: f32, speed: f32) -> f32 {
    (steer.abs() * speed / tuning.max_speed).clamp(0.0, 1.0)
}

/// Phase and level for this tick. `grounded = false` always drops the drift.
pub fn evaluate_drift(tuning: &VehicleTuning, input: &ControlInput, speed: f32, grounded: bool) -> (DriftPhase, DriftState) {
    let drifting = grounded
        && input.steer.abs() > steer_threshold(tuning, input.drift_requested)
        && speed > tuning.drift_speed_threshold;

    let next = if drifting { DriftPhase::Drifting } else { DriftPhase::NotDrifting };

    let state = match next {
        DriftPhase::Drifting => DriftState {
            is_drifting: true,
            drift_level: drift_level(tuning, input.steer, speed),
        },
        DriftPhase::NotDrifting => DriftState::default(),
    };

    (next, state)
}
