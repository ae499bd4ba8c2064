// ==============================================================================
// shake.rs — TIME-BOUNDED RANDOM CAMERA SHAKE
// ------------------------------------------------------------------------------
// Free-running randomness (thread_rng), so only bounds and lifetime are
// testable. The offset is resampled every tick inside a cube of half-size
// `intensity`, then intensity decays multiplicatively.
// ==============================================================================

use rand::Rng;

use crate::camera::smoothing::REFERENCE_HZ;
use crate::camera::types::{ShakeConfig, ShakeState};
use crate::error::CameraError;
use crate::math::sanitize;

/// Tolerance on the remaining time so float-summed ticks end on schedule.
const END_EPSILON: f32 = 1e-5;
const MAX_INTENSITY: f32 = 10.0; // m

/// Validate and build the initial state. Negative or NaN durations are
/// rejected; an infinite one runs until stopped.
pub fn start(config: &ShakeConfig) -> Result<ShakeState, CameraError> {
    if !(config.duration >= 0.0) {
        return Err(CameraError::NegativeDuration(config.duration));
    }

    Ok(ShakeState {
        active: true,
        time_remaining: config.duration,
        intensity: sanitize(config.intensity, 0.0, MAX_INTENSITY, 0.0),
        decay: sanitize(config.decay, 0.0, 1.0, 1.0),
        offset: [0.0; 3],
    })
}

/// Advance one tick. Returns true when the shake ended on this tick.
pub fn step<R: Rng + ?Sized>(shake: &mut ShakeState, dt: f32, rng: &mut R) -> bool {
    if !shake.active {
        return false;
    }

    shake.time_remaining -= dt;
    if shake.time_remaining <= END_EPSILON {
        *shake = ShakeState::default();
        return true;
    }

    let i = shake.intensity;
    if i > 0.0 {
        shake.offset = [rng.gen_range(-i..=i), rng.gen_range(-i..=i), rng.gen_range(-i..=i)];
    } else {
        shake.offset = [0.0; 3];
    }

    shake.intensity *= shake.decay.powf(dt * REFERENCE_HZ);
    false
}
