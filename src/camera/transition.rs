// ==============================================================================
// transition.rs — TIMED CONFIG INTERPOLATION
// ------------------------------------------------------------------------------
// A transition owns a frozen `from` config (the live config when it started),
// the merged `to` config and a clock. Each advance returns the config for that
// instant; once the clock reaches the duration it returns `to` verbatim.
// A new transition replaces the old one; nothing is queued.
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::camera::types::{CameraConfig, CameraMode, FollowType};

/// Clock slack so float-summed dt still lands on the end tick.
const END_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

/// Public description carried by transition events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransitionInfo {
    pub id: u64,
    pub duration: f32,
    pub easing: Easing,
}

pub type TransitionCallback = Box<dyn FnOnce(&TransitionInfo) + Send>;

pub struct Transition {
    pub info: TransitionInfo,
    from: CameraConfig,
    to: CameraConfig,
    elapsed: f32,
    progress: f32,
    on_complete: Option<TransitionCallback>,
}

/// Result of one clock advance.
pub struct TransitionStep {
    pub config: CameraConfig,
    pub progress: f32,
    pub finished: bool,
}

impl Transition {
    pub fn new(
        info: TransitionInfo,
        from: CameraConfig,
        to: CameraConfig,
        on_complete: Option<TransitionCallback>,
    ) -> Self {
        Self { info, from, to, elapsed: 0.0, progress: 0.0, on_complete }
    }

    pub fn advance(&mut self, dt: f32) -> TransitionStep {
        self.elapsed += dt.max(0.0);

        let raw = if self.elapsed + END_EPSILON >= self.info.duration {
            1.0
        } else {
            (self.elapsed / self.info.duration).clamp(0.0, 1.0)
        };
        // never run backwards
        self.progress = self.progress.max(raw);

        let finished = self.progress >= 1.0;
        let config = if finished {
            self.to
        } else {
            self.from.lerp(&self.to, self.info.easing.apply(self.progress))
        };

        TransitionStep { config, progress: self.progress, finished }
    }

    /// Keep a mid-flight mode switch from being undone on commit.
    pub fn retarget_mode(&mut self, mode: CameraMode, follow_type: FollowType) {
        for cfg in [&mut self.from, &mut self.to] {
            cfg.mode = mode;
            cfg.follow_type = follow_type;
        }
    }

    pub fn take_callback(&mut self) -> Option<TransitionCallback> {
        self.on_complete.take()
    }
}
