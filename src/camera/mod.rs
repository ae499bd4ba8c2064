//! Camera tracking: mode-dependent placement, smoothing, collision-aware
//! repositioning, shake and live config transitions.

pub mod collision;
pub mod controller;
pub mod events;
pub mod follow;
pub mod shake;
pub mod smoothing;
pub mod transition;
pub mod types;

pub use controller::{CameraProbe, CameraTrackingController};
pub use events::CameraEvent;
pub use transition::{Easing, TransitionInfo};
pub use types::{
    CameraBounds, CameraConfig, CameraConfigPatch, CameraMode, CameraSnapshot, CameraState, CameraTarget, FollowType,
    ShakeConfig, TargetPose, TargetSource,
};
