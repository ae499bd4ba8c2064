use serde::Serialize;

use crate::camera::transition::TransitionInfo;
use crate::camera::types::{CameraMode, FollowType, ShakeConfig};
use crate::math::Vec3;
use crate::scene::EntityId;

/// Notifications for UI/audio/analytics, drained by the owner each tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraEvent {
    TargetChanged {
        from: Option<EntityId>,
        to: Option<EntityId>,
    },
    ModeChanged {
        from: CameraMode,
        to: CameraMode,
        follow_type: FollowType,
    },
    ShakeStarted {
        config: ShakeConfig,
    },
    ShakeEnded,
    TransitionStarted {
        transition: TransitionInfo,
    },
    TransitionCompleted {
        transition: TransitionInfo,
    },
    CollisionDetected {
        position: Vec3,
        normal: Vec3,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let ev = CameraEvent::ModeChanged {
            from: CameraMode::Follow,
            to: CameraMode::Overhead,
            follow_type: FollowType::Behind,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "mode_changed");
        assert_eq!(json["to"], "overhead");

        let json = serde_json::to_value(CameraEvent::ShakeEnded).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "shake_ended" }));
    }
}
