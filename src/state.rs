// ==============================================================================
// state.rs — CONNECTED PLAYERS, THEIR CAMERAS, SNAPSHOT FAN-OUT
// ------------------------------------------------------------------------------
// Every player owns one kart in the PhysicsWorld and one camera controller
// tracking it. Each tick the cameras are advanced against the world and every
// client gets its own snapshot: all vehicles, its camera, its camera events
// and (optionally) its debug overlay.
//
// Lock order everywhere: physics first, then game state.
// ==============================================================================

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::camera::{CameraConfig, CameraEvent, CameraSnapshot, CameraTarget, CameraTrackingController};
use crate::debug_builders::{push_camera_probe, DebugOverlay};
use crate::dynamics::VehicleSnapshot;
use crate::math::Point3;
use crate::physics::PhysicsWorld;
use crate::scene::EntityId;
use crate::spawn::{PlayerSpawnInfo, SpawnManager};

// ---------------------------------------------
// SERVER -> CLIENT MESSAGES
// ---------------------------------------------
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        player_id: EntityId,
        spawn: PlayerSpawnInfo,
    },
    Snapshot {
        tick: u64,
        vehicles: Vec<VehicleSnapshot>,
        camera: CameraSnapshot,
        events: Vec<CameraEvent>,
        #[serde(skip_serializing_if = "Option::is_none")]
        debug: Option<DebugOverlay>,
    },
    Pong,
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(error = %e, "server message not serializable");
                None
            }
        }
    }
}

pub struct Player {
    pub id: EntityId,
    pub tx: UnboundedSender<String>,
    pub camera: CameraTrackingController,
}

impl Player {
    pub fn send(&self, msg: &ServerMessage) {
        if let Some(json) = msg.to_json() {
            // receiver gone means the socket is closing; cleanup happens there
            let _ = self.tx.send(json);
        }
    }
}

pub struct SharedGameState {
    pub tick: u64,
    pub players: HashMap<EntityId, Player>,
    pub spawns: SpawnManager,
    pub camera_defaults: CameraConfig,
    pub debug_overlay: bool,
}

impl SharedGameState {
    pub fn new(camera_defaults: CameraConfig, debug_overlay: bool) -> Self {
        Self {
            tick: 0,
            players: HashMap::new(),
            spawns: SpawnManager::new(),
            camera_defaults,
            debug_overlay,
        }
    }

    /// Grid slot + kart + a camera locked onto it.
    pub fn add_player(&mut self, id: &str, tx: UnboundedSender<String>, physics: &mut PhysicsWorld) -> PlayerSpawnInfo {
        let spawn = self.spawns.allocate_spawn(id);
        let [x, y, z] = spawn.position;
        let ground = Point3::new(x, y, z);
        physics.spawn_vehicle(id, ground);

        let mut camera = CameraTrackingController::new(self.camera_defaults);
        let o = camera.config().offset.position;
        camera.teleport(Point3::new(x + o[0], y + o[1], z - o[2]), ground);
        camera.set_target(CameraTarget::new(id));

        self.players.insert(id.to_string(), Player { id: id.to_string(), tx, camera });
        info!(player = id, slot = spawn.slot, players = self.players.len(), "player joined");
        spawn
    }

    pub fn remove_player(&mut self, id: &str, physics: &mut PhysicsWorld) -> bool {
        let known = self.players.remove(id).is_some();
        self.spawns.release(id);
        physics.despawn_vehicle(id);
        if known {
            info!(player = id, players = self.players.len(), "player left");
        }
        known
    }

    pub fn camera_mut(&mut self, id: &str) -> Option<&mut CameraTrackingController> {
        self.players.get_mut(id).map(|p| &mut p.camera)
    }

    /// Cameras read the world after it has stepped.
    pub fn update_cameras(&mut self, dt: f32, physics: &PhysicsWorld) {
        let scene = physics.scene();
        for player in self.players.values_mut() {
            player.camera.update(dt, physics, &scene);
        }
    }

    /// Per-client snapshot; drains each camera's pending events.
    pub fn snapshot_for(&mut self, id: &str, vehicles: &[VehicleSnapshot], physics: &PhysicsWorld) -> Option<ServerMessage> {
        let tick = self.tick;
        let with_debug = self.debug_overlay;
        let player = self.players.get_mut(id)?;

        let debug = if with_debug {
            physics.debug_overlay(id).map(|mut overlay| {
                if let Some(probe) = player.camera.last_probe() {
                    push_camera_probe(&mut overlay, probe);
                }
                overlay
            })
        } else {
            None
        };

        Some(ServerMessage::Snapshot {
            tick,
            vehicles: vehicles.to_vec(),
            camera: CameraSnapshot::from_state(&player.camera.state()),
            events: player.camera.drain_events(),
            debug,
        })
    }

    pub fn broadcast_snapshot(&mut self, physics: &PhysicsWorld) {
        let vehicles = physics.vehicle_snapshots();
        let ids: Vec<EntityId> = self.players.keys().cloned().collect();

        for id in ids {
            if let Some(msg) = self.snapshot_for(&id, &vehicles, physics) {
                if let Some(player) = self.players.get(&id) {
                    player.send(&msg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn world() -> PhysicsWorld {
        PhysicsWorld::default()
    }

    #[test]
    fn test_add_and_remove_player() {
        let mut physics = world();
        let mut game = SharedGameState::new(CameraConfig::default(), false);
        let (tx, _rx) = mpsc::unbounded_channel();

        let spawn = game.add_player("p1", tx, &mut physics);
        assert_eq!(spawn.slot, 0);
        assert!(physics.vehicle_state("p1").is_some());
        assert_eq!(game.players["p1"].camera.state().target.map(|t| t.id), Some("p1".to_string()));

        assert!(game.remove_player("p1", &mut physics));
        assert!(physics.vehicle_state("p1").is_none());
        assert!(game.spawns.is_empty());
        assert!(!game.remove_player("p1", &mut physics));
    }

    #[test]
    fn test_snapshot_reaches_client_with_target_event() {
        let mut physics = world();
        let mut game = SharedGameState::new(CameraConfig::default(), true);
        let (tx, mut rx) = mpsc::unbounded_channel();
        game.add_player("p1", tx, &mut physics);

        physics.step(1.0 / 60.0);
        game.update_cameras(1.0 / 60.0, &physics);
        game.tick += 1;
        game.broadcast_snapshot(&physics);

        let json = rx.try_recv().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["type"], "snapshot");
        assert_eq!(v["tick"], 1);
        assert_eq!(v["vehicles"][0]["id"], "p1");
        assert_eq!(v["events"][0]["type"], "target_changed");
        assert!(v["debug"]["ground_probe"].is_object());

        // events are delivered once
        game.broadcast_snapshot(&physics);
        let v: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(v["events"].as_array().map(|a| a.len()), Some(0));
    }

    #[test]
    fn test_debug_omitted_when_disabled() {
        let mut physics = world();
        let mut game = SharedGameState::new(CameraConfig::default(), false);
        let (tx, mut rx) = mpsc::unbounded_channel();
        game.add_player("p1", tx, &mut physics);
        game.broadcast_snapshot(&physics);

        let v: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert!(v.get("debug").is_none());
    }
}
