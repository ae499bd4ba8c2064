// ==============================================================================
// net.rs — WEBSOCKET ACCEPT LOOP + CLIENT MESSAGES
// ------------------------------------------------------------------------------
// One task per connection:
//   1) outgoing channel + send-loop task
//   2) kart + camera created, welcome sent
//   3) receive loop: parse, apply, optional direct reply
//   4) cleanup on disconnect
//
// Message handling is synchronous (`apply_client_message`) so it can be
// exercised without sockets.
// ==============================================================================

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::Message;
use uuid::Uuid;

use crate::camera::{CameraConfigPatch, CameraMode, Easing, FollowType, ShakeConfig};
use crate::dynamics::ControlInput;
use crate::physics::PhysicsWorld;
use crate::state::{ServerMessage, SharedGameState};

// ---------------------------------------------
// CLIENT -> SERVER MESSAGES
// ---------------------------------------------
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Input(ControlInput),
    CameraMode {
        mode: CameraMode,
        #[serde(default)]
        follow_type: Option<FollowType>,
    },
    CameraShake(ShakeConfig),
    CameraStopShake,
    CameraTransition {
        #[serde(default)]
        patch: CameraConfigPatch,
        duration: f32,
        #[serde(default)]
        easing: Easing,
    },
    Reset,
    Ping,
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Apply one message for `player_id`; returns a direct reply if any.
pub fn apply_client_message(
    game: &mut SharedGameState,
    physics: &mut PhysicsWorld,
    player_id: &str,
    msg: ClientMessage,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Input(input) => {
            physics.set_input(player_id, input);
            None
        }
        ClientMessage::Ping => Some(ServerMessage::Pong),
        ClientMessage::Reset => match physics.reset_vehicle(player_id) {
            Ok(()) => None,
            Err(e) => Some(ServerMessage::Error { message: e.to_string() }),
        },
        ClientMessage::CameraMode { mode, follow_type } => {
            let camera = game.camera_mut(player_id)?;
            camera.set_mode(mode, follow_type);
            None
        }
        ClientMessage::CameraShake(config) => {
            let camera = game.camera_mut(player_id)?;
            camera.start_shake(config).err().map(|e| ServerMessage::Error { message: e.to_string() })
        }
        ClientMessage::CameraStopShake => {
            let camera = game.camera_mut(player_id)?;
            camera.stop_shake();
            None
        }
        ClientMessage::CameraTransition { patch, duration, easing } => {
            let camera = game.camera_mut(player_id)?;
            camera
                .transition_to(patch, duration, easing)
                .err()
                .map(|e| ServerMessage::Error { message: e.to_string() })
        }
    }
}

pub async fn start_websocket_server(
    listener: TcpListener,
    state: Arc<Mutex<SharedGameState>>,
    physics: Arc<Mutex<PhysicsWorld>>,
) {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "websocket listening");
    }

    loop {
        let (raw, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };

        let state = Arc::clone(&state);
        let physics = Arc::clone(&physics);
        tokio::spawn(async move {
            debug!(%peer, "tcp accepted");
            handle_connection(raw, state, physics).await;
        });
    }
}

async fn handle_connection(raw: TcpStream, state: Arc<Mutex<SharedGameState>>, physics: Arc<Mutex<PhysicsWorld>>) {
    let ws = match accept_async(raw).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(error = %e, "websocket handshake failed");
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Outgoing channel + send loop
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // -------------------------------
    // 2) Kart + camera
    // -------------------------------
    let player_id = Uuid::new_v4().to_string();
    let spawn = {
        let mut phys = physics.lock().await;
        let mut game = state.lock().await;
        game.add_player(&player_id, tx.clone(), &mut phys)
    };
    info!(player = %player_id, slot = spawn.slot, "player connected");

    if let Some(json) = (ServerMessage::Welcome { player_id: player_id.clone(), spawn }).to_json() {
        let _ = tx.send(json);
    }

    // -------------------------------
    // 3) Receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                debug!(player = %player_id, error = %e, "websocket read error");
                break;
            }
        };

        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        let reply = match ClientMessage::from_json(&text) {
            Ok(parsed) => {
                let mut phys = physics.lock().await;
                let mut game = state.lock().await;
                apply_client_message(&mut game, &mut phys, &player_id, parsed)
            }
            Err(e) => {
                debug!(player = %player_id, error = %e, "unparseable client message");
                Some(ServerMessage::Error { message: format!("bad message: {e}") })
            }
        };

        if let Some(json) = reply.and_then(|r| r.to_json()) {
            let _ = tx.send(json);
        }
    }

    // -------------------------------
    // 4) Cleanup
    // -------------------------------
    {
        let mut phys = physics.lock().await;
        let mut game = state.lock().await;
        game.remove_player(&player_id, &mut phys);
    }
    drop(tx);
    send_task.abort();
    info!(player = %player_id, "player disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraConfig;

    #[test]
    fn test_parse_input_with_defaults() {
        let msg = ClientMessage::from_json(r#"{"type":"input","accelerate":1.0,"steer":-0.5,"drift":true}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Input(ControlInput { accelerate: 1.0, brake: 0.0, steer: -0.5, drift_requested: true })
        );
    }

    #[test]
    fn test_parse_camera_messages() {
        let mode = ClientMessage::from_json(r#"{"type":"camera_mode","mode":"follow","follow_type":"orbit"}"#).unwrap();
        assert_eq!(mode, ClientMessage::CameraMode { mode: CameraMode::Follow, follow_type: Some(FollowType::Orbit) });

        let shake = ClientMessage::from_json(r#"{"type":"camera_shake","intensity":0.5}"#).unwrap();
        assert_eq!(shake, ClientMessage::CameraShake(ShakeConfig { intensity: 0.5, ..ShakeConfig::default() }));

        let tr = ClientMessage::from_json(r#"{"type":"camera_transition","patch":{"fov":90.0},"duration":1.0}"#).unwrap();
        match tr {
            ClientMessage::CameraTransition { patch, duration, easing } => {
                assert_eq!(patch.fov, Some(90.0));
                assert_eq!(duration, 1.0);
                assert_eq!(easing, Easing::Linear);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(ClientMessage::from_json(r#"{"type":"teleport"}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_apply_messages() {
        let mut physics = PhysicsWorld::default();
        let mut game = SharedGameState::new(CameraConfig::default(), false);
        let (tx, _rx) = mpsc::unbounded_channel();
        game.add_player("p1", tx, &mut physics);

        assert!(matches!(
            apply_client_message(&mut game, &mut physics, "p1", ClientMessage::Ping),
            Some(ServerMessage::Pong)
        ));

        let bad = ClientMessage::CameraTransition { patch: CameraConfigPatch::default(), duration: -1.0, easing: Easing::Linear };
        assert!(matches!(apply_client_message(&mut game, &mut physics, "p1", bad), Some(ServerMessage::Error { .. })));

        let mode = ClientMessage::CameraMode { mode: CameraMode::Cockpit, follow_type: None };
        assert!(apply_client_message(&mut game, &mut physics, "p1", mode).is_none());
        assert_eq!(game.players["p1"].camera.config().mode, CameraMode::Cockpit);

        // unknown player: reset reports, camera messages are ignored
        assert!(matches!(
            apply_client_message(&mut game, &mut physics, "ghost", ClientMessage::Reset),
            Some(ServerMessage::Error { .. })
        ));
        assert!(apply_client_message(&mut game, &mut physics, "ghost", ClientMessage::CameraStopShake).is_none());
    }
}
