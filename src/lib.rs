//! Authoritative kart simulation server: arcade vehicle dynamics on rapier,
//! per-player tracking cameras, websocket snapshots.

pub mod backend;
pub mod camera;
pub mod config;
pub mod debug_builders;
pub mod dynamics;
pub mod error;
pub mod ground;
pub mod math;
pub mod net;
pub mod physics;
pub mod scene;
pub mod spawn;
pub mod state;
pub mod vehicle;
