use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use kart_sim_server::config::{ServerConfig, TuningFile};
use kart_sim_server::net::start_websocket_server;
use kart_sim_server::physics::PhysicsWorld;
use kart_sim_server::state::SharedGameState;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = ServerConfig::from_env().context("reading server config")?;
    let tuning = TuningFile::load_optional(config.tuning_path.as_deref()).context("loading tuning file")?;
    info!(
        addr = %config.bind_addr,
        tick_hz = config.tick_hz,
        debug_overlay = config.debug_overlay,
        "starting kart sim server"
    );

    let state = Arc::new(Mutex::new(SharedGameState::new(tuning.camera, config.debug_overlay)));
    let physics = Arc::new(Mutex::new(PhysicsWorld::new(tuning.vehicle)));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    tokio::spawn(start_websocket_server(listener, Arc::clone(&state), Arc::clone(&physics)));

    // Fixed timestep
    let dt = config.dt();
    let mut ticker = interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let mut phys = physics.lock().await;
        let mut game = state.lock().await;

        // Step physics, then cameras read the new poses
        phys.step(dt);
        game.update_cameras(dt, &phys);

        // Advance tick + broadcast snapshot
        game.tick += 1;
        game.broadcast_snapshot(&phys);
    }
}
