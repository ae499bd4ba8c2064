// Shared fixtures for the integration tests: a real rapier world stepped at 60 Hz.
#![allow(dead_code)]

use kart_sim_server::dynamics::{ControlInput, VehicleState};
use kart_sim_server::math::Point3;
use kart_sim_server::physics::PhysicsWorld;

pub const DT: f32 = 1.0 / 60.0;
pub const KART: &str = "kart";

// World with one default kart on the origin, settled for a few ticks.
pub fn world_with_kart() -> PhysicsWorld {
    let mut world = PhysicsWorld::default();
    world.spawn_vehicle(KART, Point3::origin());
    for _ in 0..5 {
        world.step(DT);
    }
    world
}

// Hold `input` for `ticks` steps, returning the state after every step.
pub fn drive(world: &mut PhysicsWorld, input: ControlInput, ticks: usize) -> Vec<VehicleState> {
    world.set_input(KART, input);
    (0..ticks)
        .map(|_| {
            world.step(DT);
            world.vehicle_state(KART).expect("kart exists")
        })
        .collect()
}

pub fn full_throttle() -> ControlInput {
    ControlInput { accelerate: 1.0, ..ControlInput::default() }
}
