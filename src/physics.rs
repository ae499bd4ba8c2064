// ==============================================================================
// physics.rs — RAPIER WORLD + PER-TICK VEHICLE ORDER
// ==============================================================================
// Owns every rapier set and the vehicles living in them.
//
// step(dt):
//   1) refresh the query pipeline, probe ground under every chassis
//   2) VehicleDynamicsController::tick (forces into rapier)
//   3) rapier integrates
//   4) finish_tick (hard planar speed clamp)
//   5) safety: reset any chassis that exploded to insane coordinates
//
// The world is also the cameras' read-only `TargetSource` and hands out a
// `RapierScene` for raycasts.
// ==============================================================================

use std::collections::HashMap;

use rapier3d::prelude::*;
use tracing::{debug, info, warn};

use crate::backend::RapierBody;
use crate::camera::{TargetPose, TargetSource};
use crate::config::GROUND_PROBE_LENGTH;
use crate::debug_builders::{build_vehicle_overlay, DebugOverlay};
use crate::dynamics::{ControlInput, VehicleSnapshot, VehicleState, VehicleTuning};
use crate::error::{BackendError, VehicleError};
use crate::ground::probe_ground;
use crate::math::{Point3, Vector3};
use crate::scene::{EntityId, RapierScene};
use crate::vehicle::Vehicle;

const GROUP_GROUND: Group = Group::from_bits_truncate(0b0001);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);

/// Spawn clearance above the ground so the chassis settles instead of popping.
const SPAWN_CLEARANCE: f32 = 0.02;
/// Anything further out than this is treated as an exploded body.
const WORLD_LIMIT: f32 = 1_000.0;

pub struct PhysicsWorld {
    pub gravity: Vector<Real>, // gravity vector
    pub pipeline: PhysicsPipeline, // physics pipeline
    pub island_manager: IslandManager, // manages islands of bodies
    pub broad_phase: DefaultBroadPhase, // broad-phase collision detection
    pub narrow_phase: NarrowPhase, // collision detection
    pub bodies: RigidBodySet, // for rigid bodies
    pub colliders: ColliderSet, // for collision shapes
    pub joints: ImpulseJointSet, // for constraints
    pub multibody_joints: MultibodyJointSet, // for articulated bodies
    pub ccd: CCDSolver, // continuous collision detection
    pub query_pipeline: QueryPipeline, // for raycasting

    tuning: VehicleTuning,
    vehicles: HashMap<EntityId, Vehicle>, // playerId -> vehicle
    body_to_player: HashMap<RigidBodyHandle, EntityId>, // body handle -> playerId
    player_to_body: HashMap<EntityId, RigidBodyHandle>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(VehicleTuning::default())
    }
}

impl PhysicsWorld {
    pub fn new(tuning: VehicleTuning) -> Self {
        let gravity = vector![0.0, -9.81, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // Big static ground box, top surface exactly at y = 0.
        let ground_rb = RigidBodyBuilder::fixed().translation(vector![0.0, -1.0, 0.0]).build();
        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(500.0, 1.0, 500.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.2)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        info!(bodies = bodies.len(), colliders = colliders.len(), "ground inserted");

        let mut query_pipeline = QueryPipeline::new();
        query_pipeline.update(&colliders);

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline,
            tuning: tuning.sanitized(),
            vehicles: HashMap::new(),
            body_to_player: HashMap::new(),
            player_to_body: HashMap::new(),
        }
    }

    pub fn tuning(&self) -> &VehicleTuning {
        &self.tuning
    }

    /// Static box (wall, pillar) that blocks chassis and camera rays alike.
    pub fn add_obstacle(&mut self, center: Point3<f32>, half_extents: Vector3<f32>) -> ColliderHandle {
        let rb = RigidBodyBuilder::fixed().translation(center.coords).build();
        let handle = self.bodies.insert(rb);

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(0.8)
            .restitution(0.0)
            .build();
        let collider = self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        self.query_pipeline.update(&self.colliders);

        debug!(?center, ?half_extents, "obstacle added");
        collider
    }

    // ------------------------------------------------------------------------
    // Vehicles
    // ------------------------------------------------------------------------

    /// Spawn a kart whose chassis bottom sits just above `ground_position`.
    /// An existing vehicle with the same id is replaced.
    pub fn spawn_vehicle(&mut self, id: &str, ground_position: Point3<f32>) -> RigidBodyHandle {
        if self.vehicles.contains_key(id) {
            self.despawn_vehicle(id);
        }

        let t = self.tuning;
        let [hx, hy, hz] = t.chassis_half_extents;
        let volume = 8.0 * hx * hy * hz;
        let density = t.mass / volume; // ρ = m / V

        let center = ground_position + Vector3::y() * (t.ride_height() + SPAWN_CLEARANCE);

        // Rapier damping off: the controller owns drag and angular damping.
        let rb = RigidBodyBuilder::dynamic()
            .translation(center.coords)
            .linear_damping(0.0)
            .angular_damping(0.0)
            .can_sleep(false)
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .active_events(ActiveEvents::empty())
            .density(density)
            .friction(0.0) // grip comes from the controller, not contact friction
            .friction_combine_rule(CoefficientCombineRule::Min)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        self.query_pipeline.update(&self.colliders);

        self.body_to_player.insert(handle, id.to_string());
        self.player_to_body.insert(id.to_string(), handle);
        self.vehicles.insert(id.to_string(), Vehicle::new(handle, t, center));

        info!(player = id, ?center, ?handle, "spawned vehicle");
        handle
    }

    pub fn despawn_vehicle(&mut self, id: &str) -> bool {
        let Some(v) = self.vehicles.remove(id) else {
            return false;
        };
        self.body_to_player.remove(&v.body);
        self.player_to_body.remove(id);
        self.bodies.remove(
            v.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
        self.query_pipeline.update(&self.colliders);

        info!(player = id, "despawned vehicle");
        true
    }

    /// Latest input wins and is held until replaced.
    pub fn set_input(&mut self, id: &str, input: ControlInput) -> bool {
        match self.vehicles.get_mut(id) {
            Some(v) => {
                v.input = input.sanitized();
                true
            }
            None => false,
        }
    }

    /// Back to the spawn point, motion and drift cleared.
    pub fn reset_vehicle(&mut self, id: &str) -> Result<(), VehicleError> {
        let v = self.vehicles.get_mut(id).ok_or(BackendError::Disposed)?;
        let mut body = RapierBody::new(&mut self.bodies, v.body);
        v.controller.reset(&mut body, v.spawn_position, v.spawn_orientation)?;
        v.input = ControlInput::default();
        info!(player = id, "vehicle reset");
        Ok(())
    }

    pub fn vehicle_state(&self, id: &str) -> Option<VehicleState> {
        self.vehicles.get(id).map(|v| v.controller.state())
    }

    pub fn vehicle_snapshots(&self) -> Vec<VehicleSnapshot> {
        let mut out: Vec<_> = self
            .vehicles
            .iter()
            .map(|(id, v)| VehicleSnapshot::from_state(id, &v.controller.state()))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn debug_overlay(&self, id: &str) -> Option<DebugOverlay> {
        let v = self.vehicles.get(id)?;
        Some(build_vehicle_overlay(
            &v.controller.state(),
            v.controller.last_forces(),
            &v.ground,
            v.controller.tuning(),
            GROUND_PROBE_LENGTH,
        ))
    }

    pub fn scene(&self) -> RapierScene<'_> {
        RapierScene {
            bodies: &self.bodies,
            colliders: &self.colliders,
            query: &self.query_pipeline,
            owners: &self.body_to_player,
            handles: &self.player_to_body,
        }
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    fn probe_all_ground(&mut self) {
        self.query_pipeline.update(&self.colliders);

        let contacts: Vec<_> = {
            let scene = self.scene();
            self.vehicles
                .iter()
                .filter_map(|(id, v)| {
                    let center = Point3::from(*self.bodies.get(v.body)?.translation());
                    let ride = v.controller.tuning().ride_height();
                    Some((id.clone(), probe_ground(&scene, id, center, ride, GROUND_PROBE_LENGTH)))
                })
                .collect()
        };

        for (id, contact) in contacts {
            if let Some(v) = self.vehicles.get_mut(&id) {
                v.ground = contact;
            }
        }
    }

    pub fn step(&mut self, dt: Real) {
        let hooks = ();
        let events = ();

        // 1) Ground contact from the last integrated state.
        self.probe_all_ground();

        // 2) Inputs -> forces.
        for (id, v) in self.vehicles.iter_mut() {
            let mut body = RapierBody::new(&mut self.bodies, v.body);
            if let Err(e) = v.controller.tick(&mut body, &v.ground, v.input, dt) {
                warn!(player = %id, error = %e, "vehicle tick skipped");
            }
        }

        // 3) Step physics.
        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );

        // 4) Hard speed clamp + state refresh.
        for (id, v) in self.vehicles.iter_mut() {
            let mut body = RapierBody::new(&mut self.bodies, v.body);
            if let Err(e) = v.controller.finish_tick(&mut body) {
                warn!(player = %id, error = %e, "vehicle finish skipped");
            }
        }

        // 5) Safety: prevent bodies from exploding to insane coordinates.
        for (id, v) in self.vehicles.iter_mut() {
            let Some(pos) = self.bodies.get(v.body).map(|b| *b.translation()) else {
                continue;
            };
            let bad = !pos.iter().all(|c| c.is_finite()) || pos.iter().any(|c| c.abs() > WORLD_LIMIT);
            if bad {
                let mut body = RapierBody::new(&mut self.bodies, v.body);
                match v.controller.reset(&mut body, v.spawn_position, v.spawn_orientation) {
                    Ok(()) => warn!(player = %id, ?pos, "reset exploding body to spawn"),
                    Err(e) => warn!(player = %id, error = %e, "exploding body could not be reset"),
                }
            }
        }
    }
}

impl TargetSource for PhysicsWorld {
    fn target_pose(&self, id: &str) -> Option<TargetPose> {
        let v = self.vehicles.get(id)?;
        let s = v.controller.state();
        let t = v.controller.tuning();

        Some(TargetPose {
            position: s.position,
            orientation: s.orientation,
            velocity: s.linear_velocity,
            steer: s.steer.clamp(-1.0, 1.0),
            speed_ratio: (s.speed / t.max_speed).clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RaycastService;

    const DT: f32 = 1.0 / 60.0;
    const KART_RIDE: f32 = crate::dynamics::KART.chassis_half_extents[1];

    #[test]
    fn test_spawned_kart_settles_grounded() {
        let mut world = PhysicsWorld::default();
        world.spawn_vehicle("p1", Point3::origin());
        for _ in 0..60 {
            world.step(DT);
        }
        let s = world.vehicle_state("p1").unwrap();
        assert!(s.grounded);
        assert!((s.position.y - KART_RIDE).abs() < 0.05);
        assert!(s.speed < 0.05);
    }

    #[test]
    fn test_despawn_removes_body() {
        let mut world = PhysicsWorld::default();
        let handle = world.spawn_vehicle("p1", Point3::origin());
        assert!(world.despawn_vehicle("p1"));
        assert!(!world.bodies.contains(handle));
        assert!(world.vehicle_state("p1").is_none());
        assert!(!world.despawn_vehicle("p1"));
        assert!(world.reset_vehicle("p1").is_err());
    }

    #[test]
    fn test_scene_ray_tags_vehicle_owner() {
        let mut world = PhysicsWorld::default();
        world.spawn_vehicle("p1", Point3::new(0.0, 0.0, 5.0));
        world.step(DT);

        let hits = world
            .scene()
            .cast_ray(Point3::new(0.0, 0.3, 0.0), Vector3::z(), 20.0, None)
            .unwrap();
        assert_eq!(hits.first().and_then(|h| h.object.clone()), Some("p1".to_string()));

        let excluded = world
            .scene()
            .cast_ray(Point3::new(0.0, 0.3, 0.0), Vector3::z(), 20.0, Some("p1"))
            .unwrap();
        assert!(excluded.iter().all(|h| h.object.is_none()));
    }

    #[test]
    fn test_reset_returns_to_spawn() {
        let mut world = PhysicsWorld::default();
        world.spawn_vehicle("p1", Point3::origin());
        world.set_input("p1", ControlInput { accelerate: 1.0, ..Default::default() });
        for _ in 0..60 {
            world.step(DT);
        }
        assert!(world.vehicle_state("p1").unwrap().speed > 1.0);

        world.reset_vehicle("p1").unwrap();
        let s = world.vehicle_state("p1").unwrap();
        assert_eq!(s.speed, 0.0);
        assert!(s.position.z.abs() < 1e-4);
    }

    #[test]
    fn test_target_pose_carries_driver_steer() {
        let mut world = PhysicsWorld::default();
        world.spawn_vehicle("p1", Point3::origin());
        world.set_input("p1", ControlInput { accelerate: 1.0, ..Default::default() });
        for _ in 0..120 {
            world.step(DT);
        }
        world.set_input("p1", ControlInput { accelerate: 1.0, steer: 1.0, ..Default::default() });
        for _ in 0..30 {
            world.step(DT);
        }

        let s = world.vehicle_state("p1").unwrap();
        let pose = world.target_pose("p1").unwrap();
        // wheels are held back by the speed falloff, the camera lean is not
        assert!(s.steering_angle / world.tuning().max_steer_angle < 0.9);
        assert_eq!(pose.steer, 1.0);
        assert!(pose.speed_ratio > 0.3);
    }
}
