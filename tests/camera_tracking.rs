mod support;

use kart_sim_server::camera::{
    CameraConfig, CameraConfigPatch, CameraEvent, CameraTarget, CameraTrackingController, Easing, ShakeConfig,
};
use kart_sim_server::math::{Point3, Vector3};
use kart_sim_server::physics::PhysicsWorld;
use support::{world_with_kart, DT, KART};

fn camera_on_kart() -> CameraTrackingController {
    let mut cam = CameraTrackingController::new(CameraConfig::default());
    cam.set_target(CameraTarget::new(KART));
    cam
}

fn update(cam: &mut CameraTrackingController, world: &PhysicsWorld, ticks: usize) {
    let scene = world.scene();
    for _ in 0..ticks {
        cam.update(DT, world, &scene);
    }
}

#[test]
fn test_follow_camera_smooths_toward_behind_offset() {
    let world = world_with_kart();
    let kart = world.vehicle_state(KART).unwrap().position;
    let desired = kart + Vector3::new(0.0, 3.0, -8.0);

    let mut cam = camera_on_kart();
    let start = Point3::new(10.0, 10.0, 10.0);
    cam.teleport(start, kart);

    update(&mut cam, &world, 1);
    let p = cam.state().position;

    let before = (start - desired).norm();
    let after = (p - desired).norm();
    assert!(after < before, "camera did not move toward the target offset");
    assert!(after > 1e-3, "camera snapped instead of smoothing");

    // converges given time
    update(&mut cam, &world, 600);
    assert!((cam.state().position - desired).norm() < 0.05);
}

#[test]
fn test_fov_transition_timeline() {
    let world = world_with_kart();
    let mut cam = camera_on_kart();
    cam.drain_events();

    let patch = CameraConfigPatch { fov: Some(90.0), ..CameraConfigPatch::default() };
    cam.transition_to(patch, 1.0, Easing::Linear).unwrap();

    update(&mut cam, &world, 30);
    let fov = cam.state().fov;
    assert!(fov > 75.0 && fov < 90.0, "fov {fov} at half time");

    update(&mut cam, &world, 40);
    assert_eq!(cam.state().fov, 90.0);

    let completed = cam
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, CameraEvent::TransitionCompleted { .. }))
        .count();
    assert_eq!(completed, 1);
}

#[test]
fn test_shake_expires_and_settles() {
    let world = world_with_kart();
    let mut cam = camera_on_kart();
    update(&mut cam, &world, 300);
    cam.drain_events();

    cam.start_shake(ShakeConfig { intensity: 0.5, duration: 0.25, decay: 0.9 }).unwrap();
    update(&mut cam, &world, 1);
    assert!(cam.state().shake.active);

    update(&mut cam, &world, 30);
    let s = cam.state();
    assert!(!s.shake.active);
    assert_eq!(s.shake.offset, [0.0, 0.0, 0.0]);

    let events = cam.drain_events();
    assert!(matches!(events.first(), Some(CameraEvent::ShakeStarted { .. })));
    assert_eq!(events.iter().filter(|e| matches!(e, CameraEvent::ShakeEnded)).count(), 1);
}

#[test]
fn test_wall_between_kart_and_camera_pulls_camera_in() {
    let mut world = world_with_kart();
    // wall across the lane behind the kart, front face at z = -3.75
    world.add_obstacle(Point3::new(0.0, 2.0, -4.0), Vector3::new(6.0, 4.0, 0.25));
    world.step(DT);

    let kart = world.vehicle_state(KART).unwrap().position;
    let mut cam = camera_on_kart();
    cam.drain_events();
    let ticks = 60;
    update(&mut cam, &world, ticks);

    let s = cam.state();
    let wall_face = -3.75;
    assert!(s.position.z > wall_face, "camera went through the wall: {:?}", s.position);
    assert!(s.position.z - wall_face >= 0.3 - 1e-3, "too close to the wall: {:?}", s.position);

    let probe = cam.last_probe().expect("collision probe recorded");
    let hit = probe.hit.expect("wall hit");
    assert!((s.position - kart).norm() <= hit.distance + 1e-4);

    let collisions = cam
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, CameraEvent::CollisionDetected { .. }))
        .count();
    // reported on every occluded update
    assert_eq!(collisions, ticks);
}

#[test]
fn test_lost_target_holds_position() {
    let mut world = world_with_kart();
    let mut cam = camera_on_kart();
    update(&mut cam, &world, 120);
    let held = cam.state().position;

    world.despawn_vehicle(KART);
    update(&mut cam, &world, 60);
    assert!((cam.state().position - held).norm() < 1e-5);
}
