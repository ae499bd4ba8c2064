// ==============================================================================
// collision.rs — KEEP THE CAMERA OUT OF WALLS
// ------------------------------------------------------------------------------
// Ray from the target to the camera's pre-collision position. The nearest hit
// that isn't the target itself, closer than the camera, moves the camera to
//   hit.point + normal * min_distance_from_surface
// with the normal flipped toward the target when the collider reports it
// facing away. If that lands further out than the hit (grazing surfaces), the
// camera is pulled in along the ray instead.
// Query failures read as "no collision".
// ==============================================================================

use tracing::debug;

use crate::math::{Point3, Vector3};
use crate::scene::RaycastService;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionHit {
    pub position: Point3<f32>, // corrected camera position
    pub point: Point3<f32>,    // where the ray hit
    pub normal: Vector3<f32>,
    pub distance: f32,         // target -> hit
}

pub fn resolve_collision(
    scene: &dyn RaycastService,
    target_id: &str,
    target: Point3<f32>,
    camera: Point3<f32>,
    min_distance_from_surface: f32,
) -> Option<CollisionHit> {
    let to_camera = camera - target;
    let dist = to_camera.norm();
    if !(dist > 1e-4) {
        return None;
    }
    let dir = to_camera / dist;

    let hits = match scene.cast_ray(target, dir, dist, Some(target_id)) {
        Ok(hits) => hits,
        Err(e) => {
            debug!(target = target_id, error = %e, "camera collision query failed");
            return None;
        }
    };

    let hit = hits
        .into_iter()
        .find(|h| h.object.as_deref() != Some(target_id) && h.distance < dist)?;

    let mut normal = hit.normal.try_normalize(1e-6).unwrap_or(-dir);
    if normal.dot(&dir) > 0.0 {
        normal = -normal;
    }

    let mut position = hit.point + normal * min_distance_from_surface;
    if (position - target).norm() > hit.distance {
        position = target + dir * (hit.distance - min_distance_from_surface).max(0.0);
    }

    Some(CollisionHit { position, point: hit.point, normal, distance: hit.distance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::scene::RayHit;

    /// Infinite wall at z = wall_z, plus the target's own shell.
    struct Wall {
        wall_z: f32,
    }

    impl RaycastService for Wall {
        fn cast_ray(
            &self,
            origin: Point3<f32>,
            direction: Vector3<f32>,
            max_distance: f32,
            _exclude: Option<&str>,
        ) -> Result<Vec<RayHit>, QueryError> {
            let mut hits = vec![RayHit {
                object: Some("kart".into()),
                point: origin,
                normal: -direction,
                distance: 0.0,
            }];
            if direction.z.abs() > 1e-6 {
                let t = (self.wall_z - origin.z) / direction.z;
                if t > 0.0 && t <= max_distance {
                    // back-face normal, pointing away from the ray origin
                    hits.push(RayHit {
                        object: None,
                        point: origin + direction * t,
                        normal: -Vector3::z(),
                        distance: t,
                    });
                }
            }
            Ok(hits)
        }
    }

    #[test]
    fn test_pulls_camera_in_front_of_wall() {
        let scene = Wall { wall_z: -4.0 };
        let hit = resolve_collision(&scene, "kart", Point3::origin(), Point3::new(0.0, 3.0, -8.0), 0.3).unwrap();

        assert!((hit.position.z - (-3.7)).abs() < 1e-4);
        assert!((hit.position - Point3::origin()).norm() <= hit.distance);
        assert!(hit.normal.z > 0.0);
    }

    #[test]
    fn test_clear_line_of_sight() {
        let scene = Wall { wall_z: -20.0 };
        assert!(resolve_collision(&scene, "kart", Point3::origin(), Point3::new(0.0, 3.0, -8.0), 0.3).is_none());
    }

    #[test]
    fn test_failing_query_means_no_collision() {
        struct Down;
        impl RaycastService for Down {
            fn cast_ray(&self, _: Point3<f32>, _: Vector3<f32>, _: f32, _: Option<&str>) -> Result<Vec<RayHit>, QueryError> {
                Err(QueryError::Backend("gone".into()))
            }
        }
        assert!(resolve_collision(&Down, "kart", Point3::origin(), Point3::new(0.0, 0.0, -8.0), 0.3).is_none());
    }
}
