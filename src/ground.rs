// ==============================================================================
// ground.rs — CHASSIS GROUND PROBE
// ------------------------------------------------------------------------------
// One downward ray from the chassis center, the queried vehicle excluded.
// The chassis counts as grounded when the surface is within
// `ride_height + probe_length` below it. A failed query reads as airborne.
// ==============================================================================

use tracing::debug;

use crate::math::{up, Point3, Vector3};
use crate::scene::RaycastService;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    pub grounded: bool,
    pub point: Option<Point3<f32>>,
    pub normal: Vector3<f32>,
    pub distance: f32,
}

impl GroundContact {
    pub fn airborne() -> Self {
        Self { grounded: false, point: None, normal: up(), distance: f32::INFINITY }
    }

    pub fn flat(distance: f32) -> Self {
        Self { grounded: true, point: None, normal: up(), distance }
    }
}

pub fn probe_ground(
    scene: &dyn RaycastService,
    entity: &str,
    center: Point3<f32>,
    ride_height: f32,
    probe_length: f32,
) -> GroundContact {
    let max_dist = ride_height + probe_length;

    let hits = match scene.cast_ray(center, -up(), max_dist, Some(entity)) {
        Ok(hits) => hits,
        Err(e) => {
            debug!(entity, error = %e, "ground probe failed; treating as airborne");
            return GroundContact::airborne();
        }
    };

    // first hit that isn't another vehicle
    match hits.into_iter().find(|h| h.object.is_none()) {
        Some(hit) => GroundContact {
            grounded: true,
            point: Some(hit.point),
            normal: hit.normal,
            distance: hit.distance,
        },
        None => GroundContact::airborne(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::scene::RayHit;

    struct FlatFloor;

    impl RaycastService for FlatFloor {
        fn cast_ray(
            &self,
            origin: Point3<f32>,
            _direction: Vector3<f32>,
            max_distance: f32,
            _exclude: Option<&str>,
        ) -> Result<Vec<RayHit>, QueryError> {
            let d = origin.y;
            if d <= max_distance {
                Ok(vec![RayHit {
                    object: None,
                    point: Point3::new(origin.x, 0.0, origin.z),
                    normal: up(),
                    distance: d,
                }])
            } else {
                Ok(Vec::new())
            }
        }
    }

    struct Broken;

    impl RaycastService for Broken {
        fn cast_ray(&self, _: Point3<f32>, _: Vector3<f32>, _: f32, _: Option<&str>) -> Result<Vec<RayHit>, QueryError> {
            Err(QueryError::Backend("offline".into()))
        }
    }

    #[test]
    fn test_grounded_within_reach() {
        let c = probe_ground(&FlatFloor, "car", Point3::new(0.0, 0.32, 0.0), 0.3, 0.2);
        assert!(c.grounded);
        assert!((c.distance - 0.32).abs() < 1e-6);
    }

    #[test]
    fn test_airborne_out_of_reach() {
        let c = probe_ground(&FlatFloor, "car", Point3::new(0.0, 3.0, 0.0), 0.3, 0.2);
        assert!(!c.grounded);
    }

    #[test]
    fn test_query_failure_reads_airborne() {
        let c = probe_ground(&Broken, "car", Point3::origin(), 0.3, 0.2);
        assert_eq!(c, GroundContact::airborne());
    }
}
