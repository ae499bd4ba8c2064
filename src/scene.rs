// ==============================================================================
// scene.rs — SCENE RAYCAST SERVICE
// ------------------------------------------------------------------------------
// `RaycastService::cast_ray` returns every hit along a ray, nearest first, with
// the queried entity's own geometry excluded. The rapier implementation wraps
// the `QueryPipeline` the physics world keeps updated each step.
// ==============================================================================

use std::collections::HashMap;

use rapier3d::prelude::{ColliderSet, QueryFilter, QueryPipeline, Ray, RigidBodyHandle, RigidBodySet};

use crate::error::QueryError;
use crate::math::{is_finite_vec, Point3, Vector3};

pub type EntityId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    /// Owning entity, `None` for static scenery (ground, walls).
    pub object: Option<EntityId>,
    pub point: Point3<f32>,
    pub normal: Vector3<f32>,
    pub distance: f32,
}

pub trait RaycastService {
    /// Hits ordered by distance. `exclude` removes that entity's geometry.
    fn cast_ray(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        exclude: Option<&str>,
    ) -> Result<Vec<RayHit>, QueryError>;
}

/// Read-only view over the physics world's query structures.
pub struct RapierScene<'a> {
    pub bodies: &'a RigidBodySet,
    pub colliders: &'a ColliderSet,
    pub query: &'a QueryPipeline,
    pub owners: &'a HashMap<RigidBodyHandle, EntityId>,
    pub handles: &'a HashMap<EntityId, RigidBodyHandle>,
}

impl RaycastService for RapierScene<'_> {
    fn cast_ray(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        exclude: Option<&str>,
    ) -> Result<Vec<RayHit>, QueryError> {
        if !is_finite_vec(&origin.coords) || !is_finite_vec(&direction) {
            return Err(QueryError::DegenerateRay);
        }
        let dir = direction.try_normalize(1e-6).ok_or(QueryError::DegenerateRay)?;
        if !(max_distance > 0.0) {
            return Ok(Vec::new());
        }

        let mut filter = QueryFilter::default();
        if let Some(handle) = exclude.and_then(|id| self.handles.get(id)) {
            filter = filter.exclude_rigid_body(*handle);
        }

        let ray = Ray::new(origin, dir);
        let mut hits = Vec::new();

        self.query.intersections_with_ray(
            self.bodies,
            self.colliders,
            &ray,
            max_distance,
            true,
            filter,
            |collider, hit| {
                let object = self
                    .colliders
                    .get(collider)
                    .and_then(|c| c.parent())
                    .and_then(|body| self.owners.get(&body).cloned());

                hits.push(RayHit {
                    object,
                    point: ray.point_at(hit.time_of_impact),
                    normal: hit.normal,
                    distance: hit.time_of_impact,
                });
                true // keep collecting
            },
        );

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }
}
