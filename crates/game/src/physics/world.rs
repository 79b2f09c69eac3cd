use glam::Vec3;
use rapier3d::parry::query::{PointQuery, ShapeCastOptions, ShapeCastStatus};
use rapier3d::parry::shape::Ball;
use rapier3d::prelude::*;

use crate::map::Obstacle;

use super::sweep::{SweepHit, SweepQuery};

/// Static level geometry held in rapier's collision structures. Nothing here
/// is simulated; the pipeline is stepped once so the broad phase knows about
/// every collider.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    pub fn from_obstacles(obstacles: &[Obstacle]) -> Self {
        let mut world = Self::new();
        for obstacle in obstacles {
            world.add_static_box(obstacle.center, obstacle.half_extents);
        }
        world.step();
        world
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn add_static_box(&mut self, position: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(Vector::new(position.x, position.y, position.z))
            .build();
        self.colliders.insert(collider)
    }

    /// Refreshes the broad phase after colliders were added.
    pub fn step(&mut self) {
        self.pipeline.step(
            Vector::new(0.0, 0.0, 0.0),
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    /// Direction from `handle`'s surface toward `center`. Used when a sweep
    /// starts inside an obstacle, where the cast direction says nothing
    /// about which side the sphere is on.
    fn escape_normal(&self, handle: ColliderHandle, center: Vec3) -> Option<Vec3> {
        let collider = self.colliders.get(handle)?;
        let projection = collider.shape().project_point(
            collider.position(),
            Vector::new(center.x, center.y, center.z),
            false,
        );
        let surface = Vec3::new(projection.point.x, projection.point.y, projection.point.z);
        let outward = if projection.is_inside {
            surface - center
        } else {
            center - surface
        };
        let normal = outward.normalize_or_zero();
        (normal != Vec3::ZERO).then_some(normal)
    }

    fn query_pipeline(&self) -> QueryPipeline<'_> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            QueryFilter::default(),
        )
    }
}

impl SweepQuery for PhysicsWorld {
    fn sweep_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<SweepHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let query = self.query_pipeline();
        let shape = Ball::new(radius);
        let pose = Pose::from_parts(Vector::new(origin.x, origin.y, origin.z), Rotation::IDENTITY);
        let options = ShapeCastOptions {
            max_time_of_impact: max_distance,
            target_distance: 0.0,
            stop_at_penetration: true,
            compute_impact_geometry_on_penetration: true,
        };

        let (handle, hit) =
            query.cast_shape(&pose, Vector::new(dir.x, dir.y, dir.z), &shape, options)?;

        if matches!(hit.status, ShapeCastStatus::PenetratingOrWithinTargetDist) {
            return Some(SweepHit {
                distance: 0.0,
                normal: self.escape_normal(handle, origin).unwrap_or(-dir),
            });
        }

        let mut normal = Vec3::new(hit.normal1.x, hit.normal1.y, hit.normal1.z);
        if normal.dot(dir) > 0.0 {
            normal = -normal;
        }

        Some(SweepHit {
            distance: hit.time_of_impact,
            normal: normal.normalize_or_zero(),
        })
    }
}
