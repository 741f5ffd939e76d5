//! rapier3d world holding the ground plane and every creature node.
//!
//! Nodes are free dynamic balls. Muscles are not rapier joints: their damped
//! spring forces are computed by the creature each tick and applied here as
//! external forces, which keeps the oscillating rest length under our control.

use crate::config::{BodyConfig, WorldConfig};
use kinesis_data::Point3;
use rapier3d::prelude::*;

pub type NodeHandle = RigidBodyHandle;

const GROUND_COLLISION_GROUP: Group = Group::GROUP_1;
const CREATURE_COLLISION_GROUP: Group = Group::GROUP_2;

/// Nodes never collide with one another, only with the ground.
fn creature_groups() -> InteractionGroups {
    InteractionGroups::all()
        .with_memberships(CREATURE_COLLISION_GROUP)
        .with_filter(GROUND_COLLISION_GROUP)
}

fn ground_groups() -> InteractionGroups {
    InteractionGroups::all()
        .with_memberships(GROUND_COLLISION_GROUP)
        .with_filter(CREATURE_COLLISION_GROUP)
}

fn to_vector(p: Point3) -> Vector<Real> {
    vector![p.x, p.y, p.z]
}

fn to_point(v: &Vector<Real>) -> Point3 {
    Point3::new(v.x, v.y, v.z)
}

pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    ground: RigidBodyHandle,
    steps: u64,
}

impl PhysicsWorld {
    /// Creates a world with gravity, a fixed timestep and a static ground
    /// whose top face lies at `y = 0`.
    pub fn new(config: &WorldConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.timestep_ms / 1000.0;

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let ground = bodies.insert(RigidBodyBuilder::fixed().build());
        let ground_collider = ColliderBuilder::cuboid(500.0, 5.0, 500.0)
            .translation(vector![0.0, -5.0, 0.0])
            .friction(config.ground_friction)
            .restitution(0.0)
            .collision_groups(ground_groups())
            .build();
        colliders.insert_with_parent(ground_collider, ground, &mut bodies);

        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, config.gravity, 0.0],
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            ground,
            steps: 0,
        }
    }

    /// Advances the world by one fixed timestep.
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
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
        self.steps += 1;
    }

    /// Inserts one creature node: a dynamic ball of the configured mass.
    pub fn spawn_node(&mut self, position: Point3, body: &BodyConfig) -> NodeHandle {
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .linear_damping(body.linear_damping)
            .angular_damping(body.angular_damping)
            .build();
        let handle = self.bodies.insert(rigid_body);
        let collider = ColliderBuilder::ball(body.node_radius)
            .mass(body.node_mass)
            .friction(body.friction)
            .restitution(0.0)
            .collision_groups(creature_groups())
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    /// Removes a node together with its collider. Returns false if the
    /// handle was already gone.
    pub fn remove_node(&mut self, handle: NodeHandle) -> bool {
        if handle == self.ground {
            return false;
        }
        self.bodies
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    #[must_use]
    pub fn node_position(&self, handle: NodeHandle) -> Option<Point3> {
        self.bodies.get(handle).map(|b| to_point(b.translation()))
    }

    #[must_use]
    pub fn node_velocity(&self, handle: NodeHandle) -> Option<Point3> {
        self.bodies.get(handle).map(|b| to_point(b.linvel()))
    }

    /// Moves a node without touching its velocity.
    pub fn set_node_position(&mut self, handle: NodeHandle, position: Point3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_translation(to_vector(position), true);
        }
    }

    /// Replaces the accumulated external force on a node.
    pub fn set_force(&mut self, handle: NodeHandle, force: Point3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.reset_forces(false);
            body.add_force(to_vector(force), true);
        }
    }

    /// Number of creature bodies, ground excluded.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len().saturating_sub(1)
    }

    #[must_use]
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    #[must_use]
    pub fn timestep_ms(&self) -> f32 {
        self.integration_parameters.dt * 1000.0
    }

    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

/// Force exerted on endpoint `b` by a damped spring between `a` and `b`.
/// Endpoint `a` receives the negation.
///
/// Coincident endpoints have no defined direction and yield zero force.
#[must_use]
pub fn spring_force(
    pos_a: Point3,
    pos_b: Point3,
    vel_a: Point3,
    vel_b: Point3,
    rest_length: f32,
    stiffness: f32,
    damping: f32,
) -> Point3 {
    let dx = pos_b.x - pos_a.x;
    let dy = pos_b.y - pos_a.y;
    let dz = pos_b.z - pos_a.z;
    let length = (dx * dx + dy * dy + dz * dz).sqrt();
    if length <= f32::EPSILON {
        return Point3::default();
    }
    let (ux, uy, uz) = (dx / length, dy / length, dz / length);
    let stretch = -stiffness * (length - rest_length);
    Point3::new(
        ux * stretch - damping * (vel_b.x - vel_a.x),
        uy * stretch - damping * (vel_b.y - vel_a.y),
        uz * stretch - damping * (vel_b.z - vel_a.z),
    )
}
