//! Creatures: genomes living in the physics world as node bodies driven by
//! oscillating spring muscles.

use crate::config::{BodyConfig, FitnessMode};
use crate::error::Result;
use crate::genetics::{wrap_phase, GenomeLogic};
use crate::physics::{spring_force, NodeHandle, PhysicsWorld};
use kinesis_data::{Genome, Point3, SpringGene};
use uuid::Uuid;

/// Shortest effective rest length a muscle may oscillate down to.
pub const MIN_REST_LENGTH: f32 = 0.05;

/// Oscillator argument of a muscle at `clock_ms`, wrapped into `[0, 2π)`.
#[must_use]
pub fn oscillator_phase(gene: &SpringGene, clock_ms: f32, frequency_scale: f32) -> f32 {
    wrap_phase(clock_ms * frequency_scale * gene.frequency + gene.phase)
}

/// Rest length a muscle is driven toward at `clock_ms`.
#[must_use]
pub fn effective_rest_length(gene: &SpringGene, clock_ms: f32, frequency_scale: f32) -> f32 {
    let offset = oscillator_phase(gene, clock_ms, frequency_scale).sin();
    (gene.rest_length + offset * gene.amplitude).max(MIN_REST_LENGTH)
}

/// Net muscle force on every node of one creature for a single tick,
/// indexed like the genome's nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuationPlan {
    pub forces: Vec<Point3>,
}

/// A genome instantiated as bodies inside a [`PhysicsWorld`].
#[derive(Debug)]
pub struct Creature {
    id: Uuid,
    genome: Genome,
    nodes: Vec<NodeHandle>,
    fitness: f32,
    peak: f32,
    alive: bool,
    diverged: bool,
}

impl Creature {
    /// Validates `genome` and inserts one body per node. Nothing is inserted
    /// when validation fails.
    pub fn instantiate(
        genome: Genome,
        world: &mut PhysicsWorld,
        body: &BodyConfig,
    ) -> Result<Self> {
        genome.validate()?;
        let nodes = genome
            .node_positions
            .iter()
            .map(|&p| world.spawn_node(p, body))
            .collect();

        Ok(Self {
            id: Uuid::new_v4(),
            genome,
            nodes,
            fitness: 0.0,
            peak: f32::NEG_INFINITY,
            alive: true,
            diverged: false,
        })
    }

    /// Computes muscle forces from the current world state without touching
    /// it, so plans for a whole cohort can be built in parallel.
    #[must_use]
    pub fn plan_actuation(
        &self,
        world: &PhysicsWorld,
        clock_ms: f32,
        frequency_scale: f32,
        damping: f32,
    ) -> Option<ActuationPlan> {
        if !self.alive {
            return None;
        }
        let states: Vec<(Point3, Point3)> = self
            .nodes
            .iter()
            .map(|&h| Some((world.node_position(h)?, world.node_velocity(h)?)))
            .collect::<Option<_>>()?;

        let mut forces = vec![Point3::default(); self.nodes.len()];
        for gene in &self.genome.springs {
            let (pos_a, vel_a) = states[gene.a];
            let (pos_b, vel_b) = states[gene.b];
            let f = spring_force(
                pos_a,
                pos_b,
                vel_a,
                vel_b,
                effective_rest_length(gene, clock_ms, frequency_scale),
                gene.stiffness,
                damping,
            );
            forces[gene.b] = forces[gene.b].offset(f);
            forces[gene.a] = forces[gene.a].offset(Point3::new(-f.x, -f.y, -f.z));
        }
        Some(ActuationPlan { forces })
    }

    /// Applies a plan built by [`Creature::plan_actuation`] and snapshots
    /// fitness from the reference node.
    pub fn apply_actuation(
        &mut self,
        world: &mut PhysicsWorld,
        plan: &ActuationPlan,
        mode: FitnessMode,
    ) {
        if !self.alive {
            return;
        }
        for (&handle, &force) in self.nodes.iter().zip(&plan.forces) {
            world.set_force(handle, force);
        }
        self.snapshot_fitness(world, mode);
    }

    fn snapshot_fitness(&mut self, world: &PhysicsWorld, mode: FitnessMode) {
        let Some(x) = self
            .nodes
            .first()
            .and_then(|&h| world.node_position(h))
            .map(|p| p.x)
            .filter(|x| x.is_finite())
        else {
            return;
        };
        self.peak = self.peak.max(x);
        self.fitness = match mode {
            FitnessMode::Snapshot => x,
            FitnessMode::PeakExcursion => self.peak,
        };
    }

    /// Whether any node left the world or holds a non-finite position or
    /// velocity.
    #[must_use]
    pub fn has_diverged(&self, world: &PhysicsWorld) -> bool {
        self.alive
            && self.nodes.iter().any(|&h| {
                match (world.node_position(h), world.node_velocity(h)) {
                    (Some(p), Some(v)) => !p.is_finite() || !v.is_finite(),
                    _ => true,
                }
            })
    }

    /// Removes every body of this creature. Idempotent.
    pub fn destroy(&mut self, world: &mut PhysicsWorld) {
        for handle in self.nodes.drain(..) {
            world.remove_node(handle);
        }
        self.alive = false;
    }

    /// Destroys a creature whose physics diverged and pins its fitness to
    /// negative infinity so it ranks last.
    pub fn cull(&mut self, world: &mut PhysicsWorld) {
        self.destroy(world);
        self.diverged = true;
        self.fitness = f32::NEG_INFINITY;
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[must_use]
    pub fn has_been_culled(&self) -> bool {
        self.diverged
    }

    /// Current node positions; `None` for a node whose body is missing.
    #[must_use]
    pub fn node_positions(&self, world: &PhysicsWorld) -> Vec<Option<Point3>> {
        self.nodes.iter().map(|&h| world.node_position(h)).collect()
    }

    #[cfg(test)]
    pub(crate) fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }
}
