//! Fixed-size cohort of creatures and the generation state machine.
//!
//! ```text
//! Spawning ──► Running ──(epoch clock ≥ lifespan)──► Evaluating ──► Spawning
//! ```
//!
//! Every transition happens inside [`Population::advance`]. Within one call
//! the order is fixed: physics step, divergence cull, muscle actuation,
//! fitness snapshot, observer notification, then evaluation and respawn if
//! the epoch is over.

use crate::config::SimConfig;
use crate::creature::{ActuationPlan, Creature};
use crate::error::{Result, SimError};
use crate::genetics::GenomeLogic;
use crate::observer::{PopulationObserver, TickReport};
use crate::physics::PhysicsWorld;
use kinesis_data::{GenerationReport, Genome};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Smallest cohort that can hold two elites and still breed.
pub const MIN_POPULATION_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Spawning,
    Running,
    Evaluating,
}

/// Lineage carried over from an earlier run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResumeState {
    /// Generation number the resumed cohort starts at.
    pub generation: u64,
    pub record: Option<f32>,
    /// Best genomes of the last completed generation, best first.
    pub elites: Vec<Genome>,
}

pub struct Population {
    config: SimConfig,
    world: PhysicsWorld,
    creatures: Vec<Creature>,
    generation: u64,
    record: Option<f32>,
    epoch_elapsed_ms: f32,
    phase: Phase,
    culled_this_epoch: usize,
    champions: Vec<Genome>,
    last_report: Option<GenerationReport>,
    rng: ChaCha8Rng,
    observers: Vec<Box<dyn PopulationObserver>>,
}

impl Population {
    /// Creates a population of random genomes at generation 1 and spawns it.
    pub fn new(
        config: SimConfig,
        world: PhysicsWorld,
        observer: Option<Box<dyn PopulationObserver>>,
    ) -> Result<Self> {
        Self::resume(config, world, observer, ResumeState::default())
    }

    /// Creates a population seeded with checkpointed genomes. Slots beyond
    /// the supplied elites are filled with random genomes.
    pub fn resume(
        config: SimConfig,
        world: PhysicsWorld,
        observer: Option<Box<dyn PopulationObserver>>,
        state: ResumeState,
    ) -> Result<Self> {
        let size = config.evolution.population_size;
        if size < MIN_POPULATION_SIZE {
            return Err(SimError::PopulationTooSmall {
                size,
                minimum: MIN_POPULATION_SIZE,
            });
        }
        config
            .validate()
            .map_err(|e| SimError::InvalidConfig(e.to_string()))?;

        let mut rng = match config.world.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let node_count = config.genome.node_count;
        let offered = state.elites.len();
        let mut genomes: Vec<Genome> = state
            .elites
            .into_iter()
            .filter(|g| g.node_count() == node_count)
            .take(size)
            .collect();
        if genomes.len() < offered.min(size) {
            tracing::warn!(
                dropped = offered - genomes.len(),
                node_count = node_count,
                "Elites with a different node count were dropped"
            );
        }
        while genomes.len() < size {
            genomes.push(Genome::new_random_with_rng(&config.genome, &mut rng));
        }

        let mut population = Self {
            config,
            world,
            creatures: Vec::with_capacity(size),
            generation: state.generation.max(1),
            record: state.record.filter(|r| r.is_finite()),
            epoch_elapsed_ms: 0.0,
            phase: Phase::Spawning,
            culled_this_epoch: 0,
            champions: Vec::new(),
            last_report: None,
            rng,
            observers: observer.into_iter().collect(),
        };
        population.spawn(genomes)?;

        tracing::info!(
            generation = population.generation,
            size = size,
            seed = ?population.config.world.seed,
            "Population spawned"
        );
        Ok(population)
    }

    pub fn add_observer(&mut self, observer: Box<dyn PopulationObserver>) {
        self.observers.push(observer);
    }

    /// Advances the simulation by one frame of `dt_ms` simulated
    /// milliseconds. Returns the report of the generation that completed
    /// during this call, if any.
    pub fn advance(&mut self, dt_ms: f32) -> Result<Option<GenerationReport>> {
        if self.phase != Phase::Running || self.creatures.is_empty() {
            return Err(SimError::invariant(format!(
                "advance called in phase {:?} with {} creatures",
                self.phase,
                self.creatures.len()
            )));
        }

        self.world.step();
        self.epoch_elapsed_ms += dt_ms;
        self.cull_diverged();
        self.actuate();

        let tick = self.tick_report();
        for observer in &mut self.observers {
            observer.on_tick(&tick);
        }

        if self.epoch_elapsed_ms >= self.config.evolution.lifespan_ms {
            return self.finish_epoch().map(Some);
        }
        Ok(None)
    }

    fn cull_diverged(&mut self) {
        for creature in &mut self.creatures {
            if !creature.has_diverged(&self.world) {
                continue;
            }
            let id = creature.id();
            creature.cull(&mut self.world);
            self.culled_this_epoch += 1;
            tracing::warn!(
                creature = %id,
                generation = self.generation,
                "Physics diverged, creature culled"
            );
            let reason = SimError::PhysicsStepDivergence { creature: id };
            for observer in &mut self.observers {
                observer.on_cull(id, &reason);
            }
        }
    }

    fn actuate(&mut self) {
        let clock_ms = self.epoch_elapsed_ms;
        let scale = self.config.evolution.frequency_scale;
        let damping = self.config.body.spring_damping;
        let world = &self.world;

        #[cfg(feature = "parallel")]
        let plans: Vec<Option<ActuationPlan>> = self
            .creatures
            .par_iter()
            .map(|c| c.plan_actuation(world, clock_ms, scale, damping))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let plans: Vec<Option<ActuationPlan>> = self
            .creatures
            .iter()
            .map(|c| c.plan_actuation(world, clock_ms, scale, damping))
            .collect();

        let mode = self.config.evolution.fitness_mode;
        for (creature, plan) in self.creatures.iter_mut().zip(plans) {
            if let Some(plan) = plan {
                creature.apply_actuation(&mut self.world, &plan, mode);
            }
        }
    }

    /// Ranks the cohort, updates the record, breeds the next generation and
    /// respawns. Normally reached through [`Population::advance`].
    ///
    /// Only valid for a live cohort whose epoch clock has reached the
    /// lifespan; anything else is a [`SimError::PopulationInvariant`].
    pub fn evaluate(&mut self) -> Result<GenerationReport> {
        if self.phase != Phase::Running || self.creatures.is_empty() {
            return Err(SimError::invariant(format!(
                "evaluate called in phase {:?} with {} creatures",
                self.phase,
                self.creatures.len()
            )));
        }
        if self.epoch_elapsed_ms < self.config.evolution.lifespan_ms {
            return Err(SimError::invariant(format!(
                "evaluate called at {:.1} ms of a {:.1} ms epoch",
                self.epoch_elapsed_ms, self.config.evolution.lifespan_ms
            )));
        }
        self.finish_epoch()
    }

    fn finish_epoch(&mut self) -> Result<GenerationReport> {
        self.phase = Phase::Evaluating;
        let size = self.config.evolution.population_size;

        let fitness: Vec<f32> = self.creatures.iter().map(Creature::fitness).collect();
        let ranked: Vec<Genome> = rank_by_fitness(&fitness)
            .into_iter()
            .map(|i| self.creatures[i].genome().clone())
            .collect();

        let finite: Vec<f32> = fitness.iter().copied().filter(|f| f.is_finite()).collect();
        let best = finite.iter().copied().reduce(f32::max);
        let worst = finite.iter().copied().reduce(f32::min);
        let mean = (!finite.is_empty()).then(|| finite.iter().sum::<f32>() / finite.len() as f32);

        if let Some(best) = best {
            self.record = Some(self.record.map_or(best, |r| r.max(best)));
        }

        let next = breed_next_generation(&ranked, &self.config, &mut self.rng);
        debug_assert_eq!(next.len(), size);
        if next.len() != size {
            return Err(SimError::invariant(format!(
                "bred {} genomes for a cohort of {size}",
                next.len()
            )));
        }

        let champion = ranked.first().cloned().unwrap_or_default();
        let report = GenerationReport {
            generation: self.generation,
            best_fitness: best,
            mean_fitness: mean,
            worst_fitness: worst,
            record: self.record,
            culled: self.culled_this_epoch,
            population_size: size,
            champion,
        };

        let keep = self.config.evolution.primary_band.min(ranked.len());
        self.champions = ranked.into_iter().take(keep).collect();

        tracing::debug!(
            generation = self.generation,
            best = ?best,
            record = ?self.record,
            "Epoch evaluated"
        );
        for observer in &mut self.observers {
            observer.on_generation(&report);
        }

        self.generation += 1;
        self.spawn(next)?;
        self.last_report = Some(report.clone());
        Ok(report)
    }

    fn spawn(&mut self, genomes: Vec<Genome>) -> Result<()> {
        self.phase = Phase::Spawning;
        self.destroy_cohort();
        self.epoch_elapsed_ms = 0.0;
        self.culled_this_epoch = 0;

        for genome in genomes {
            let spawned = Creature::instantiate(genome, &mut self.world, &self.config.body);
            let creature = match spawned {
                Ok(creature) => creature,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid genome replaced with a random one");
                    let fresh = Genome::new_random_with_rng(&self.config.genome, &mut self.rng);
                    Creature::instantiate(fresh, &mut self.world, &self.config.body)?
                }
            };
            self.creatures.push(creature);
        }

        let size = self.config.evolution.population_size;
        debug_assert_eq!(self.creatures.len(), size);
        if self.creatures.len() != size {
            return Err(SimError::invariant(format!(
                "spawned {} creatures for a cohort of {size}",
                self.creatures.len()
            )));
        }
        self.phase = Phase::Running;
        Ok(())
    }

    fn destroy_cohort(&mut self) {
        for creature in &mut self.creatures {
            creature.destroy(&mut self.world);
        }
        self.creatures.clear();
    }

    /// Destroys every creature. The world is left holding only the ground
    /// and the population refuses further `advance` calls.
    pub fn teardown(&mut self) {
        self.destroy_cohort();
        self.phase = Phase::Spawning;
        tracing::info!(generation = self.generation, "Population torn down");
    }

    fn tick_report(&self) -> TickReport {
        let leader = self.leader();
        TickReport {
            generation: self.generation,
            epoch_elapsed_ms: self.epoch_elapsed_ms,
            alive: self.alive_count(),
            leader: leader.map(Creature::id),
            leader_fitness: leader.map(Creature::fitness),
        }
    }

    /// Live creature with the highest finite fitness. Ties go to the earlier
    /// spawn slot.
    #[must_use]
    pub fn leader(&self) -> Option<&Creature> {
        self.creatures
            .iter()
            .filter(|c| c.is_alive() && c.fitness().is_finite())
            .fold(None, |best: Option<&Creature>, c| match best {
                Some(b) if b.fitness() >= c.fitness() => Some(b),
                _ => Some(c),
            })
    }

    #[must_use]
    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.creatures.iter().filter(|c| c.is_alive()).count()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn record(&self) -> Option<f32> {
        self.record
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn epoch_elapsed_ms(&self) -> f32 {
        self.epoch_elapsed_ms
    }

    /// Simulated milliseconds left in the current epoch, never negative.
    #[must_use]
    pub fn time_remaining_ms(&self) -> f32 {
        (self.config.evolution.lifespan_ms - self.epoch_elapsed_ms).max(0.0)
    }

    #[must_use]
    pub fn timestep_ms(&self) -> f32 {
        self.config.world.timestep_ms
    }

    /// Best genomes of the last completed generation, best first. Empty
    /// until the first evaluation.
    #[must_use]
    pub fn champions(&self) -> &[Genome] {
        &self.champions
    }

    #[must_use]
    pub fn last_report(&self) -> Option<&GenerationReport> {
        self.last_report.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }
}

/// Cohort indices ordered by descending fitness. The sort is stable, so
/// equal fitness keeps spawn order. NaN ranks with negative infinity.
#[must_use]
pub fn rank_by_fitness(fitness: &[f32]) -> Vec<usize> {
    let key = |f: f32| if f.is_nan() { f32::NEG_INFINITY } else { f };
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| key(fitness[b]).total_cmp(&key(fitness[a])));
    order
}

/// Builds the next cohort from genomes ranked best first: elites copied
/// unchanged, the remainder bred by crossover of parents drawn from the top
/// bands, each child mutated with probability `child_mutation_rate`.
pub fn breed_next_generation<R: Rng>(
    ranked: &[Genome],
    config: &SimConfig,
    rng: &mut R,
) -> Vec<Genome> {
    let evolution = &config.evolution;
    let size = evolution.population_size;
    let mut next: Vec<Genome> = ranked
        .iter()
        .take(evolution.elite_count.min(size))
        .cloned()
        .collect();

    if ranked.is_empty() {
        while next.len() < size {
            next.push(Genome::new_random_with_rng(&config.genome, rng));
        }
        return next;
    }

    let primary = evolution.primary_band.min(ranked.len()).max(1);
    let secondary = evolution.secondary_band.min(ranked.len()).max(1);

    while next.len() < size {
        let parent_a = &ranked[rng.gen_range(0..primary)];
        let parent_b = &ranked[rng.gen_range(0..secondary)];
        let child = match parent_a.crossed_with(parent_b, rng) {
            Ok(child) if rng.gen::<f32>() < evolution.child_mutation_rate => {
                child.with_mutation(evolution, rng)
            }
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(error = %e, "Crossover failed, slot re-randomized");
                Genome::new_random_with_rng(&config.genome, rng)
            }
        };
        next.push(child);
    }
    next
}
