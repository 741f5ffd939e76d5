//! # Kinesis Core
//!
//! The simulation engine for Kinesis: soft-body creatures built from point
//! masses and oscillating springs, evolved by a genetic algorithm to walk.
//!
//! This crate contains:
//! - Genetic operators over spring/node genomes (random, mutation, crossover)
//! - A rapier3d-backed physics world and the creatures living in it
//! - The population driver (spawn, run, evaluate, respawn)
//! - Configuration, error types, metrics and structured logging
//!
//! ## Architecture
//!
//! The population owns its physics world and every creature in it. A single
//! call to [`Population::advance`] steps the world, actuates every creature,
//! snapshots fitness and, at the end of an epoch, evaluates and respawns. No
//! rendering concern lives here; observers receive per-tick and per-generation
//! reports through [`PopulationObserver`].
//!
//! ## Example
//!
//! ```no_run
//! use kinesis_core::config::SimConfig;
//! use kinesis_core::physics::PhysicsWorld;
//! use kinesis_core::population::Population;
//!
//! let mut config = SimConfig::default();
//! config.world.seed = Some(42);
//! let world = PhysicsWorld::new(&config.world);
//! let mut population = Population::new(config, world, None)?;
//! while population.generation() < 3 {
//!     population.advance(population.timestep_ms())?;
//! }
//! # Ok::<(), kinesis_core::SimError>(())
//! ```

/// Configuration management for simulation parameters
pub mod config;
/// A live physics instantiation of a genome
pub mod creature;
/// Error taxonomy of the simulation core
pub mod error;
/// Random generation, mutation and crossover of genomes
pub mod genetics;
/// Frame counters and structured logging setup
pub mod metrics;
/// Per-tick and per-generation notification hooks
pub mod observer;
/// rapier3d world wrapper: ground, node bodies, spring forces
pub mod physics;
/// Cohort ownership and the generation state machine
pub mod population;

pub use creature::Creature;
pub use error::{Result, SimError};
pub use genetics::GenomeLogic;
pub use kinesis_data::{GenerationReport, Genome, Point3, SpringGene};
pub use metrics::{init_logging, Metrics};
pub use observer::{PopulationObserver, TickReport};
pub use population::{Phase, Population};
