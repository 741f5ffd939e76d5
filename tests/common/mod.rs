use kinesis_core::config::SimConfig;
use kinesis_core::physics::PhysicsWorld;
use kinesis_core::population::{Population, ResumeState};
use kinesis_core::{GenomeLogic, PopulationObserver};
use kinesis_data::{GenerationReport, Genome};
use kinesis_lib::app::Harness;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

#[allow(dead_code)]
pub struct PopulationBuilder {
    config: SimConfig,
    resume: ResumeState,
    observer: Option<Box<dyn PopulationObserver>>,
}

#[allow(dead_code)]
impl PopulationBuilder {
    /// Small, short-lived, seeded cohort so tests finish quickly.
    pub fn new() -> Self {
        let mut config = SimConfig::default();
        config.world.seed = Some(7);
        config.evolution.population_size = 6;
        config.evolution.lifespan_ms = 250.0;
        Self {
            config,
            resume: ResumeState::default(),
            observer: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.config.evolution.population_size = size;
        self
    }

    pub fn with_lifespan_ms(mut self, lifespan_ms: f32) -> Self {
        self.config.evolution.lifespan_ms = lifespan_ms;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_elite(mut self, genome: Genome) -> Self {
        self.resume.elites.push(genome);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn PopulationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn build(self) -> Population {
        let world = PhysicsWorld::new(&self.config.world);
        Population::resume(self.config, world, self.observer, self.resume)
            .expect("Failed to create population in test builder")
    }

    pub fn build_harness(self) -> Harness {
        Harness::new(self.build())
    }
}

/// Advances until `generations` epochs have completed and returns their
/// reports in order.
#[allow(dead_code)]
pub fn run_generations(population: &mut Population, generations: usize) -> Vec<GenerationReport> {
    let mut reports = Vec::with_capacity(generations);
    let dt = population.timestep_ms();
    while reports.len() < generations {
        if let Some(report) = population.advance(dt).expect("advance failed") {
            reports.push(report);
        }
    }
    reports
}

#[allow(dead_code)]
pub fn random_genome(seed: u64) -> Genome {
    let config = SimConfig::default();
    Genome::new_random_with_rng(&config.genome, &mut ChaCha8Rng::seed_from_u64(seed))
}

/// Fresh directory under the system temp dir, unique per call.
#[allow(dead_code)]
pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kinesis_{label}_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}
