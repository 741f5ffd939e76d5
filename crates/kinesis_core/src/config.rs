//! Configuration management for simulation parameters.
//!
//! Strongly-typed configuration structures mapping to `kinesis.toml`. Every
//! section has a `Default` with the reference constants, so a file only needs
//! to list the values it overrides.
//!
//! ## Example `kinesis.toml`
//!
//! ```toml
//! [world]
//! seed = 42
//!
//! [genome]
//! node_count = 6
//!
//! [evolution]
//! population_size = 40
//! lifespan_ms = 6000.0
//! fitness_mode = "PeakExcursion"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Physics world parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Vertical acceleration (negative is down).
    pub gravity: f32,
    /// Fixed physics timestep in milliseconds; one step per frame.
    pub timestep_ms: f32,
    pub ground_friction: f32,
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: -9.82,
            timestep_ms: 1000.0 / 60.0,
            ground_friction: 0.9,
            seed: None,
        }
    }
}

/// Per-node body parameters shared by every creature.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    pub node_mass: f32,
    pub node_radius: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub friction: f32,
    /// Damping coefficient of every muscle spring.
    pub spring_damping: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            node_mass: 1.0,
            node_radius: 0.25,
            linear_damping: 0.3,
            angular_damping: 0.3,
            friction: 0.9,
            spring_damping: 1.0,
        }
    }
}

/// Ranges used when drawing random genomes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenomeConfig {
    pub node_count: usize,
    /// Nodes spawn with x and z in `[-spawn_half_extent, spawn_half_extent]`.
    pub spawn_half_extent: f32,
    pub spawn_min_height: f32,
    pub spawn_max_height: f32,
    pub rest_length: [f32; 2],
    pub amplitude: [f32; 2],
    pub frequency: [f32; 2],
    pub stiffness: [f32; 2],
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            node_count: 5,
            spawn_half_extent: 1.5,
            spawn_min_height: 0.5,
            spawn_max_height: 2.5,
            rest_length: [1.5, 2.5],
            amplitude: [0.5, 1.5],
            frequency: [2.0, 7.0],
            stiffness: [150.0, 300.0],
        }
    }
}

/// How a creature's fitness is derived from the forward position of its
/// reference node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FitnessMode {
    /// Position at the latest tick. Drifting back after a lunge costs fitness.
    #[default]
    Snapshot,
    /// Furthest forward position reached during the epoch.
    PeakExcursion,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    /// Duration of one epoch in simulated milliseconds.
    pub lifespan_ms: f32,
    /// Genomes carried over unchanged into the next generation.
    pub elite_count: usize,
    /// First parent is drawn uniformly from this many top-ranked genomes.
    pub primary_band: usize,
    /// Second parent is drawn uniformly from this many top-ranked genomes.
    pub secondary_band: usize,
    /// Probability that a crossover child is mutated.
    pub child_mutation_rate: f32,
    /// Probability that a single spring gene is perturbed by a mutation.
    pub gene_mutation_rate: f32,
    /// Full width of the zero-mean amplitude perturbation.
    pub amplitude_jitter: f32,
    /// Full width of the zero-mean phase perturbation.
    pub phase_jitter: f32,
    /// Converts the epoch clock (ms) into oscillator time.
    pub frequency_scale: f32,
    pub fitness_mode: FitnessMode,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 25,
            lifespan_ms: 4000.0,
            elite_count: 2,
            primary_band: 5,
            secondary_band: 10,
            child_mutation_rate: 0.2,
            gene_mutation_rate: 0.2,
            amplitude_jitter: 0.2,
            phase_jitter: 0.5,
            frequency_scale: 0.001,
            fitness_mode: FitnessMode::Snapshot,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    pub target_fps: u64,
    /// Camera position relative to the tracked creature.
    pub camera_offset: [f32; 3],
    /// Fraction of the remaining distance the camera covers each frame.
    pub camera_smoothing: f32,
    pub log_every_frames: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            camera_offset: [0.0, 4.0, 10.0],
            camera_smoothing: 0.05,
            log_every_frames: 240,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub body: BodyConfig,
    pub genome: GenomeConfig,
    pub evolution: EvolutionConfig,
    pub harness: HarnessConfig,
}

/// Finite, ordered, and narrow enough that sampling it cannot overflow.
fn valid_range(range: [f32; 2]) -> bool {
    range[0].is_finite()
        && range[1].is_finite()
        && range[0] <= range[1]
        && (range[1] - range[0]).is_finite()
}

impl SimConfig {
    /// Validates all configuration parameters.
    ///
    /// # Validation Rules
    /// - Timestep, masses, radii and lifespan must be positive
    /// - Spawn heights must keep every node above the ground
    /// - Rest length and stiffness ranges must be strictly positive
    /// - Probabilities must be in `[0.0, 1.0]`
    /// - Population must hold the elites and at least two parents
    pub fn validate(&self) -> anyhow::Result<()> {
        // World validation
        anyhow::ensure!(self.world.gravity.is_finite(), "Gravity must be finite");
        anyhow::ensure!(
            self.world.timestep_ms > 0.0 && self.world.timestep_ms <= 100.0,
            "Timestep must be in (0, 100] ms"
        );
        anyhow::ensure!(
            self.world.ground_friction >= 0.0,
            "Ground friction must be non-negative"
        );

        // Body validation
        anyhow::ensure!(self.body.node_mass > 0.0, "Node mass must be positive");
        anyhow::ensure!(self.body.node_radius > 0.0, "Node radius must be positive");
        anyhow::ensure!(
            self.body.linear_damping >= 0.0 && self.body.angular_damping >= 0.0,
            "Damping must be non-negative"
        );
        anyhow::ensure!(
            self.body.spring_damping >= 0.0,
            "Spring damping must be non-negative"
        );

        // Genome validation
        anyhow::ensure!(
            self.genome.node_count >= 2,
            "A creature needs at least 2 nodes"
        );
        anyhow::ensure!(
            self.genome.node_count <= 32,
            "Node count too large (max 32)"
        );
        anyhow::ensure!(
            valid_range([-self.genome.spawn_half_extent, self.genome.spawn_half_extent]),
            "Spawn half extent must be finite and non-negative"
        );
        anyhow::ensure!(
            self.genome.spawn_min_height > 0.0,
            "Spawn min height must be above the ground"
        );
        anyhow::ensure!(
            valid_range([self.genome.spawn_min_height, self.genome.spawn_max_height]),
            "Spawn height range is malformed"
        );
        for (name, range) in [
            ("rest_length", self.genome.rest_length),
            ("amplitude", self.genome.amplitude),
            ("frequency", self.genome.frequency),
            ("stiffness", self.genome.stiffness),
        ] {
            anyhow::ensure!(valid_range(range), "Genome range `{name}` is malformed");
        }
        anyhow::ensure!(
            self.genome.rest_length[0] > 0.0,
            "Rest length range must be positive"
        );
        anyhow::ensure!(
            self.genome.amplitude[0] >= 0.0,
            "Amplitude range must be non-negative"
        );
        anyhow::ensure!(
            self.genome.stiffness[0] > 0.0,
            "Stiffness range must be positive"
        );

        // Evolution validation
        anyhow::ensure!(
            self.evolution.population_size >= crate::population::MIN_POPULATION_SIZE,
            "Population size must be at least {}",
            crate::population::MIN_POPULATION_SIZE
        );
        anyhow::ensure!(
            self.evolution.population_size <= 1024,
            "Population size too large (max 1024)"
        );
        anyhow::ensure!(
            self.evolution.lifespan_ms > 0.0,
            "Lifespan must be positive"
        );
        anyhow::ensure!(
            self.evolution.elite_count < self.evolution.population_size,
            "Elite count must leave room for offspring"
        );
        anyhow::ensure!(
            self.evolution.primary_band > 0 && self.evolution.secondary_band > 0,
            "Parent bands must be positive"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.evolution.child_mutation_rate),
            "Child mutation rate must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.evolution.gene_mutation_rate),
            "Gene mutation rate must be in [0.0, 1.0]"
        );
        for (name, jitter) in [
            ("amplitude_jitter", self.evolution.amplitude_jitter),
            ("phase_jitter", self.evolution.phase_jitter),
        ] {
            anyhow::ensure!(
                jitter.is_finite() && jitter >= 0.0,
                "Mutation `{name}` must be finite and non-negative"
            );
        }
        anyhow::ensure!(
            self.evolution.frequency_scale.is_finite(),
            "Frequency scale must be finite"
        );

        // Harness validation
        anyhow::ensure!(self.harness.target_fps > 0, "Target FPS must be positive");
        anyhow::ensure!(
            self.harness.target_fps <= 240,
            "Target FPS too high (max 240)"
        );
        anyhow::ensure!(
            self.harness.camera_smoothing > 0.0 && self.harness.camera_smoothing <= 1.0,
            "Camera smoothing must be in (0.0, 1.0]"
        );

        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist. A file that exists but fails to parse or validate
    /// is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_toml(&content)?;
                tracing::info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Hash of every parameter that shapes evolution. Checkpoints store it
    /// so a resume under different physics can be flagged.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.body).as_bytes());
        hasher.update(format!("{:?}", self.genome).as_bytes());
        hasher.update(format!("{:?}", self.evolution).as_bytes());
        hasher.update(self.world.gravity.to_bits().to_le_bytes());
        hasher.update(self.world.timestep_ms.to_bits().to_le_bytes());
        hex::encode(hasher.finalize())
    }
}
