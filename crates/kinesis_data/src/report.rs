use crate::genome::Genome;
use serde::{Deserialize, Serialize};

/// Summary of one completed epoch, produced by the evaluation step.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenerationReport {
    /// The generation that was just evaluated.
    pub generation: u64,
    /// Best finite fitness of the cohort, `None` if every creature diverged.
    pub best_fitness: Option<f32>,
    pub mean_fitness: Option<f32>,
    pub worst_fitness: Option<f32>,
    /// All-time record after this evaluation.
    pub record: Option<f32>,
    /// Creatures culled during the epoch because their physics diverged.
    pub culled: usize,
    pub population_size: usize,
    /// Genome of the highest-ranked creature.
    pub champion: Genome,
}
