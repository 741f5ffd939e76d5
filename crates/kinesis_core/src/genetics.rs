//! Genetic operators for creature genomes.
//!
//! Random generation, mutation and crossover, plus the validation run before
//! a genome is allowed into the physics world.

use crate::config::{EvolutionConfig, GenomeConfig};
use crate::error::{Result, SimError};
use kinesis_data::{Genome, Point3, SpringGene};
use rand::Rng;
use std::f32::consts::TAU;

/// Genetic operators over a creature body plan.
///
/// Every operator returns a new genome; the receiver is never modified.
pub trait GenomeLogic: Sized {
    /// Random genome with a complete spring graph, sampled from `config`.
    fn new_random_with_rng<R: Rng>(config: &GenomeConfig, rng: &mut R) -> Self;

    /// Copy with each spring's amplitude and phase jittered with probability
    /// `gene_mutation_rate`.
    #[must_use]
    fn with_mutation<R: Rng>(&self, config: &EvolutionConfig, rng: &mut R) -> Self;

    /// Uniform per-gene crossover keeping `self`'s node layout. Fails with
    /// [`SimError::IncompatibleGenome`] when the topologies differ.
    fn crossed_with<R: Rng>(&self, other: &Self, rng: &mut R) -> Result<Self>;

    /// Rejects values the physics world cannot simulate, naming the field.
    fn validate(&self) -> Result<()>;
}

/// Wraps an angle into `[0, 2π)`.
#[must_use]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

fn sample<R: Rng>(range: [f32; 2], rng: &mut R) -> f32 {
    rng.gen_range(range[0]..=range[1])
}

impl GenomeLogic for Genome {
    fn new_random_with_rng<R: Rng>(config: &GenomeConfig, rng: &mut R) -> Self {
        let extent = config.spawn_half_extent;
        let node_positions: Vec<Point3> = (0..config.node_count)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-extent..=extent),
                    rng.gen_range(config.spawn_min_height..=config.spawn_max_height),
                    rng.gen_range(-extent..=extent),
                )
            })
            .collect();

        let mut springs = Vec::with_capacity(Genome::complete_graph_size(config.node_count));
        for a in 0..config.node_count {
            for b in (a + 1)..config.node_count {
                springs.push(SpringGene {
                    a,
                    b,
                    rest_length: sample(config.rest_length, rng),
                    amplitude: sample(config.amplitude, rng),
                    frequency: sample(config.frequency, rng),
                    phase: rng.gen_range(0.0..TAU),
                    stiffness: sample(config.stiffness, rng),
                });
            }
        }

        Self {
            node_positions,
            springs,
        }
    }

    fn with_mutation<R: Rng>(&self, config: &EvolutionConfig, rng: &mut R) -> Self {
        let mut child = self.clone();
        let amplitude_half = config.amplitude_jitter / 2.0;
        let phase_half = config.phase_jitter / 2.0;

        // Only oscillator parameters drift. Node layout and topology stay put.
        for spring in &mut child.springs {
            if rng.gen::<f32>() < config.gene_mutation_rate {
                spring.amplitude =
                    (spring.amplitude + rng.gen_range(-amplitude_half..=amplitude_half)).max(0.0);
                spring.phase = wrap_phase(spring.phase + rng.gen_range(-phase_half..=phase_half));
            }
        }
        child
    }

    fn crossed_with<R: Rng>(&self, other: &Self, rng: &mut R) -> Result<Self> {
        if self.node_count() != other.node_count() {
            return Err(SimError::incompatible(format!(
                "node count {} != {}",
                self.node_count(),
                other.node_count()
            )));
        }
        if self.spring_count() != other.spring_count() {
            return Err(SimError::incompatible(format!(
                "spring count {} != {}",
                self.spring_count(),
                other.spring_count()
            )));
        }
        if let Some((i, (mine, theirs))) = self
            .springs
            .iter()
            .zip(&other.springs)
            .enumerate()
            .find(|(_, (mine, theirs))| !mine.same_endpoints(theirs))
        {
            return Err(SimError::incompatible(format!(
                "spring {i} connects ({}, {}) vs ({}, {})",
                mine.a, mine.b, theirs.a, theirs.b
            )));
        }

        let springs = self
            .springs
            .iter()
            .zip(&other.springs)
            .map(|(mine, theirs)| {
                if rng.gen_bool(0.5) {
                    mine.clone()
                } else {
                    theirs.clone()
                }
            })
            .collect();

        Ok(Self {
            node_positions: self.node_positions.clone(),
            springs,
        })
    }

    fn validate(&self) -> Result<()> {
        let nodes = self.node_count();
        if nodes < 2 {
            return Err(SimError::invalid_parameter("node_positions", nodes as f32));
        }
        if self.spring_count() != Genome::complete_graph_size(nodes) {
            return Err(SimError::invalid_parameter(
                "springs",
                self.spring_count() as f32,
            ));
        }

        for (i, p) in self.node_positions.iter().enumerate() {
            for (axis, value) in [("x", p.x), ("y", p.y), ("z", p.z)] {
                if !value.is_finite() {
                    return Err(SimError::invalid_parameter(
                        format!("node_positions[{i}].{axis}"),
                        value,
                    ));
                }
            }
            if p.y <= 0.0 {
                return Err(SimError::invalid_parameter(
                    format!("node_positions[{i}].y"),
                    p.y,
                ));
            }
        }

        for (i, s) in self.springs.iter().enumerate() {
            if s.a == s.b || s.a >= nodes {
                return Err(SimError::invalid_parameter(
                    format!("springs[{i}].a"),
                    s.a as f32,
                ));
            }
            if s.b >= nodes {
                return Err(SimError::invalid_parameter(
                    format!("springs[{i}].b"),
                    s.b as f32,
                ));
            }
            let checks = [
                ("rest_length", s.rest_length, s.rest_length > 0.0),
                ("amplitude", s.amplitude, s.amplitude >= 0.0),
                ("frequency", s.frequency, true),
                ("phase", s.phase, true),
                ("stiffness", s.stiffness, s.stiffness > 0.0),
            ];
            for (field, value, in_range) in checks {
                if !value.is_finite() || !in_range {
                    return Err(SimError::invalid_parameter(
                        format!("springs[{i}].{field}"),
                        value,
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_random_genome_shape() {
        let config = GenomeConfig::default();
        let genome = Genome::new_random_with_rng(&config, &mut rng());
        assert_eq!(genome.node_count(), 5);
        assert_eq!(genome.spring_count(), 10);
        let pairs: Vec<_> = genome.topology().collect();
        assert_eq!(pairs[0], (0, 1));
        assert_eq!(pairs[3], (0, 4));
        assert_eq!(pairs[9], (3, 4));
        assert!(genome.validate().is_ok());
        for s in &genome.springs {
            assert!((1.5..=2.5).contains(&s.rest_length));
            assert!((150.0..=300.0).contains(&s.stiffness));
            assert!((0.0..TAU).contains(&s.phase));
        }
        for p in &genome.node_positions {
            assert!(p.y >= 0.5 && p.y <= 2.5);
        }
    }

    #[test]
    fn test_mutation_only_touches_oscillators() {
        let genome = Genome::new_random_with_rng(&GenomeConfig::default(), &mut rng());
        let config = EvolutionConfig {
            gene_mutation_rate: 1.0,
            ..Default::default()
        };
        let child = genome.with_mutation(&config, &mut rng());

        assert_eq!(child.node_positions, genome.node_positions);
        for (before, after) in genome.springs.iter().zip(&child.springs) {
            assert!(before.same_endpoints(after));
            assert_eq!(before.rest_length, after.rest_length);
            assert_eq!(before.stiffness, after.stiffness);
            assert_eq!(before.frequency, after.frequency);
            assert!(after.amplitude >= 0.0);
            assert!((0.0..TAU).contains(&after.phase));
        }
    }

    #[test]
    fn test_zero_rate_mutation_is_identity() {
        let genome = Genome::new_random_with_rng(&GenomeConfig::default(), &mut rng());
        let config = EvolutionConfig {
            gene_mutation_rate: 0.0,
            ..Default::default()
        };
        assert_eq!(genome.with_mutation(&config, &mut rng()), genome);
    }

    #[test]
    fn test_crossover_draws_genes_from_parents() {
        let mut r = rng();
        let config = GenomeConfig::default();
        let a = Genome::new_random_with_rng(&config, &mut r);
        let b = Genome::new_random_with_rng(&config, &mut r);
        let child = a.crossed_with(&b, &mut r).unwrap();

        assert_eq!(child.node_positions, a.node_positions);
        for (i, gene) in child.springs.iter().enumerate() {
            assert!(gene == &a.springs[i] || gene == &b.springs[i]);
        }
    }

    #[test]
    fn test_crossover_rejects_mismatched_topology() {
        let mut r = rng();
        let a = Genome::new_random_with_rng(&GenomeConfig::default(), &mut r);
        let smaller = GenomeConfig {
            node_count: 4,
            ..Default::default()
        };
        let b = Genome::new_random_with_rng(&smaller, &mut r);
        assert!(matches!(
            a.crossed_with(&b, &mut r),
            Err(SimError::IncompatibleGenome { .. })
        ));

        let mut swapped = a.clone();
        swapped.springs[2].b = 1;
        assert!(matches!(
            a.crossed_with(&swapped, &mut r),
            Err(SimError::IncompatibleGenome { .. })
        ));
    }

    #[test]
    fn test_validate_names_offending_field() {
        let mut genome = Genome::new_random_with_rng(&GenomeConfig::default(), &mut rng());
        genome.springs[3].stiffness = 0.0;
        match genome.validate() {
            Err(SimError::InvalidGenomeParameter { field, .. }) => {
                assert_eq!(field, "springs[3].stiffness");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let mut sunk = Genome::new_random_with_rng(&GenomeConfig::default(), &mut rng());
        sunk.node_positions[1].y = -0.1;
        assert!(sunk.validate().is_err());
    }

    #[test]
    fn test_wrap_phase() {
        assert_eq!(wrap_phase(0.0), 0.0);
        assert!((wrap_phase(-0.5) - (TAU - 0.5)).abs() < 1e-5);
        assert!((wrap_phase(TAU + 1.0) - 1.0).abs() < 1e-5);
        assert!(wrap_phase(-1e-9) < TAU);
    }
}
