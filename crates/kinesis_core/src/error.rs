//! Error types for the simulation core.
//!
//! Creature-local errors are contained by the population driver; the rest
//! reach the caller of [`crate::Population`].

use thiserror::Error;
use uuid::Uuid;

/// Main error type for kinesis_core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Crossover between genomes whose topology differs.
    #[error("Incompatible genomes: {reason}")]
    IncompatibleGenome { reason: String },

    /// A gene value that would make the physics engine misbehave.
    #[error("Invalid genome parameter `{field}`: {value}")]
    InvalidGenomeParameter { field: String, value: f32 },

    /// A body position became non-finite after a physics step.
    #[error("Physics diverged for creature {creature}")]
    PhysicsStepDivergence { creature: Uuid },

    /// Cohort too small to hold the elites and two parent bands.
    #[error("Population size {size} is below the minimum of {minimum}")]
    PopulationTooSmall { size: usize, minimum: usize },

    /// A structural invariant of the population driver was broken.
    #[error("Population invariant violated: {0}")]
    PopulationInvariant(String),

    /// Configuration rejected by `SimConfig::validate`.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for kinesis_core operations.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    #[must_use]
    pub fn incompatible<S: Into<String>>(reason: S) -> Self {
        Self::IncompatibleGenome {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn invalid_parameter<S: Into<String>>(field: S, value: f32) -> Self {
        Self::InvalidGenomeParameter {
            field: field.into(),
            value,
        }
    }

    #[must_use]
    pub fn invariant<S: Into<String>>(msg: S) -> Self {
        Self::PopulationInvariant(msg.into())
    }

    /// Whether the error is local to a single creature and can be contained
    /// by replacing or culling that creature.
    #[must_use]
    pub fn is_creature_local(&self) -> bool {
        matches!(
            self,
            Self::IncompatibleGenome { .. }
                | Self::InvalidGenomeParameter { .. }
                | Self::PhysicsStepDivergence { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::invalid_parameter("springs[3].stiffness", 0.0);
        assert_eq!(
            err.to_string(),
            "Invalid genome parameter `springs[3].stiffness`: 0"
        );
    }

    #[test]
    fn test_creature_local_classification() {
        assert!(SimError::incompatible("node count 5 != 4").is_creature_local());
        assert!(!SimError::invariant("cohort size 24 != 25").is_creature_local());
        assert!(!SimError::PopulationTooSmall {
            size: 0,
            minimum: 4
        }
        .is_creature_local());
    }
}
