//! Gzip-compressed checkpoints carrying the record and the best genomes of
//! the last completed generation.

use crate::error::{IoError, Result};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use kinesis_core::config::SimConfig;
use kinesis_core::population::{Population, ResumeState};
use kinesis_core::GenomeLogic;
use kinesis_data::Genome;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Format version written by [`Checkpoint::save`].
pub const CHECKPOINT_VERSION: u32 = 1;

/// The lineage worth keeping between runs: the all-time record and the best
/// genomes of the last completed generation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub version: u32,
    /// Generation the resumed cohort will run as.
    pub generation: u64,
    pub record: Option<f32>,
    /// Best first.
    pub elites: Vec<Genome>,
    pub config_fingerprint: String,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    #[must_use]
    pub fn capture(population: &Population) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            generation: population.generation(),
            record: population.record(),
            elites: population.champions().to_vec(),
            config_fingerprint: population.config().fingerprint(),
            saved_at: Utc::now(),
        }
    }

    /// Writes gzip-compressed JSON. The file is written beside the target
    /// and renamed into place so an interrupted save keeps the old one.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let staging = path.with_extension("tmp");
        let json = serde_json::to_vec(self)?;

        let file = File::create(&staging)
            .map_err(|e| IoError::from(e).with_context(format!("creating {staging:?}")))?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(&json)?;
        encoder.finish()?.flush()?;
        std::fs::rename(&staging, path)?;

        tracing::info!(
            path = %path.display(),
            generation = self.generation,
            elites = self.elites.len(),
            "Checkpoint saved"
        );
        Ok(())
    }

    /// Reads and validates a checkpoint. Every elite must be a genome that
    /// could be instantiated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IoError::not_found(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut json = Vec::new();
        GzDecoder::new(BufReader::new(file))
            .read_to_end(&mut json)
            .map_err(|e| IoError::from(e).with_context(format!("decompressing {path:?}")))?;
        let checkpoint: Self = serde_json::from_slice(&json)?;

        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(IoError::UnsupportedVersion {
                found: checkpoint.version,
                expected: CHECKPOINT_VERSION,
            });
        }
        for (i, genome) in checkpoint.elites.iter().enumerate() {
            genome
                .validate()
                .map_err(|e| IoError::validation(format!("elite {i}: {e}")))?;
        }
        Ok(checkpoint)
    }

    #[must_use]
    pub fn matches_config(&self, config: &SimConfig) -> bool {
        self.config_fingerprint == config.fingerprint()
    }

    /// Converts into the state a population resumes from, warning when the
    /// checkpoint was written under different evolution parameters.
    #[must_use]
    pub fn into_resume_state(self, config: &SimConfig) -> ResumeState {
        if !self.matches_config(config) {
            tracing::warn!(
                saved = %self.config_fingerprint,
                current = %config.fingerprint(),
                "Checkpoint was written under a different configuration"
            );
        }
        ResumeState {
            generation: self.generation,
            record: self.record,
            elites: self.elites,
        }
    }
}
