//! Application layer: owns the harness, wires persistence and drives the
//! headless loop.

pub mod camera;
pub mod harness;
pub mod surface;

pub use camera::CameraRig;
pub use harness::Harness;
pub use surface::{BroadcastSurface, LatestState, RenderSurface, SharedState, TracingSurface};

use anyhow::Result;
use kinesis_core::config::SimConfig;
use kinesis_core::physics::PhysicsWorld;
use kinesis_core::{Population, PopulationObserver};
use kinesis_io::{Checkpoint, HistoryLogger, IoError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Resume from and save to this checkpoint.
    pub checkpoint: Option<PathBuf>,
    /// Directory for the generation history log.
    pub log_dir: Option<PathBuf>,
}

pub struct App {
    harness: Harness,
    checkpoint: Option<PathBuf>,
    running: Arc<AtomicBool>,
    stopped: bool,
}

impl App {
    /// Builds the population, resuming from the checkpoint when one exists.
    pub fn new(config: SimConfig, options: AppOptions) -> Result<Self> {
        config.validate()?;

        let observer: Option<Box<dyn PopulationObserver>> = match &options.log_dir {
            Some(dir) => Some(Box::new(HistoryLogger::new_at(dir)?)),
            None => None,
        };

        let resume = match &options.checkpoint {
            Some(path) => match Checkpoint::load(path) {
                Ok(checkpoint) => {
                    tracing::info!(
                        path = %path.display(),
                        generation = checkpoint.generation,
                        record = ?checkpoint.record,
                        "Resuming from checkpoint"
                    );
                    Some(checkpoint.into_resume_state(&config))
                }
                Err(IoError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            },
            None => None,
        };

        let world = PhysicsWorld::new(&config.world);
        let population = match resume {
            Some(state) => Population::resume(config, world, observer, state)?,
            None => Population::new(config, world, observer)?,
        };

        Ok(Self {
            harness: Harness::new(population),
            checkpoint: options.checkpoint,
            running: Arc::new(AtomicBool::new(true)),
            stopped: false,
        })
    }

    /// Flag that stops the frame loop when cleared.
    #[must_use]
    pub fn running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed) && !self.stopped
    }

    #[must_use]
    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    pub fn harness_mut(&mut self) -> &mut Harness {
        &mut self.harness
    }

    /// Runs frames as fast as possible until `generations` more generations
    /// have completed (forever when `None`) or the running flag is cleared,
    /// then shuts down.
    pub fn run_headless(&mut self, generations: Option<u64>) -> Result<()> {
        self.harness
            .add_surface(Box::new(TracingSurface::new(
                self.harness.population().config().harness.log_every_frames,
            )));
        let target = generations.map(|n| self.harness.population().generation() + n);
        tracing::info!(generations = ?generations, "Running headless");

        let outcome = loop {
            if !self.is_running() {
                break Ok(());
            }
            if target.is_some_and(|t| self.harness.population().generation() >= t) {
                break Ok(());
            }
            if let Err(e) = self.harness.frame() {
                break Err(e);
            }
        };
        self.shutdown()?;
        outcome
    }

    pub fn save_checkpoint(&self) -> Result<()> {
        if let Some(path) = &self.checkpoint {
            Checkpoint::capture(self.harness.population()).save(path)?;
        }
        Ok(())
    }

    /// Saves the checkpoint and tears the cohort down. Idempotent.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.running.store(false, Ordering::Relaxed);
        let saved = self.save_checkpoint();
        self.harness.teardown();
        self.stopped = true;
        tracing::info!(
            generation = self.harness.population().generation(),
            record = ?self.harness.population().record(),
            frames = self.harness.frame_count(),
            "Simulation stopped"
        );
        saved
    }
}
