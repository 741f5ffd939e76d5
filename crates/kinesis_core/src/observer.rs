//! Notification hooks for code that watches a population run.
//!
//! Observers are boxed trait objects owned by the population, so they must
//! be `Send` for the driver to move between threads.

use crate::error::SimError;
use kinesis_data::GenerationReport;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of the population after one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Generation currently running.
    pub generation: u64,
    /// Epoch clock after this tick.
    pub epoch_elapsed_ms: f32,
    /// Creatures not culled this epoch.
    pub alive: usize,
    /// Live creature with the highest finite fitness.
    pub leader: Option<Uuid>,
    /// Fitness of `leader`.
    pub leader_fitness: Option<f32>,
}

/// Hooks invoked by the population driver. All methods default to no-ops.
pub trait PopulationObserver: Send {
    /// Called after every `advance`, once actuation has been applied.
    fn on_tick(&mut self, _tick: &TickReport) {}

    /// Called once per completed epoch, before the next cohort spawns.
    fn on_generation(&mut self, _report: &GenerationReport) {}

    /// Called when a creature is removed mid-epoch, with the reason.
    fn on_cull(&mut self, _creature: Uuid, _reason: &SimError) {}
}
