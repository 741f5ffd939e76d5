use kinesis_data::{FrameSnapshot, GenerationReport, Genome, HudState};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Number of generation reports kept for the HTTP API.
pub const HISTORY_CAPACITY: usize = 200;

/// Consumer of rendered frames. Surfaces observe only; nothing they do
/// feeds back into the simulation.
pub trait RenderSurface: Send {
    fn render(&mut self, frame: &FrameSnapshot) -> anyhow::Result<()>;

    fn generation_complete(&mut self, _report: &GenerationReport) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Headless surface: logs the HUD at a fixed frame interval.
pub struct TracingSurface {
    every: u64,
}

impl TracingSurface {
    #[must_use]
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1) }
    }
}

impl RenderSurface for TracingSurface {
    fn render(&mut self, frame: &FrameSnapshot) -> anyhow::Result<()> {
        if frame.frame.is_multiple_of(self.every) {
            let hud = &frame.hud;
            tracing::debug!(
                generation = hud.generation,
                countdown_s = hud.countdown_seconds,
                alive = hud.alive,
                leader = ?hud.leader_fitness,
                record = ?hud.record,
                "HUD"
            );
        }
        Ok(())
    }

    fn generation_complete(&mut self, report: &GenerationReport) -> anyhow::Result<()> {
        if let (Some(best), Some(record)) = (report.best_fitness, report.record) {
            if best >= record {
                tracing::info!(generation = report.generation, record = record, "New record");
            }
        }
        Ok(())
    }
}

/// Most recent values served by the HTTP API.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LatestState {
    pub frame: u64,
    pub hud: HudState,
    pub champion: Option<Genome>,
    pub history: VecDeque<GenerationReport>,
}

pub type SharedState = Arc<Mutex<LatestState>>;

/// Publishes every frame as JSON on a broadcast channel and mirrors the HUD
/// and generation history into shared state.
pub struct BroadcastSurface {
    tx: broadcast::Sender<String>,
    latest: SharedState,
}

impl BroadcastSurface {
    #[must_use]
    pub fn new(tx: broadcast::Sender<String>, latest: SharedState) -> Self {
        Self { tx, latest }
    }

    fn with_latest<F: FnOnce(&mut LatestState)>(&self, f: F) {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut latest);
    }
}

impl RenderSurface for BroadcastSurface {
    fn render(&mut self, frame: &FrameSnapshot) -> anyhow::Result<()> {
        self.with_latest(|latest| {
            latest.frame = frame.frame;
            latest.hud = frame.hud;
        });
        if self.tx.receiver_count() > 0 {
            let json = serde_json::to_string(frame)?;
            let _ = self.tx.send(json);
        }
        Ok(())
    }

    fn generation_complete(&mut self, report: &GenerationReport) -> anyhow::Result<()> {
        self.with_latest(|latest| {
            let improved = match (report.best_fitness, report.record) {
                (Some(best), Some(record)) => best >= record,
                _ => false,
            };
            if improved || latest.champion.is_none() {
                latest.champion = Some(report.champion.clone());
            }
            if latest.history.len() == HISTORY_CAPACITY {
                latest.history.pop_front();
            }
            latest.history.push_back(report.clone());
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinesis_data::CameraState;

    fn frame(n: u64) -> FrameSnapshot {
        FrameSnapshot {
            frame: n,
            generation: 3,
            epoch_elapsed_ms: 500.0,
            creatures: vec![],
            camera: CameraState::default(),
            hud: HudState {
                generation: 3,
                record: Some(2.0),
                countdown_seconds: 3.5,
                alive: 25,
                leader_fitness: Some(1.0),
            },
        }
    }

    fn report(generation: u64, best: f32, record: f32) -> GenerationReport {
        GenerationReport {
            generation,
            best_fitness: Some(best),
            mean_fitness: Some(0.0),
            worst_fitness: Some(0.0),
            record: Some(record),
            culled: 0,
            population_size: 25,
            champion: Genome::default(),
        }
    }

    #[test]
    fn test_broadcast_surface_publishes_frames() {
        let (tx, mut rx) = broadcast::channel(8);
        let latest = SharedState::default();
        let mut surface = BroadcastSurface::new(tx, latest.clone());

        surface.render(&frame(7)).unwrap();

        let json = rx.try_recv().unwrap();
        let decoded: FrameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.frame, 7);
        assert_eq!(latest.lock().unwrap().hud.alive, 25);
    }

    #[test]
    fn test_history_is_bounded() {
        let (tx, _) = broadcast::channel(1);
        let latest = SharedState::default();
        let mut surface = BroadcastSurface::new(tx, latest.clone());
        for g in 0..(HISTORY_CAPACITY as u64 + 5) {
            surface.generation_complete(&report(g, 1.0, 1.0)).unwrap();
        }
        let latest = latest.lock().unwrap();
        assert_eq!(latest.history.len(), HISTORY_CAPACITY);
        assert_eq!(latest.history.front().map(|r| r.generation), Some(5));
        assert!(latest.champion.is_some());
    }
}
