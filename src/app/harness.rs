use super::camera::CameraRig;
use super::surface::RenderSurface;
use kinesis_core::creature::oscillator_phase;
use kinesis_core::physics::PhysicsWorld;
use kinesis_core::{Creature, Metrics, Population};
use kinesis_data::{
    CreatureFrame, FrameSnapshot, GenerationReport, HudState, Point3, SpringSegment, Stroke,
};
use std::time::Instant;

/// Drives the population one fixed step per frame and turns the result into
/// render snapshots, camera motion and HUD values.
pub struct Harness {
    population: Population,
    camera: CameraRig,
    surfaces: Vec<Box<dyn RenderSurface>>,
    metrics: Metrics,
    frame: u64,
}

impl Harness {
    #[must_use]
    pub fn new(population: Population) -> Self {
        let harness = &population.config().harness;
        let camera = CameraRig::new(harness);
        let metrics = Metrics::new(harness.log_every_frames);
        Self {
            population,
            camera,
            surfaces: Vec::new(),
            metrics,
            frame: 0,
        }
    }

    pub fn add_surface(&mut self, surface: Box<dyn RenderSurface>) {
        self.surfaces.push(surface);
    }

    /// Runs one frame: advance the simulation, move the camera, capture and
    /// hand the snapshot to every surface.
    pub fn frame(&mut self) -> anyhow::Result<FrameSnapshot> {
        let started = Instant::now();
        let dt = self.population.timestep_ms();
        let completed = self.population.advance(dt)?;
        self.frame += 1;

        let leader = self
            .population
            .leader()
            .and_then(|c| c.nodes().first().copied())
            .and_then(|h| self.population.world().node_position(h));
        self.camera.update(leader);

        let snapshot = self.capture();
        for surface in &mut self.surfaces {
            if let Err(e) = surface.render(&snapshot) {
                tracing::warn!(error = %e, "Render surface failed");
            }
        }
        if let Some(report) = completed {
            self.finish_generation(&report);
        }

        self.metrics
            .record_frame(started.elapsed(), self.population.alive_count());
        Ok(snapshot)
    }

    fn finish_generation(&mut self, report: &GenerationReport) {
        self.metrics.record_generation(report);
        for surface in &mut self.surfaces {
            if let Err(e) = surface.generation_complete(report) {
                tracing::warn!(error = %e, "Render surface failed on generation report");
            }
        }
    }

    /// Snapshot of every live creature plus camera and HUD.
    #[must_use]
    pub fn capture(&self) -> FrameSnapshot {
        let clock_ms = self.population.epoch_elapsed_ms();
        let scale = self.population.config().evolution.frequency_scale;
        let world = self.population.world();
        let creatures = self
            .population
            .creatures()
            .iter()
            .filter_map(|c| capture_creature(c, world, clock_ms, scale))
            .collect();

        FrameSnapshot {
            frame: self.frame,
            generation: self.population.generation(),
            epoch_elapsed_ms: clock_ms,
            creatures,
            camera: self.camera.state(),
            hud: self.hud(),
        }
    }

    #[must_use]
    pub fn hud(&self) -> HudState {
        let remaining_s = self.population.time_remaining_ms() / 1000.0;
        HudState {
            generation: self.population.generation(),
            record: self.population.record(),
            countdown_seconds: ((remaining_s * 10.0).round() / 10.0).max(0.0),
            alive: self.population.alive_count(),
            leader_fitness: self.population.leader().map(Creature::fitness),
        }
    }

    /// Destroys the cohort; later frames fail until a new harness is built.
    pub fn teardown(&mut self) {
        self.population.teardown();
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

/// Frame data for one creature. Dead creatures yield nothing; nodes with a
/// missing or non-finite position are dropped along with their springs.
fn capture_creature(
    creature: &Creature,
    world: &PhysicsWorld,
    clock_ms: f32,
    frequency_scale: f32,
) -> Option<CreatureFrame> {
    if !creature.is_alive() {
        return None;
    }
    let positions: Vec<Option<Point3>> = creature
        .node_positions(world)
        .into_iter()
        .map(|p| p.filter(Point3::is_finite))
        .collect();

    let springs = creature
        .genome()
        .springs
        .iter()
        .filter_map(|gene| {
            let from = (*positions.get(gene.a)?)?;
            let to = (*positions.get(gene.b)?)?;
            let phase = oscillator_phase(gene, clock_ms, frequency_scale);
            let oscillation = phase.sin();
            Some(SpringSegment {
                a: gene.a,
                b: gene.b,
                from,
                to,
                phase,
                oscillation,
                stroke: Stroke::from_oscillation(oscillation),
            })
        })
        .collect();

    Some(CreatureFrame {
        id: creature.id(),
        fitness: creature.fitness(),
        nodes: positions.into_iter().flatten().collect(),
        springs,
    })
}
