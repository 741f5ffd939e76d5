//! Frame metrics and logging setup for the simulation.
//!
//! Provides structured logging and counters for monitoring frame pacing and
//! evolutionary progress.

use kinesis_data::GenerationReport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Frame and generation counters.
pub struct Metrics {
    frame_count: AtomicU64,
    generation_count: AtomicU64,
    culled_total: AtomicU64,
    alive: AtomicU64,
    log_every: u64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(240)
    }
}

impl Metrics {
    /// Creates a collector that logs a frame summary every `log_every`
    /// frames. Zero disables frame summaries.
    #[must_use]
    pub fn new(log_every: u64) -> Self {
        Self {
            frame_count: AtomicU64::new(0),
            generation_count: AtomicU64::new(0),
            culled_total: AtomicU64::new(0),
            alive: AtomicU64::new(0),
            log_every,
            start_time: Instant::now(),
        }
    }

    /// Records a completed frame with its wall-clock duration.
    pub fn record_frame(&self, duration: Duration, alive: usize) {
        let frame = self.frame_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.alive.store(alive as u64, Ordering::Relaxed);

        if self.log_every > 0 && frame.is_multiple_of(self.log_every) {
            tracing::info!(
                frame = frame,
                alive = alive,
                duration_us = duration.as_micros() as u64,
                uptime_s = self.elapsed().as_secs(),
                "Simulation frame"
            );
        }
    }

    /// Counts a completed generation and logs its summary.
    pub fn record_generation(&self, report: &GenerationReport) {
        self.generation_count.fetch_add(1, Ordering::Relaxed);
        self.culled_total
            .fetch_add(report.culled as u64, Ordering::Relaxed);
        tracing::info!(
            generation = report.generation,
            best = ?report.best_fitness,
            mean = ?report.mean_fitness,
            record = ?report.record,
            culled = report.culled,
            "Generation complete"
        );
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn generation_count(&self) -> u64 {
        self.generation_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn culled_total(&self) -> u64 {
        self.culled_total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn alive(&self) -> u64 {
        self.alive.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Initializes the global tracing subscriber. `RUST_LOG` takes precedence
/// over `default_filter`. Calling it twice is harmless.
pub fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinesis_data::Genome;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new(10);
        assert_eq!(metrics.frame_count(), 0);
        assert_eq!(metrics.generation_count(), 0);
    }

    #[test]
    fn test_record_frame() {
        let metrics = Metrics::new(2);
        metrics.record_frame(Duration::from_millis(16), 25);
        metrics.record_frame(Duration::from_millis(17), 24);
        assert_eq!(metrics.frame_count(), 2);
        assert_eq!(metrics.alive(), 24);
    }

    #[test]
    fn test_record_generation_accumulates_culls() {
        let metrics = Metrics::default();
        let report = GenerationReport {
            generation: 1,
            best_fitness: Some(3.0),
            mean_fitness: Some(1.0),
            worst_fitness: Some(-1.0),
            record: Some(3.0),
            culled: 2,
            population_size: 25,
            champion: Genome::default(),
        };
        metrics.record_generation(&report);
        metrics.record_generation(&report);
        assert_eq!(metrics.generation_count(), 2);
        assert_eq!(metrics.culled_total(), 4);
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging("kinesis=debug");
        init_logging("kinesis=debug");
    }
}
