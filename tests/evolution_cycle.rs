mod common;

use common::{run_generations, PopulationBuilder};
use kinesis_core::config::{FitnessMode, SimConfig};
use kinesis_core::physics::PhysicsWorld;
use kinesis_core::{Phase, Population, SimError};

#[test]
fn test_population_size_is_invariant_across_generations() {
    let mut population = PopulationBuilder::new().with_size(7).build();
    for _ in 0..3 {
        run_generations(&mut population, 1);
        assert_eq!(population.creatures().len(), 7);
        assert_eq!(population.alive_count(), 7);
        assert_eq!(population.world().body_count(), 7 * 5);
        assert_eq!(population.phase(), Phase::Running);
        assert_eq!(population.epoch_elapsed_ms(), 0.0);
    }
    assert_eq!(population.generation(), 4);
}

#[test]
fn test_record_is_monotonic_high_water_mark() {
    let mut population = PopulationBuilder::new().build();
    let reports = run_generations(&mut population, 4);

    let mut expected: Option<f32> = None;
    for report in &reports {
        if let Some(best) = report.best_fitness {
            expected = Some(expected.map_or(best, |r| r.max(best)));
        }
        assert_eq!(report.record, expected);
    }
    for pair in reports.windows(2) {
        assert!(pair[1].record >= pair[0].record);
    }
    assert_eq!(population.record(), expected);
}

#[test]
fn test_elites_survive_unchanged() {
    let mut population = PopulationBuilder::new().build();
    let report = run_generations(&mut population, 1).remove(0);

    assert_eq!(population.creatures()[0].genome(), &report.champion);
    assert_eq!(population.champions()[0], report.champion);
    assert_eq!(
        population.creatures()[1].genome(),
        &population.champions()[1]
    );
}

#[test]
fn test_reports_are_sequential() {
    let mut population = PopulationBuilder::new().with_size(4).build();
    let generations: Vec<u64> = run_generations(&mut population, 3)
        .iter()
        .map(|r| r.generation)
        .collect();
    assert_eq!(generations, vec![1, 2, 3]);
}

#[test]
fn test_report_statistics_are_ordered() {
    let mut population = PopulationBuilder::new().build();
    for report in run_generations(&mut population, 2) {
        let (best, mean, worst) = (
            report.best_fitness.unwrap(),
            report.mean_fitness.unwrap(),
            report.worst_fitness.unwrap(),
        );
        assert!(worst <= mean && mean <= best);
        assert_eq!(report.population_size, 6);
    }
}

#[test]
fn test_tiny_populations_are_rejected() {
    for size in [0, 3] {
        let mut config = SimConfig::default();
        config.evolution.population_size = size;
        let world = PhysicsWorld::new(&config.world);
        let result = Population::new(config, world, None);
        assert!(matches!(
            result,
            Err(SimError::PopulationTooSmall { size: s, minimum: 4 }) if s == size
        ));
    }
}

#[test]
fn test_epoch_length_matches_lifespan() {
    let mut population = PopulationBuilder::new().with_lifespan_ms(210.0).build();
    let dt = population.timestep_ms();
    let mut frames = 0;
    while population.generation() == 1 {
        population.advance(dt).unwrap();
        frames += 1;
    }
    assert_eq!(frames, (210.0 / dt).ceil() as usize);
}

#[test]
fn test_peak_excursion_fitness_never_drops_within_epoch() {
    let mut population = PopulationBuilder::new()
        .with_lifespan_ms(1000.0)
        .with_config(|c| c.evolution.fitness_mode = FitnessMode::PeakExcursion)
        .build();
    let dt = population.timestep_ms();

    population.advance(dt).unwrap();
    let mut previous: Vec<f32> = population.creatures().iter().map(|c| c.fitness()).collect();
    for _ in 0..40 {
        population.advance(dt).unwrap();
        for (creature, before) in population.creatures().iter().zip(&previous) {
            if creature.is_alive() {
                assert!(creature.fitness() >= *before);
            }
        }
        previous = population.creatures().iter().map(|c| c.fitness()).collect();
    }
}
