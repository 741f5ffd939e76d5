mod common;

use common::{run_generations, scratch_dir, PopulationBuilder};
use kinesis_io::{read_reports, Checkpoint, HistoryLogger};
use kinesis_lib::app::{App, AppOptions};

#[test]
fn test_checkpoint_resumes_lineage() {
    let dir = scratch_dir("resume");
    let path = dir.join("population.ckpt");

    let mut population = PopulationBuilder::new().build();
    run_generations(&mut population, 2);
    Checkpoint::capture(&population).save(&path).unwrap();

    let builder = PopulationBuilder::new().with_seed(99);
    let loaded = Checkpoint::load(&path).unwrap();
    assert!(loaded.matches_config(builder.config()));
    let state = loaded.into_resume_state(builder.config());

    let mut elites = builder;
    for genome in state.elites.clone() {
        elites = elites.with_elite(genome);
    }
    let mut resumed = elites.build();

    assert_eq!(state.generation, 3);
    assert_eq!(state.record, population.record());
    assert_eq!(resumed.creatures()[0].genome(), population.creatures()[0].genome());
    assert_eq!(resumed.champions().len(), 0);

    let report = run_generations(&mut resumed, 1).remove(0);
    assert!(report.record >= population.record());

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_history_logger_records_each_generation() {
    let dir = scratch_dir("history");
    let logger = HistoryLogger::new_at(&dir).unwrap();
    let mut population = PopulationBuilder::new()
        .with_observer(Box::new(logger))
        .build();

    let reports = run_generations(&mut population, 2);
    let logged = read_reports(&dir).unwrap();
    assert_eq!(logged.len(), 2);
    for (logged, report) in logged.iter().zip(&reports) {
        assert_eq!(logged.generation, report.generation);
        assert_eq!(logged.population_size, report.population_size);
        assert_eq!(logged.champion.node_count(), report.champion.node_count());
    }

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_app_saves_and_resumes_checkpoint() {
    let dir = scratch_dir("app");
    let options = AppOptions {
        checkpoint: Some(dir.join("kinesis.ckpt")),
        log_dir: Some(dir.clone()),
    };
    let config = PopulationBuilder::new().config().clone();

    let mut app = App::new(config.clone(), options.clone()).unwrap();
    app.run_headless(Some(1)).unwrap();
    assert!(!app.is_running());
    assert!(dir.join("kinesis.ckpt").exists());
    assert_eq!(read_reports(&dir).unwrap().len(), 1);

    let resumed = App::new(config, options).unwrap();
    assert_eq!(resumed.harness().population().generation(), 2);
    assert_eq!(
        resumed.harness().population().record().is_some(),
        app.harness().population().record().is_some()
    );

    std::fs::remove_dir_all(dir).ok();
}
