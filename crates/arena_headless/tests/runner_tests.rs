//! Full runs through the headless runner, without console output.

use std::fs;
use std::time::Duration;

use arena_core::config::ArenaConfig;
use arena_headless::runner::{self, RunError, RunOptions};
use arena_headless::sinks::{COMBAT_LOG_FILE, EVENT_LOG_FILE, MOVEMENT_LOG_FILE};
use arena_test_utils::fixtures::fast_timing;

fn quick_options(dir: &std::path::Path) -> RunOptions {
    RunOptions {
        config: ArenaConfig {
            population: 30,
            timing: fast_timing(),
            seed: Some(5),
            ..ArenaConfig::default()
        },
        duration: Duration::from_millis(150),
        scenario: None,
        save_path: Some(dir.join("final_state.txt")),
        log_dir: Some(dir.join("logs")),
        console: None,
        summary_json: Some(dir.join("summary.json")),
    }
}

#[test]
fn run_writes_state_logs_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let options = quick_options(dir.path());
    let outcome = runner::run(&options).unwrap();

    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    assert_eq!(outcome.report.initial.total, 30);
    assert_eq!(outcome.saved, Some(outcome.survivors.len()));
    assert_eq!(outcome.survivors.len(), outcome.report.final_stats.alive);

    let state = fs::read_to_string(dir.path().join("final_state.txt")).unwrap();
    assert_eq!(
        state.lines().filter(|l| !l.starts_with('#')).count(),
        outcome.survivors.len()
    );
    for file in [COMBAT_LOG_FILE, MOVEMENT_LOG_FILE, EVENT_LOG_FILE] {
        assert!(dir.path().join("logs").join(file).exists(), "{file}");
    }
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["seed"], 5);

    let text = runner::final_summary(&outcome, &options);
    assert!(text.contains("SESSION FINISHED"));
    assert!(text.contains("Seed: 5"));
}

#[test]
fn saved_state_can_seed_the_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let first = runner::run(&quick_options(dir.path())).unwrap();

    let mut options = quick_options(dir.path());
    options.scenario = Some(dir.path().join("final_state.txt"));
    options.save_path = Some(dir.path().join("second.txt"));
    let second = runner::run(&options).unwrap();
    assert_eq!(second.report.initial.alive, first.survivors.len());
}

#[test]
fn save_failure_is_a_warning_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = quick_options(dir.path());
    options.save_path = Some(dir.path().join("missing_dir").join("state.txt"));
    options.log_dir = None;
    options.summary_json = None;
    let outcome = runner::run(&options).unwrap();
    assert_eq!(outcome.saved, None);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(runner::final_summary(&outcome, &options).contains("could not be saved"));
}

#[test]
fn missing_scenario_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = quick_options(dir.path());
    options.scenario = Some(dir.path().join("absent.txt"));
    assert!(matches!(
        runner::run(&options),
        Err(RunError::Scenario { .. })
    ));
}

#[test]
fn invalid_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = quick_options(dir.path());
    options.config.timing.move_interval_ms = 0;
    assert!(matches!(runner::run(&options), Err(RunError::Arena(_))));
}

#[test]
fn banner_mentions_source_of_creatures() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = quick_options(dir.path());
    assert!(runner::banner(&options).contains("Spawning 30 creatures"));
    options.scenario = Some("saved.txt".into());
    assert!(runner::banner(&options).contains("saved.txt"));
}
