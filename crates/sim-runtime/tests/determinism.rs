mod common;

use sim_core::{ConfigurationError, SimConfig};
use sim_runtime::{run, run_observed};

#[test]
fn same_seed_is_bit_identical() {
    let config = common::scenario(30);
    let a = run(&config, 99).unwrap();
    let b = run(&config, 99).unwrap();
    assert_eq!(a, b);
}

#[test]
fn seed_drives_search_auction() {
    let config = common::scenario(30);
    let a = run_observed(&config, 1).unwrap();
    let b = run_observed(&config, 2).unwrap();
    let spend = |r: &sim_runtime::SimulationRecord| r.spend_between("search", 0..30);
    assert_ne!(spend(&a), spend(&b));
}

#[test]
fn observed_run_matches_full_run() {
    let config = common::scenario(10);
    let full = run(&config, 4).unwrap();
    let observed = run_observed(&config, 4).unwrap();
    assert_eq!(full.rows, observed.rows);
    assert!(observed.segment_rows.is_empty());
}

#[test]
fn record_survives_json() {
    let record = run(&common::scenario(6), 5).unwrap();
    let json = serde_json::to_string(&record).unwrap();
    let back: sim_runtime::SimulationRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back.rows.len(), record.rows.len());
    assert_eq!(back.config, record.config);
}

#[test]
fn invalid_config_fails_before_running() {
    let mut config: SimConfig = common::scenario(10);
    config.media.push(common::tv(1.0, 2, 10));
    assert_eq!(
        run(&config, 0).unwrap_err(),
        ConfigurationError::DuplicateMedia("tv".into())
    );
}
