mod common;

use sim_core::{segment_index, Activity, Market, Satiation, Segment, SEGMENT_COUNT};
use sim_runtime::{run, PopulationEngine};

#[test]
fn mass_follows_net_entry_every_step() {
    let config = common::scenario(26);
    let engine = PopulationEngine::new(&config).unwrap();
    let mut state = engine.initial_state();
    assert!((state.total() - config.population).abs() < 1e-6);
    for t in 0..config.horizon {
        let out = engine.step(&state, t, 3).unwrap();
        let expected = state.total() + out.net_entry;
        assert!(
            (out.state.total() - expected).abs() <= 1e-9 * expected.max(1.0),
            "step {t}: {} vs {expected}",
            out.state.total()
        );
        state = out.state;
    }
}

#[test]
fn invalid_cells_never_hold_mass() {
    let config = common::scenario(20);
    let record = run(&config, 8).unwrap();
    assert_eq!(record.segment_rows.len(), 20 * SEGMENT_COUNT);
    for row in &record.segment_rows {
        assert!(row.segment.is_valid());
        assert!(row.population >= 0.0);
    }
    let idx = segment_index();
    let last = record.segments_at(19).map(|r| r.population).sum::<f64>();
    assert!((last - record.rows[19].population).abs() < 1e-6);
    // A satiated shopper is not a segment at all.
    let stray = Segment {
        market: Market::InMarket,
        satiation: Satiation::Satiated,
        activity: Activity::Purchase,
        ..idx.segment(0)
    };
    assert_eq!(idx.position(&stray), None);
}

#[test]
fn identity_dynamics_keep_state() {
    let mut config = common::scenario(5);
    config.natural_migration = Default::default();
    config.market_flow = None;
    config.media.clear();
    let engine = PopulationEngine::new(&config).unwrap();
    let start = engine.initial_state();
    let out = engine.step(&start, 0, 0).unwrap();
    assert_eq!(out.state, start);
    assert!(out.warnings.is_empty());
}

#[test]
fn units_respect_segment_population() {
    let record = run(&common::scenario(12), 2).unwrap();
    for row in &record.segment_rows {
        assert!(row.advertiser_units <= row.population + 1e-9);
        assert!(row.advertiser_units + row.competitor_units <= row.population + 1e-9);
    }
    for row in &record.rows {
        assert!((0.0..=1.0).contains(&row.brand_share));
        assert!((row.revenue - row.units_sold * row.price).abs() < 1e-9);
    }
}
