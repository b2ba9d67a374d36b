//! Folds the engine over the horizon.

use crate::engine::{PopulationEngine, StepOutcome};
use crate::record::{ObservedRow, SegmentRow, SimulationRecord};
use sim_core::{segment_index, ConfigurationError, SimConfig};
use std::time::Instant;
use tracing::{debug, info};

/// Runs `config` with `seed` and records both the per-step and the
/// per-segment tables.
pub fn run(config: &SimConfig, seed: u64) -> Result<SimulationRecord, ConfigurationError> {
    simulate(config, seed, true)
}

/// Like [`run`] but without the per-segment table.
pub fn run_observed(config: &SimConfig, seed: u64) -> Result<SimulationRecord, ConfigurationError> {
    simulate(config, seed, false)
}

fn simulate(config: &SimConfig, seed: u64, with_segments: bool) -> Result<SimulationRecord, ConfigurationError> {
    let started = Instant::now();
    let engine = PopulationEngine::new(config)?;
    debug!(horizon = config.horizon, seed, media = config.media.len(), "simulation start");

    let mut state = engine.initial_state();
    let mut rows = Vec::with_capacity(config.horizon);
    let mut segment_rows = Vec::new();
    let mut warnings = Vec::new();
    for t in 0..config.horizon {
        let outcome = engine.step(&state, t, seed)?;
        if with_segments {
            segment_rows.extend(segment_table(t, &outcome));
        }
        rows.push(observed_row(config, t, &outcome));
        warnings.extend(outcome.warnings);
        state = outcome.state;
    }

    let record = SimulationRecord {
        config: config.clone(),
        seed,
        rows,
        segment_rows,
        warnings,
    };
    let kpi = record.summary();
    info!(
        steps = kpi.steps,
        spend = kpi.total_spend,
        units = kpi.units_sold,
        revenue = kpi.revenue,
        warnings = record.warnings.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "simulation complete"
    );
    Ok(record)
}

fn observed_row(config: &SimConfig, t: usize, outcome: &StepOutcome) -> ObservedRow {
    let sales = &outcome.sales;
    ObservedRow {
        step: t,
        date: config.date_of(t),
        population: outcome.state.total(),
        in_market: outcome.state.in_market(),
        net_entry: outcome.net_entry,
        price: outcome.price,
        media: outcome.media.clone(),
        total_spend: outcome.media.iter().map(|m| m.spend).sum(),
        units_sold: sales.advertiser_units,
        competitor_units: sales.competitor_units,
        revenue: sales.advertiser_units * outcome.price,
        brand_share: sales.brand_share(),
    }
}

fn segment_table(t: usize, outcome: &StepOutcome) -> impl Iterator<Item = SegmentRow> + '_ {
    segment_index()
        .segments()
        .iter()
        .zip(outcome.state.counts())
        .zip(&outcome.sales.by_segment)
        .map(move |((&segment, &population), split)| SegmentRow {
            step: t,
            segment,
            population,
            advertiser_units: split.advertiser,
            competitor_units: split.competitor,
        })
}
