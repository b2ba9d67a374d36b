//! Observed tables produced by a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sim_core::{NumericalWarning, Segment, SimConfig};
use sim_media::MediaObservation;
use std::ops::Range;

/// Aggregate observations for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObservedRow {
    pub step: usize,
    pub date: NaiveDate,
    pub population: f64,
    pub in_market: f64,
    pub net_entry: f64,
    pub price: f64,
    /// One entry per media module, in configuration order.
    pub media: Vec<MediaObservation>,
    pub total_spend: f64,
    pub units_sold: f64,
    pub competitor_units: f64,
    pub revenue: f64,
    /// Advertiser share of all units sold; 0 when nothing sold.
    pub brand_share: f64,
}

/// Per-segment observations for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentRow {
    pub step: usize,
    pub segment: Segment,
    pub population: f64,
    pub advertiser_units: f64,
    pub competitor_units: f64,
}

/// Full output of a simulation, including the inputs that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub config: SimConfig,
    pub seed: u64,
    pub rows: Vec<ObservedRow>,
    /// Empty for observed-only runs.
    pub segment_rows: Vec<SegmentRow>,
    pub warnings: Vec<NumericalWarning>,
}

/// Headline KPIs of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: usize,
    pub total_spend: f64,
    pub units_sold: f64,
    pub revenue: f64,
    pub brand_share: f64,
}

impl SimulationRecord {
    fn window(&self, steps: Range<usize>) -> &[ObservedRow] {
        let end = steps.end.min(self.rows.len());
        &self.rows[steps.start.min(end)..end]
    }

    /// Spend of one media module over `steps`.
    pub fn spend_between(&self, media: &str, steps: Range<usize>) -> f64 {
        self.window(steps)
            .iter()
            .flat_map(|r| r.media.iter())
            .filter(|m| m.name == media)
            .map(|m| m.spend)
            .sum()
    }

    pub fn revenue_between(&self, steps: Range<usize>) -> f64 {
        self.window(steps).iter().map(|r| r.revenue).sum()
    }

    pub fn summary(&self) -> RunSummary {
        let units: f64 = self.rows.iter().map(|r| r.units_sold).sum();
        let competitor: f64 = self.rows.iter().map(|r| r.competitor_units).sum();
        RunSummary {
            steps: self.rows.len(),
            total_spend: self.rows.iter().map(|r| r.total_spend).sum(),
            units_sold: units,
            revenue: self.revenue_between(0..self.rows.len()),
            brand_share: if units + competitor > 0.0 {
                units / (units + competitor)
            } else {
                0.0
            },
        }
    }

    /// Segment rows of one step.
    pub fn segments_at(&self, step: usize) -> impl Iterator<Item = &SegmentRow> + '_ {
        self.segment_rows.iter().filter(move |r| r.step == step)
    }
}
