#![deny(warnings)]

//! Economic models: demand and competition for the sales layer.
//!
//! This module provides:
//! - The saturating Hill response used by media to turn exposure into effect
//! - Linear price demand per favorability state, clipped to [0, 1]
//! - The competitor-substitution split between advertiser and competitors
//! - `sell`, which converts a population state and a price into unit sales

use sim_core::{Activity, PopulationState, SalesConfig};

/// Saturating Hill curve `x^s / (k^s + x^s)` in [0, 1].
///
/// Negative input is treated as zero exposure.
///
/// Example:
/// assert_eq!(hill(2.0, 2.0, 1.0), 0.5);
pub fn hill(x: f64, half_saturation: f64, slope: f64) -> f64 {
    let x = x.max(0.0);
    if x == 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }
    let xs = x.powf(slope);
    let ks = half_saturation.powf(slope);
    xs / (ks + xs)
}

/// Fraction of purchasers who would buy at `price`, and whether the raw
/// linear value had to be clipped into [0, 1].
pub fn demand_fraction(intercept: f64, slope: f64, price: f64) -> (f64, bool) {
    let raw = intercept + slope * price;
    let clipped = raw.clamp(0.0, 1.0);
    (clipped, clipped != raw)
}

/// Realized purchases for one segment, split by brand.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BrandSplit {
    pub advertiser: f64,
    pub competitor: f64,
    /// Buyers wanted by both the advertiser and a competitor.
    pub contested: f64,
}

/// Resolves advertiser and competitor demand for a segment of `population`
/// buyers.
///
/// Preferences are independent, so the contested overlap is
/// `advertiser * competitor / population`. The advertiser keeps its
/// uncontested demand plus `replacement_rate` of the contested buyers; the
/// competitor gets the rest of the contested buyers plus its own
/// uncontested demand.
///
/// Example: 100 buyers, advertiser 100, competitor 80, rate 0.5 gives
/// 20 + 40 = 60 advertiser and 40 competitor.
pub fn split_contested(
    population: f64,
    advertiser_potential: f64,
    competitor_potential: f64,
    replacement_rate: f64,
) -> BrandSplit {
    if population <= 0.0 {
        return BrandSplit::default();
    }
    let a = advertiser_potential.clamp(0.0, population);
    let c = competitor_potential.clamp(0.0, population);
    let contested = a * c / population;
    let rate = replacement_rate.clamp(0.0, 1.0);
    let advertiser = ((a - contested) + rate * contested).min(a);
    let competitor = (c - contested) + (1.0 - rate) * contested;
    BrandSplit {
        advertiser,
        competitor,
        contested,
    }
}

/// Output of the sales layer for one step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SalesOutcome {
    pub advertiser_units: f64,
    pub competitor_units: f64,
    /// Per-segment split, in segment order.
    pub by_segment: Vec<BrandSplit>,
    /// Segments whose demand fraction needed clipping.
    pub clipped_segments: usize,
}

impl SalesOutcome {
    /// Advertiser share of all category units; zero with no sales.
    pub fn brand_share(&self) -> f64 {
        let total = self.advertiser_units + self.competitor_units;
        if total > 0.0 {
            self.advertiser_units / total
        } else {
            0.0
        }
    }
}

/// Converts the purchase-activity consumers of `state` into unit sales at
/// `price`. One unit per buyer.
pub fn sell(state: &PopulationState, price: f64, params: &SalesConfig) -> SalesOutcome {
    let mut out = SalesOutcome {
        by_segment: Vec::with_capacity(state.counts().len()),
        ..SalesOutcome::default()
    };
    for (seg, n) in state.iter() {
        if seg.activity != Activity::Purchase || n <= 0.0 {
            out.by_segment.push(BrandSplit::default());
            continue;
        }
        let fav = seg.favorability.index();
        let loyalty = seg.loyalty.index();
        let (fraction, clipped) =
            demand_fraction(params.demand_intercept[fav], params.demand_slope[fav], price);
        if clipped {
            out.clipped_segments += 1;
        }
        let advertiser =
            n * fraction * params.availability_multiplier[seg.availability.index()];
        let competitor = n * params.competitor_max_share[loyalty];
        let split = split_contested(n, advertiser, competitor, params.replacement_rate[loyalty]);
        out.advertiser_units += split.advertiser;
        out.competitor_units += split.competitor;
        out.by_segment.push(split);
    }
    out
}
