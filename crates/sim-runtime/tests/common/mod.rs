#![allow(dead_code)]

use chrono::NaiveDate;
use sim_core::{
    AuctionRange, BidPolicy, BudgetSchedule, Dimension, DimensionMatrices, EntryShares, HillCurve, InitialShares,
    KeywordPolicy, MarketFlow, MediaConfig, PeriodMap, RelativeEffectiveness, SalesConfig, SearchConfig,
    SegmentWeights, Series, SimConfig, SpendCapPolicy, StochasticMatrix, TraditionalConfig,
};

pub fn initial() -> InitialShares {
    InitialShares {
        market: [0.4, 0.6],
        satiation: [0.85, 0.15],
        activity: [0.5, 0.35, 0.15],
        favorability: [0.35, 0.1, 0.25, 0.2, 0.1],
        loyalty: [0.7, 0.15, 0.15],
        availability: [0.2, 0.5, 0.3],
    }
}

pub fn sales() -> SalesConfig {
    SalesConfig {
        price: Series::Constant(3.0),
        demand_intercept: [0.0, 0.05, 0.3, 0.5, 0.8],
        demand_slope: [0.0, -0.01, -0.05, -0.05, -0.05],
        competitor_max_share: [0.6, 0.2, 0.95],
        replacement_rate: [0.5, 0.9, 0.05],
        availability_multiplier: [0.6, 0.9, 1.0],
    }
}

pub fn natural() -> DimensionMatrices {
    let mut m = DimensionMatrices::default();
    m.set(
        Dimension::Market,
        StochasticMatrix::new(vec![vec![0.92, 0.08], vec![0.05, 0.95]]),
    );
    m.set(
        Dimension::Satiation,
        StochasticMatrix::new(vec![vec![0.95, 0.05], vec![0.3, 0.7]]),
    );
    m.set(
        Dimension::Activity,
        StochasticMatrix::new(vec![
            vec![0.7, 0.25, 0.05],
            vec![0.3, 0.5, 0.2],
            vec![0.6, 0.3, 0.1],
        ]),
    );
    m.set(
        Dimension::Favorability,
        StochasticMatrix::new(vec![
            vec![0.98, 0.0, 0.02, 0.0, 0.0],
            vec![0.0, 0.95, 0.05, 0.0, 0.0],
            vec![0.0, 0.03, 0.94, 0.03, 0.0],
            vec![0.0, 0.0, 0.04, 0.93, 0.03],
            vec![0.0, 0.0, 0.0, 0.05, 0.95],
        ]),
    );
    m.set(
        Dimension::Loyalty,
        StochasticMatrix::new(vec![
            vec![0.9, 0.05, 0.05],
            vec![0.1, 0.9, 0.0],
            vec![0.1, 0.0, 0.9],
        ]),
    );
    m
}

pub fn awareness_lift() -> DimensionMatrices {
    let mut m = DimensionMatrices::default();
    m.set(
        Dimension::Favorability,
        StochasticMatrix::new(vec![
            vec![0.2, 0.1, 0.5, 0.2, 0.0],
            vec![0.0, 0.8, 0.2, 0.0, 0.0],
            vec![0.0, 0.0, 0.6, 0.4, 0.0],
            vec![0.0, 0.0, 0.0, 0.7, 0.3],
            vec![0.0, 0.0, 0.0, 0.0, 1.0],
        ]),
    );
    m
}

pub fn tv(weekly: f64, period: usize, horizon: usize) -> MediaConfig {
    MediaConfig::Traditional(TraditionalConfig {
        name: "tv".into(),
        budget: BudgetSchedule::uniform(period, weekly * period as f64, horizon),
        flighting: Series::Constant(1.0),
        cost_per_exposure: 0.02,
        audience: SegmentWeights::default(),
        response: HillCurve {
            half_saturation: 1.5,
            slope: 1.2,
        },
        effect: awareness_lift(),
    })
}

pub fn search(weekly: f64, horizon: usize) -> MediaConfig {
    MediaConfig::Search(SearchConfig {
        name: "search".into(),
        budget: BudgetSchedule {
            periods: PeriodMap::Uniform { length: 1 },
            amounts: vec![weekly; horizon],
        },
        query_rate: SegmentWeights {
            activity: Some([0.0, 0.6, 0.9]),
            ..Default::default()
        },
        click_through_rate: SegmentWeights {
            favorability: Some([0.02, 0.005, 0.03, 0.06, 0.1]),
            ..Default::default()
        },
        organic_rate: 0.2,
        auction: AuctionRange {
            cpc_min: 0.2,
            cpc_max: 1.5,
        },
        spend_cap: SpendCapPolicy::BudgetMultiple(1.0),
        bid: BidPolicy::BudgetLinear {
            base: 0.5,
            per_budget: 10.0,
        },
        keywords: KeywordPolicy::Saturating {
            max: 0.9,
            half_budget: 0.01,
        },
        effectiveness: RelativeEffectiveness {
            organic: 0.02,
            impression: 0.05,
            click: 0.5,
        },
        effect: awareness_lift(),
    })
}

pub fn scenario(horizon: usize) -> SimConfig {
    SimConfig {
        horizon,
        start_date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        step_days: 7,
        population: 100_000.0,
        rng_seed: 11,
        initial: initial(),
        natural_migration: natural(),
        market_flow: Some(MarketFlow {
            in_market_size: Series::Values(
                (0..horizon)
                    .map(|t| 40_000.0 + 5_000.0 * ((t % 13) as f64 - 6.0))
                    .collect(),
            ),
            entry: EntryShares {
                activity: [0.5, 0.4, 0.1],
                favorability: [0.6, 0.1, 0.2, 0.1, 0.0],
                loyalty: [0.9, 0.05, 0.05],
                availability: [0.2, 0.5, 0.3],
            },
        }),
        media: vec![tv(2_000.0, 4, horizon), search(500.0, horizon)],
        sales: sales(),
    }
}
