#![deny(warnings)]

//! Core domain model for the aggregate marketing simulator.
//!
//! This crate defines the latent consumer dimensions, the process-wide
//! segment index, the population state, per-dimension transition operators
//! and the statically validated scenario configuration shared by every other
//! crate.

pub mod config;
pub mod dims;
pub mod error;
pub mod matrix;
pub mod operator;
pub mod segment;
pub mod state;

pub use config::{
    AuctionRange, BidPolicy, BudgetSchedule, EntryShares, HillCurve, InitialShares, KeywordPolicy,
    MarketFlow, MediaConfig, PeriodMap, RelativeEffectiveness, ResolvedBudget, SalesConfig,
    SearchConfig, SegmentWeights, Series, SimConfig, SpendCapPolicy, TraditionalConfig,
};
pub use dims::{Activity, Availability, Dimension, Favorability, Loyalty, Market, Satiation};
pub use error::{ConfigurationError, NumericalWarning};
pub use matrix::{DimensionMatrices, StochasticMatrix};
pub use operator::{compose, ComposedOperator, MassCorrection, Perturbation, TransitionOperator};
pub use segment::{segment_index, Segment, SegmentIndex, SEGMENT_COUNT};
pub use state::PopulationState;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn shares() -> InitialShares {
        InitialShares {
            market: [0.6, 0.4],
            satiation: [0.8, 0.2],
            activity: [0.5, 0.3, 0.2],
            favorability: [0.2, 0.1, 0.3, 0.2, 0.2],
            loyalty: [0.6, 0.2, 0.2],
            availability: [0.3, 0.4, 0.3],
        }
    }

    fn config() -> SimConfig {
        SimConfig {
            horizon: 8,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            step_days: 7,
            population: 1_000.0,
            rng_seed: 42,
            initial: shares(),
            natural_migration: DimensionMatrices::default(),
            market_flow: None,
            media: vec![],
            sales: SalesConfig {
                price: Series::Constant(2.0),
                demand_intercept: [0.0, 0.1, 0.3, 0.6, 0.9],
                demand_slope: [0.0; 5],
                competitor_max_share: [0.8, 0.2, 1.0],
                replacement_rate: [0.5, 0.9, 0.1],
                availability_multiplier: [1.0; 3],
            },
        }
    }

    #[test]
    fn config_roundtrips_through_json_and_validates() {
        let cfg = config();
        cfg.validate().unwrap();
        let s = serde_json::to_string(&cfg).unwrap();
        let back: SimConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(back, cfg);
        assert_eq!(cfg.date_of(2), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn duplicate_media_names_fail() {
        let mut cfg = config();
        let tv = MediaConfig::Traditional(TraditionalConfig {
            name: "tv".into(),
            budget: BudgetSchedule::uniform(4, 100.0, cfg.horizon),
            flighting: Series::Constant(1.0),
            cost_per_exposure: 0.01,
            audience: SegmentWeights::default(),
            response: HillCurve {
                half_saturation: 1.0,
                slope: 1.0,
            },
            effect: DimensionMatrices::default(),
        });
        cfg.media = vec![tv.clone(), tv];
        assert_eq!(
            cfg.validate(),
            Err(ConfigurationError::DuplicateMedia("tv".into()))
        );
    }

    fn search() -> SearchConfig {
        SearchConfig {
            name: "search".into(),
            budget: BudgetSchedule::uniform(4, 100.0, 8),
            query_rate: SegmentWeights::default(),
            click_through_rate: SegmentWeights::default(),
            organic_rate: 0.2,
            auction: AuctionRange {
                cpc_min: 0.1,
                cpc_max: 1.0,
            },
            spend_cap: SpendCapPolicy::Unbounded,
            bid: BidPolicy::Fixed(0.5),
            keywords: KeywordPolicy::Fixed(0.5),
            effectiveness: RelativeEffectiveness {
                organic: 0.0,
                impression: 0.1,
                click: 0.5,
            },
            effect: DimensionMatrices::default(),
        }
    }

    fn with_search(c: SearchConfig) -> SimConfig {
        SimConfig {
            media: vec![MediaConfig::Search(c)],
            ..config()
        }
    }

    #[test]
    fn policies_with_bad_outputs_fail_validation() {
        with_search(search()).validate().unwrap();
        let rejects = |c: SearchConfig, function: &str, value: f64| match with_search(c).validate() {
            Err(ConfigurationError::InvalidPolicyOutput {
                module,
                function: f,
                value: v,
                ..
            }) => module == "search" && f == function && (v == value || (v.is_nan() && value.is_nan())),
            _ => false,
        };

        assert!(rejects(
            SearchConfig {
                bid: BidPolicy::Fixed(-1.0),
                ..search()
            },
            "bid",
            -1.0
        ));
        assert!(rejects(
            SearchConfig {
                bid: BidPolicy::Fixed(f64::NAN),
                ..search()
            },
            "bid",
            f64::NAN
        ));
        assert!(rejects(
            SearchConfig {
                spend_cap: SpendCapPolicy::BudgetMultiple(-1.0),
                ..search()
            },
            "spend cap",
            -1.0
        ));
        assert!(rejects(
            SearchConfig {
                spend_cap: SpendCapPolicy::PerCapita(Series::Values(vec![0.1, 0.1, -0.5, 0.1, 0.1, 0.1, 0.1, 0.1])),
                ..search()
            },
            "spend cap",
            -0.5
        ));
        assert!(rejects(
            SearchConfig {
                keywords: KeywordPolicy::Fixed(1.5),
                ..search()
            },
            "keywords",
            1.5
        ));
    }

    #[test]
    fn unknown_yaml_keys_fail_fast() {
        let mut yaml = serde_yaml::to_string(&config()).unwrap();
        yaml.push_str("mystery_knob: 3\n");
        assert!(serde_yaml::from_str::<SimConfig>(&yaml).is_err());
    }

    proptest! {
        #[test]
        fn bad_population_is_rejected(p in -1e6f64..=0.0) {
            let mut cfg = config();
            cfg.population = p;
            prop_assert!(cfg.validate().is_err());
        }

        #[test]
        fn shares_must_sum_to_one(a in 0.0f64..1.0, b in 0.0f64..1.0) {
            prop_assume!((a + b - 1.0).abs() > 1e-3);
            let mut cfg = config();
            cfg.initial.market = [a, b];
            let is_share_error = matches!(cfg.validate(), Err(ConfigurationError::InvalidShares { .. }));
            prop_assert!(is_share_error);
        }
    }
}
