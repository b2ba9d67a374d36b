//! Statically typed scenario configuration.
//!
//! Every struct denies unknown fields, and `SimConfig::validate` checks the
//! whole bundle before the first step runs. Exogenous inputs (seasonality,
//! flighting, prices) arrive as precomputed [`Series`].

use crate::dims::Dimension;
use crate::error::ConfigurationError;
use crate::matrix::DimensionMatrices;
use crate::segment::segment_index;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;

const ONES: [f64; 5] = [1.0; 5];

fn check_finite(field: &str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::OutOfRange {
            field: field.to_string(),
            value,
        })
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigurationError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigurationError::OutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_unit(field: &str, value: f64) -> Result<(), ConfigurationError> {
    check_non_negative(field, value)?;
    if value > 1.0 {
        return Err(ConfigurationError::OutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_shares(field: &str, shares: &[f64]) -> Result<(), ConfigurationError> {
    let sum: f64 = shares.iter().sum();
    if shares.iter().any(|s| !s.is_finite() || *s < 0.0) || (sum - 1.0).abs() > 1e-6 {
        return Err(ConfigurationError::InvalidShares {
            field: field.to_string(),
            sum,
        });
    }
    Ok(())
}

/// A precomputed exogenous time series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    Constant(f64),
    /// One value per step of the horizon.
    Values(Vec<f64>),
}

impl Series {
    pub fn at(&self, step: usize) -> f64 {
        match self {
            Series::Constant(v) => *v,
            Series::Values(v) => v.get(step).copied().unwrap_or(f64::NAN),
        }
    }

    pub fn resolve(&self, horizon: usize) -> Vec<f64> {
        (0..horizon).map(|t| self.at(t)).collect()
    }

    /// Checks length and that every value is finite and non-negative.
    pub fn validate(&self, field: &str, horizon: usize) -> Result<(), ConfigurationError> {
        match self {
            Series::Constant(v) => check_non_negative(field, *v),
            Series::Values(values) => {
                if values.len() != horizon {
                    return Err(ConfigurationError::LengthMismatch {
                        field: field.to_string(),
                        expected: horizon,
                        got: values.len(),
                    });
                }
                values.iter().try_for_each(|v| check_non_negative(field, *v))
            }
        }
    }
}

fn unit_flighting() -> Series {
    Series::Constant(1.0)
}

/// Step → budget-period labelling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodMap {
    /// Period id for every step.
    Explicit(Vec<usize>),
    /// Consecutive periods of `length` steps: id = step / length.
    Uniform { length: usize },
}

/// Per-period budgets for one media module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetSchedule {
    pub periods: PeriodMap,
    /// Budget per period id.
    pub amounts: Vec<f64>,
}

/// A budget schedule resolved against a horizon.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedBudget {
    period_of_step: Vec<usize>,
    amounts: Vec<f64>,
    spans: Vec<Range<usize>>,
}

impl ResolvedBudget {
    pub fn period(&self, step: usize) -> Option<usize> {
        self.period_of_step.get(step).copied()
    }

    pub fn amount(&self, period: usize) -> f64 {
        self.amounts[period]
    }

    /// Steps covered by a period; empty when the period is unused.
    pub fn span(&self, period: usize) -> Range<usize> {
        self.spans[period].clone()
    }

    pub fn period_count(&self) -> usize {
        self.amounts.len()
    }
}

impl BudgetSchedule {
    /// Constant budget over periods of equal length.
    pub fn uniform(length: usize, amount: f64, horizon: usize) -> Self {
        let n = horizon.div_ceil(length.max(1));
        Self {
            periods: PeriodMap::Uniform { length },
            amounts: vec![amount; n],
        }
    }

    pub fn resolve(&self, module: &str, horizon: usize) -> Result<ResolvedBudget, ConfigurationError> {
        for (i, a) in self.amounts.iter().enumerate() {
            check_non_negative(&format!("media `{module}` budget amount {i}"), *a)?;
        }
        let period_of_step: Vec<usize> = match &self.periods {
            PeriodMap::Uniform { length } => {
                if *length == 0 {
                    return Err(ConfigurationError::OutOfRange {
                        field: format!("media `{module}` budget period length"),
                        value: 0.0,
                    });
                }
                (0..horizon).map(|t| t / length).collect()
            }
            PeriodMap::Explicit(ids) => {
                if ids.len() > horizon {
                    return Err(ConfigurationError::LengthMismatch {
                        field: format!("media `{module}` budget periods"),
                        expected: horizon,
                        got: ids.len(),
                    });
                }
                ids.clone()
            }
        };
        if period_of_step.len() < horizon {
            return Err(ConfigurationError::MissingBudgetPeriod {
                module: module.to_string(),
                step: period_of_step.len(),
            });
        }

        let mut spans: Vec<Option<Range<usize>>> = vec![None; self.amounts.len()];
        for (step, &period) in period_of_step.iter().enumerate() {
            if period >= spans.len() {
                return Err(ConfigurationError::MissingBudgetPeriod {
                    module: module.to_string(),
                    step,
                });
            }
            let next = match &spans[period] {
                None => step..step + 1,
                Some(r) if r.end == step => r.start..step + 1,
                Some(_) => {
                    return Err(ConfigurationError::NonContiguousPeriod {
                        module: module.to_string(),
                        period,
                    })
                }
            };
            spans[period] = Some(next);
        }
        Ok(ResolvedBudget {
            period_of_step,
            amounts: self.amounts.clone(),
            spans: spans.into_iter().map(|s| s.unwrap_or(0..0)).collect(),
        })
    }

    /// Multiplies the budget of every period overlapping `[start, end]` by
    /// `factor`. Returns the affected period ids.
    pub fn scale_overlapping(
        &mut self,
        module: &str,
        horizon: usize,
        start: usize,
        end: usize,
        factor: f64,
    ) -> Result<Vec<usize>, ConfigurationError> {
        let resolved = self.resolve(module, horizon)?;
        let touched: BTreeSet<usize> = (start..=end.min(horizon.saturating_sub(1)))
            .filter_map(|t| resolved.period(t))
            .collect();
        for &p in &touched {
            self.amounts[p] *= factor;
        }
        Ok(touched.into_iter().collect())
    }
}

/// Per-dimension factors in [0, 1]; the weight of a segment is the product
/// over its states. A missing dimension contributes 1.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentWeights {
    pub market: Option<[f64; 2]>,
    pub satiation: Option<[f64; 2]>,
    pub activity: Option<[f64; 3]>,
    pub favorability: Option<[f64; 5]>,
    pub loyalty: Option<[f64; 3]>,
    pub availability: Option<[f64; 3]>,
}

impl SegmentWeights {
    fn slices(&self) -> [&[f64]; Dimension::COUNT] {
        fn or_ones<const N: usize>(v: &Option<[f64; N]>) -> &[f64] {
            match v {
                Some(a) => a.as_slice(),
                None => &ONES[..N],
            }
        }
        [
            or_ones(&self.market),
            or_ones(&self.satiation),
            or_ones(&self.activity),
            or_ones(&self.favorability),
            or_ones(&self.loyalty),
            or_ones(&self.availability),
        ]
    }

    pub fn validate(&self, field: &str) -> Result<(), ConfigurationError> {
        for (dim, values) in Dimension::ALL.iter().zip(self.slices()) {
            for v in values {
                check_unit(&format!("{field}.{dim}"), *v)?;
            }
        }
        Ok(())
    }

    /// Weight of every segment, in segment order.
    pub fn per_segment(&self) -> Vec<f64> {
        segment_index().product_weights(&self.slices())
    }
}

/// Marginal shares of the starting population along each dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitialShares {
    pub market: [f64; 2],
    pub satiation: [f64; 2],
    pub activity: [f64; 3],
    pub favorability: [f64; 5],
    pub loyalty: [f64; 3],
    pub availability: [f64; 3],
}

impl InitialShares {
    pub fn slices(&self) -> [&[f64]; Dimension::COUNT] {
        [
            &self.market,
            &self.satiation,
            &self.activity,
            &self.favorability,
            &self.loyalty,
            &self.availability,
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (dim, shares) in Dimension::ALL.iter().zip(self.slices()) {
            check_shares(&format!("initial.{dim}"), shares)?;
        }
        Ok(())
    }
}

/// Where market entrants land; entrants are always in-market and unsatiated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryShares {
    pub activity: [f64; 3],
    pub favorability: [f64; 5],
    pub loyalty: [f64; 3],
    pub availability: [f64; 3],
}

impl EntryShares {
    pub fn slices(&self) -> [&[f64]; Dimension::COUNT] {
        const ENTERED: [f64; 2] = [1.0, 0.0];
        [
            &ENTERED,
            &ENTERED,
            &self.activity,
            &self.favorability,
            &self.loyalty,
            &self.availability,
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_shares("market_flow.entry.activity", &self.activity)?;
        check_shares("market_flow.entry.favorability", &self.favorability)?;
        check_shares("market_flow.entry.loyalty", &self.loyalty)?;
        check_shares("market_flow.entry.availability", &self.availability)
    }
}

/// Seasonal in-market size, enforced after each step's transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketFlow {
    /// Target in-market population per step.
    pub in_market_size: Series,
    pub entry: EntryShares,
}

/// Saturating Hill response: `x^s / (k^s + x^s)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HillCurve {
    pub half_saturation: f64,
    pub slope: f64,
}

impl HillCurve {
    pub fn validate(&self, module: &str) -> Result<(), ConfigurationError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.half_saturation) && ok(self.slope) {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidResponseCurve {
                module: module.to_string(),
                half_saturation: self.half_saturation,
                slope: self.slope,
            })
        }
    }
}

/// Reach-based media (TV, print, display).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraditionalConfig {
    pub name: String,
    pub budget: BudgetSchedule,
    /// Relative weight of each step within its budget period.
    #[serde(default = "unit_flighting")]
    pub flighting: Series,
    pub cost_per_exposure: f64,
    #[serde(default)]
    pub audience: SegmentWeights,
    pub response: HillCurve,
    /// Transition applied to fully reached consumers.
    pub effect: DimensionMatrices,
}

/// Bounds on the cost-per-click cleared by the auction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuctionRange {
    pub cpc_min: f64,
    pub cpc_max: f64,
}

/// Hard spend ceiling per step, per capita.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendCapPolicy {
    #[default]
    Unbounded,
    PerCapita(Series),
    /// Multiple of the per-capita step budget.
    BudgetMultiple(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidPolicy {
    Fixed(f64),
    Schedule(Series),
    /// `base + per_budget * per_capita_budget`.
    BudgetLinear { base: f64, per_budget: f64 },
}

/// Fraction of a segment's queries that match the keyword list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordPolicy {
    Fixed(f64),
    /// One match rate per budget period id.
    PerPeriod(Vec<f64>),
    /// Broader keyword lists with more budget: `max * b / (half_budget + b)`.
    Saturating { max: f64, half_budget: f64 },
    BySegment(SegmentWeights),
}

/// Effect strength of each exposure tier, ascending.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelativeEffectiveness {
    pub organic: f64,
    pub impression: f64,
    pub click: f64,
}

/// Query/auction-based media.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    pub name: String,
    pub budget: BudgetSchedule,
    /// Probability a consumer issues a category query in a step.
    pub query_rate: SegmentWeights,
    pub click_through_rate: SegmentWeights,
    /// Probability the brand shows in organic results for a query.
    #[serde(default)]
    pub organic_rate: f64,
    pub auction: AuctionRange,
    #[serde(default)]
    pub spend_cap: SpendCapPolicy,
    pub bid: BidPolicy,
    pub keywords: KeywordPolicy,
    pub effectiveness: RelativeEffectiveness,
    pub effect: DimensionMatrices,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaConfig {
    Traditional(TraditionalConfig),
    Search(SearchConfig),
}

impl MediaConfig {
    pub fn name(&self) -> &str {
        match self {
            MediaConfig::Traditional(c) => &c.name,
            MediaConfig::Search(c) => &c.name,
        }
    }

    pub fn budget(&self) -> &BudgetSchedule {
        match self {
            MediaConfig::Traditional(c) => &c.budget,
            MediaConfig::Search(c) => &c.budget,
        }
    }

    pub fn budget_mut(&mut self) -> &mut BudgetSchedule {
        match self {
            MediaConfig::Traditional(c) => &mut c.budget,
            MediaConfig::Search(c) => &mut c.budget,
        }
    }

    pub fn validate(&self, horizon: usize) -> Result<(), ConfigurationError> {
        let name = self.name();
        let budget = self.budget().resolve(name, horizon)?;
        match self {
            MediaConfig::Traditional(c) => {
                c.flighting
                    .validate(&format!("media `{name}` flighting"), horizon)?;
                let cost = c.cost_per_exposure;
                if !(cost.is_finite() && cost > 0.0) {
                    return Err(ConfigurationError::OutOfRange {
                        field: format!("media `{name}` cost_per_exposure"),
                        value: cost,
                    });
                }
                c.audience.validate(&format!("media `{name}` audience"))?;
                c.response.validate(name)?;
                c.effect.validate()
            }
            MediaConfig::Search(c) => {
                c.query_rate.validate(&format!("media `{name}` query_rate"))?;
                c.click_through_rate
                    .validate(&format!("media `{name}` click_through_rate"))?;
                check_unit(&format!("media `{name}` organic_rate"), c.organic_rate)?;
                let AuctionRange { cpc_min, cpc_max } = c.auction;
                check_non_negative(&format!("media `{name}` cpc_min"), cpc_min)?;
                check_non_negative(&format!("media `{name}` cpc_max"), cpc_max)?;
                if cpc_max <= 0.0 || cpc_min > cpc_max {
                    return Err(ConfigurationError::OutOfRange {
                        field: format!("media `{name}` auction range"),
                        value: cpc_min,
                    });
                }
                validate_spend_cap(name, &c.spend_cap, horizon)?;
                validate_bid(name, &c.bid, horizon)?;
                validate_keywords(name, &c.keywords, budget.period_count())?;
                let e = c.effectiveness;
                for (tier, v) in [("organic", e.organic), ("impression", e.impression), ("click", e.click)] {
                    check_unit(&format!("media `{name}` effectiveness.{tier}"), v)?;
                }
                if e.organic > e.impression || e.impression > e.click {
                    return Err(ConfigurationError::OutOfRange {
                        field: format!("media `{name}` effectiveness tiers must ascend"),
                        value: e.impression,
                    });
                }
                c.effect.validate()
            }
        }
    }
}

fn policy_error(module: &str, function: &'static str, value: f64) -> ConfigurationError {
    ConfigurationError::InvalidPolicyOutput {
        module: module.to_string(),
        function,
        value,
        budget: f64::NAN,
    }
}

fn validate_policy_series(
    module: &str,
    function: &'static str,
    series: &Series,
    horizon: usize,
) -> Result<(), ConfigurationError> {
    if let Series::Values(v) = series {
        if v.len() != horizon {
            return Err(ConfigurationError::LengthMismatch {
                field: format!("media `{module}` {function}"),
                expected: horizon,
                got: v.len(),
            });
        }
    }
    match series.resolve(horizon).into_iter().find(|v| !v.is_finite() || *v < 0.0) {
        Some(bad) => Err(policy_error(module, function, bad)),
        None => Ok(()),
    }
}

fn validate_spend_cap(module: &str, cap: &SpendCapPolicy, horizon: usize) -> Result<(), ConfigurationError> {
    match cap {
        SpendCapPolicy::Unbounded => Ok(()),
        SpendCapPolicy::PerCapita(s) => validate_policy_series(module, "spend cap", s, horizon),
        SpendCapPolicy::BudgetMultiple(k) if k.is_finite() && *k >= 0.0 => Ok(()),
        SpendCapPolicy::BudgetMultiple(k) => Err(policy_error(module, "spend cap", *k)),
    }
}

fn validate_bid(module: &str, bid: &BidPolicy, horizon: usize) -> Result<(), ConfigurationError> {
    let ok = |v: f64| v.is_finite() && v >= 0.0;
    match bid {
        BidPolicy::Fixed(v) if ok(*v) => Ok(()),
        BidPolicy::Fixed(v) => Err(policy_error(module, "bid", *v)),
        BidPolicy::Schedule(s) => validate_policy_series(module, "bid", s, horizon),
        BidPolicy::BudgetLinear { base, per_budget } => {
            if !ok(*base) {
                Err(policy_error(module, "bid", *base))
            } else if !ok(*per_budget) {
                Err(policy_error(module, "bid", *per_budget))
            } else {
                Ok(())
            }
        }
    }
}

fn validate_keywords(module: &str, keywords: &KeywordPolicy, periods: usize) -> Result<(), ConfigurationError> {
    let ok = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
    match keywords {
        KeywordPolicy::Fixed(v) if ok(*v) => Ok(()),
        KeywordPolicy::Fixed(v) => Err(policy_error(module, "keywords", *v)),
        KeywordPolicy::PerPeriod(rates) => {
            if rates.len() < periods {
                return Err(ConfigurationError::LengthMismatch {
                    field: format!("media `{module}` keyword rates"),
                    expected: periods,
                    got: rates.len(),
                });
            }
            match rates.iter().find(|v| !ok(**v)) {
                Some(bad) => Err(policy_error(module, "keywords", *bad)),
                None => Ok(()),
            }
        }
        KeywordPolicy::Saturating { max, half_budget } => {
            if !ok(*max) {
                Err(policy_error(module, "keywords", *max))
            } else if !(half_budget.is_finite() && *half_budget > 0.0) {
                Err(policy_error(module, "keywords", *half_budget))
            } else {
                Ok(())
            }
        }
        KeywordPolicy::BySegment(w) => w.validate(&format!("media `{module}` keywords")),
    }
}

fn unit_multipliers() -> [f64; 3] {
    [1.0; 3]
}

/// Demand and competition parameters for the sales layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SalesConfig {
    pub price: Series,
    /// Linear demand intercept per favorability state.
    pub demand_intercept: [f64; 5],
    /// Linear demand slope (per unit price) per favorability state.
    pub demand_slope: [f64; 5],
    /// Maximum share of a segment competitors can claim, per loyalty state.
    pub competitor_max_share: [f64; 3],
    /// Share of contested buyers that go to the advertiser, per loyalty state.
    pub replacement_rate: [f64; 3],
    /// Scales advertiser demand by availability state.
    #[serde(default = "unit_multipliers")]
    pub availability_multiplier: [f64; 3],
}

impl SalesConfig {
    pub fn validate(&self, horizon: usize) -> Result<(), ConfigurationError> {
        self.price.validate("sales.price", horizon)?;
        for v in self.demand_intercept.iter().chain(&self.demand_slope) {
            check_finite("sales.demand", *v)?;
        }
        for v in &self.competitor_max_share {
            check_unit("sales.competitor_max_share", *v)?;
        }
        for v in &self.replacement_rate {
            check_unit("sales.replacement_rate", *v)?;
        }
        for v in &self.availability_multiplier {
            check_unit("sales.availability_multiplier", *v)?;
        }
        Ok(())
    }
}

fn default_step_days() -> u16 {
    7
}

/// Complete configuration of one simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Number of time steps.
    pub horizon: usize,
    /// Calendar date of step 0.
    pub start_date: NaiveDate,
    /// Days per step (default: 7 for weekly data).
    #[serde(default = "default_step_days")]
    pub step_days: u16,
    /// Total starting population.
    pub population: f64,
    /// Seed used when the caller does not supply one.
    #[serde(default)]
    pub rng_seed: u64,
    pub initial: InitialShares,
    #[serde(default)]
    pub natural_migration: DimensionMatrices,
    #[serde(default)]
    pub market_flow: Option<MarketFlow>,
    /// Media modules; their order is the order perturbations apply in.
    #[serde(default)]
    pub media: Vec<MediaConfig>,
    pub sales: SalesConfig,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.horizon == 0 {
            return Err(ConfigurationError::EmptyHorizon);
        }
        if self.step_days == 0 {
            return Err(ConfigurationError::OutOfRange {
                field: "step_days".to_string(),
                value: 0.0,
            });
        }
        let span = self.horizon as u64 * u64::from(self.step_days);
        if self.start_date.checked_add_days(Days::new(span)).is_none() {
            return Err(ConfigurationError::OutOfRange {
                field: "start_date + horizon".to_string(),
                value: span as f64,
            });
        }
        if !(self.population.is_finite() && self.population > 0.0) {
            return Err(ConfigurationError::OutOfRange {
                field: "population".to_string(),
                value: self.population,
            });
        }
        self.initial.validate()?;
        self.natural_migration.validate()?;
        if let Some(flow) = &self.market_flow {
            flow.in_market_size
                .validate("market_flow.in_market_size", self.horizon)?;
            flow.entry.validate()?;
        }
        let mut names = BTreeSet::new();
        for m in &self.media {
            if !names.insert(m.name()) {
                return Err(ConfigurationError::DuplicateMedia(m.name().to_string()));
            }
            m.validate(self.horizon)?;
        }
        self.sales.validate(self.horizon)
    }

    /// Calendar date a step starts on.
    pub fn date_of(&self, step: usize) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(step as u64 * u64::from(self.step_days)))
            .unwrap_or(self.start_date)
    }

    pub fn media_position(&self, name: &str) -> Option<usize> {
        self.media.iter().position(|m| m.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(ids: Vec<usize>, amounts: Vec<f64>) -> BudgetSchedule {
        BudgetSchedule {
            periods: PeriodMap::Explicit(ids),
            amounts,
        }
    }

    #[test]
    fn uniform_periods_resolve() {
        let b = BudgetSchedule::uniform(4, 100.0, 10);
        assert_eq!(b.amounts.len(), 3);
        let r = b.resolve("tv", 10).unwrap();
        assert_eq!(r.period(5), Some(1));
        assert_eq!(r.span(2), 8..10);
    }

    #[test]
    fn missing_and_non_contiguous_periods_fail() {
        let short = schedule(vec![0, 0, 1], vec![1.0, 1.0]);
        assert_eq!(
            short.resolve("tv", 4),
            Err(ConfigurationError::MissingBudgetPeriod {
                module: "tv".into(),
                step: 3
            })
        );
        let unknown = schedule(vec![0, 0, 2, 2], vec![1.0, 1.0]);
        assert!(matches!(
            unknown.resolve("tv", 4),
            Err(ConfigurationError::MissingBudgetPeriod { step: 2, .. })
        ));
        let split = schedule(vec![0, 1, 0, 1], vec![1.0, 1.0]);
        assert!(matches!(
            split.resolve("tv", 4),
            Err(ConfigurationError::NonContiguousPeriod { period: 0, .. })
        ));
    }

    #[test]
    fn scaling_touches_only_overlapping_periods() {
        let mut b = schedule(vec![0, 0, 1, 1, 2, 2], vec![10.0, 20.0, 30.0]);
        let touched = b.scale_overlapping("tv", 6, 1, 2, 0.5).unwrap();
        assert_eq!(touched, vec![0, 1]);
        assert_eq!(b.amounts, vec![5.0, 10.0, 30.0]);
    }

    #[test]
    fn segment_weights_default_to_one() {
        let w = SegmentWeights::default();
        assert!(w.per_segment().iter().all(|&v| v == 1.0));
        let bad = SegmentWeights {
            activity: Some([0.0, 0.5, 1.5]),
            ..Default::default()
        };
        assert!(bad.validate("audience").is_err());
    }

    #[test]
    fn response_curve_must_be_positive() {
        let c = HillCurve {
            half_saturation: 0.0,
            slope: 1.0,
        };
        assert!(matches!(
            c.validate("tv"),
            Err(ConfigurationError::InvalidResponseCurve { .. })
        ));
    }

    #[test]
    fn series_from_yaml_tags() {
        let s: Series = serde_yaml::from_str("!constant 2.5").unwrap();
        assert_eq!(s.at(10), 2.5);
        let v: Series = serde_yaml::from_str("!values [1.0, 2.0]").unwrap();
        assert!(v.validate("price", 3).is_err());
        assert!(v.validate("price", 2).is_ok());
    }
}
