use crate::{MediaContext, MediaObservation, MediaResponse, Medium, Volume};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use sim_core::{
    AuctionRange, BidPolicy, ConfigurationError, KeywordPolicy, Perturbation, RelativeEffectiveness, ResolvedBudget,
    SearchConfig, SpendCapPolicy, TransitionOperator,
};
use tracing::debug;

#[derive(Clone, Debug)]
enum SpendCap {
    Unbounded,
    PerCapita(Vec<f64>),
    BudgetMultiple(f64),
}

#[derive(Clone, Debug)]
enum Bid {
    Schedule(Vec<f64>),
    BudgetLinear { base: f64, per_budget: f64 },
}

#[derive(Clone, Debug)]
enum Keywords {
    Uniform(f64),
    PerPeriod(Vec<f64>),
    Saturating { max: f64, half_budget: f64 },
    BySegment(Vec<f64>),
}

/// Query/auction-based media.
///
/// Each step, consumers issue category queries; a keyword match rate decides
/// which queries the brand bids on, and the auction clears at a uniformly
/// drawn cost-per-click between `cpc_min` and the effective bid. Spend is
/// clipped to the step budget and spend cap by scaling paid volume.
#[derive(Clone, Debug)]
pub struct SearchMedia {
    name: String,
    budget: ResolvedBudget,
    query_rate: Vec<f64>,
    click_through_rate: Vec<f64>,
    organic_rate: f64,
    auction: AuctionRange,
    spend_cap: SpendCap,
    bid: Bid,
    keywords: Keywords,
    effectiveness: RelativeEffectiveness,
    effect: TransitionOperator,
}

/// Paid and organic volume of one segment.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Tiers {
    queries: f64,
    matched: f64,
    impressions: f64,
    clicks: f64,
}

impl SearchMedia {
    pub fn new(config: &SearchConfig, horizon: usize) -> Result<Self, ConfigurationError> {
        let budget = config.budget.resolve(&config.name, horizon)?;
        let spend_cap = match &config.spend_cap {
            SpendCapPolicy::Unbounded => SpendCap::Unbounded,
            SpendCapPolicy::PerCapita(s) => SpendCap::PerCapita(s.resolve(horizon)),
            SpendCapPolicy::BudgetMultiple(k) => SpendCap::BudgetMultiple(*k),
        };
        let bid = match &config.bid {
            BidPolicy::Fixed(v) => Bid::Schedule(vec![*v; horizon]),
            BidPolicy::Schedule(s) => Bid::Schedule(s.resolve(horizon)),
            BidPolicy::BudgetLinear { base, per_budget } => Bid::BudgetLinear {
                base: *base,
                per_budget: *per_budget,
            },
        };
        let keywords = match &config.keywords {
            KeywordPolicy::Fixed(v) => Keywords::Uniform(*v),
            KeywordPolicy::PerPeriod(v) => Keywords::PerPeriod(v.clone()),
            KeywordPolicy::Saturating { max, half_budget } => Keywords::Saturating {
                max: *max,
                half_budget: *half_budget,
            },
            KeywordPolicy::BySegment(w) => Keywords::BySegment(w.per_segment()),
        };
        Ok(Self {
            name: config.name.clone(),
            budget,
            query_rate: config.query_rate.per_segment(),
            click_through_rate: config.click_through_rate.per_segment(),
            organic_rate: config.organic_rate,
            auction: config.auction,
            spend_cap,
            bid,
            keywords,
            effectiveness: config.effectiveness,
            effect: TransitionOperator::from_matrices(&config.effect)?,
        })
    }

    fn policy_error(&self, function: &'static str, value: f64, budget: f64) -> ConfigurationError {
        ConfigurationError::InvalidPolicyOutput {
            module: self.name.clone(),
            function,
            value,
            budget,
        }
    }

    /// Per-capita spend ceiling for a step.
    fn cap(&self, step: usize, per_capita_budget: f64) -> Result<f64, ConfigurationError> {
        let cap = match &self.spend_cap {
            SpendCap::Unbounded => return Ok(f64::INFINITY),
            SpendCap::PerCapita(v) => v.get(step).copied().unwrap_or(f64::NAN),
            SpendCap::BudgetMultiple(k) => k * per_capita_budget,
        };
        if cap.is_finite() && cap >= 0.0 {
            Ok(cap)
        } else {
            Err(self.policy_error("spend cap", cap, per_capita_budget))
        }
    }

    fn bid(&self, step: usize, per_capita_budget: f64) -> Result<f64, ConfigurationError> {
        let bid = match &self.bid {
            Bid::Schedule(v) => v.get(step).copied().unwrap_or(f64::NAN),
            Bid::BudgetLinear { base, per_budget } => base + per_budget * per_capita_budget,
        };
        if bid.is_finite() && bid >= 0.0 {
            Ok(bid)
        } else {
            Err(self.policy_error("bid", bid, per_capita_budget))
        }
    }

    /// Keyword match rate of every segment.
    fn match_rates(&self, period: usize, per_capita_budget: f64) -> Result<Vec<f64>, ConfigurationError> {
        let n = self.query_rate.len();
        let rates = match &self.keywords {
            Keywords::Uniform(v) => vec![*v; n],
            Keywords::PerPeriod(v) => vec![v.get(period).copied().unwrap_or(f64::NAN); n],
            Keywords::Saturating { max, half_budget } => {
                vec![max * per_capita_budget / (half_budget + per_capita_budget); n]
            }
            Keywords::BySegment(w) => w.clone(),
        };
        match rates.iter().find(|r| !(r.is_finite() && (0.0..=1.0).contains(*r))) {
            Some(bad) => Err(self.policy_error("keywords", *bad, per_capita_budget)),
            None => Ok(rates),
        }
    }
}

impl Medium for SearchMedia {
    fn name(&self) -> &str {
        &self.name
    }

    fn budget(&self) -> &ResolvedBudget {
        &self.budget
    }

    fn respond(
        &self,
        ctx: &MediaContext<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Result<MediaResponse<'_>, ConfigurationError> {
        let steps = self.budget.span(ctx.period).len().max(1) as f64;
        let step_budget = ctx.period_budget / steps;
        let population = ctx.state.total();
        let per_capita_budget = if population > 0.0 { step_budget / population } else { 0.0 };

        let cap = self.cap(ctx.step, per_capita_budget)?;
        let bid = self.bid(ctx.step, per_capita_budget)?;
        let match_rates = self.match_rates(ctx.period, per_capita_budget)?;

        // Drawn unconditionally so paired runs stay on the same stream.
        let u: f64 = rng.gen();
        let AuctionRange { cpc_min, cpc_max } = self.auction;
        let wins = step_budget > 0.0 && bid >= cpc_min;
        let cpc = cpc_min + u * (bid.min(cpc_max) - cpc_min);

        let mut tiers: Vec<Tiers> = ctx
            .state
            .counts()
            .iter()
            .enumerate()
            .map(|(i, &mass)| {
                let queries = mass * self.query_rate[i];
                let matched = queries * match_rates[i];
                let impressions = if wins { matched } else { 0.0 };
                Tiers {
                    queries,
                    matched,
                    impressions,
                    clicks: impressions * self.click_through_rate[i],
                }
            })
            .collect();

        let clicks: f64 = tiers.iter().map(|t| t.clicks).sum();
        let mut spend = clicks * cpc;
        let limit = step_budget.min(cap * population);
        if spend > limit {
            let scale = limit / spend;
            for t in tiers.iter_mut() {
                t.impressions *= scale;
                t.clicks *= scale;
            }
            spend = limit;
        }

        let e = self.effectiveness;
        let reach = ctx
            .state
            .counts()
            .iter()
            .zip(&tiers)
            .map(|(&mass, t)| {
                if mass <= 0.0 {
                    return 0.0;
                }
                let organic = (t.queries - t.impressions) * self.organic_rate;
                let viewed = t.impressions - t.clicks;
                ((organic * e.organic + viewed * e.impression + t.clicks * e.click) / mass).min(1.0)
            })
            .collect();

        let volume = Volume::Search {
            queries: tiers.iter().map(|t| t.queries).sum(),
            matched_queries: tiers.iter().map(|t| t.matched).sum(),
            impressions: tiers.iter().map(|t| t.impressions).sum(),
            clicks: tiers.iter().map(|t| t.clicks).sum(),
        };
        debug!(media = %self.name, step = ctx.step, spend, bid, cpc, ?volume, "search response");

        Ok(MediaResponse {
            perturbation: Perturbation {
                operator: &self.effect,
                reach,
            },
            observation: MediaObservation {
                name: self.name.clone(),
                spend,
                volume,
            },
        })
    }
}
