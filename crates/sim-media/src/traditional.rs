use crate::{MediaContext, MediaObservation, MediaResponse, Medium, Volume};
use rand_chacha::ChaCha8Rng;
use sim_core::{ConfigurationError, HillCurve, Perturbation, ResolvedBudget, TraditionalConfig, TransitionOperator};
use sim_econ::hill;
use tracing::debug;

/// Reach-based media: spend buys exposures at a fixed cost, and the share of
/// the target audience effectively reached saturates along a Hill curve.
#[derive(Clone, Debug)]
pub struct TraditionalMedia {
    name: String,
    budget: ResolvedBudget,
    flighting: Vec<f64>,
    /// Flighting weight summed over each budget period.
    period_weight: Vec<f64>,
    cost_per_exposure: f64,
    audience: Vec<f64>,
    response: HillCurve,
    effect: TransitionOperator,
}

impl TraditionalMedia {
    pub fn new(config: &TraditionalConfig, horizon: usize) -> Result<Self, ConfigurationError> {
        let budget = config.budget.resolve(&config.name, horizon)?;
        let flighting = config.flighting.resolve(horizon);
        let period_weight = (0..budget.period_count())
            .map(|p| budget.span(p).map(|t| flighting[t]).sum::<f64>())
            .collect();
        Ok(Self {
            name: config.name.clone(),
            budget,
            flighting,
            period_weight,
            cost_per_exposure: config.cost_per_exposure,
            audience: config.audience.per_segment(),
            response: config.response,
            effect: TransitionOperator::from_matrices(&config.effect)?,
        })
    }

    /// Share of the period budget spent at `step`, proportional to its
    /// flighting weight. A period with zero total weight spends nothing.
    pub fn spend_at(&self, step: usize, period: usize, period_budget: f64) -> f64 {
        let total = self.period_weight[period];
        if total > 0.0 {
            period_budget * self.flighting[step] / total
        } else {
            0.0
        }
    }
}

impl Medium for TraditionalMedia {
    fn name(&self) -> &str {
        &self.name
    }

    fn budget(&self) -> &ResolvedBudget {
        &self.budget
    }

    fn respond(
        &self,
        ctx: &MediaContext<'_>,
        _rng: &mut ChaCha8Rng,
    ) -> Result<MediaResponse<'_>, ConfigurationError> {
        let spend = self.spend_at(ctx.step, ctx.period, ctx.period_budget);
        let exposures = spend / self.cost_per_exposure;
        let audience: f64 = ctx
            .state
            .counts()
            .iter()
            .zip(&self.audience)
            .map(|(m, w)| m * w)
            .sum();
        let per_capita = if audience > 0.0 { exposures / audience } else { 0.0 };
        let effect = hill(per_capita, self.response.half_saturation, self.response.slope);
        debug!(media = %self.name, step = ctx.step, spend, exposures, effect, "traditional response");

        Ok(MediaResponse {
            perturbation: Perturbation {
                operator: &self.effect,
                reach: self.audience.iter().map(|w| w * effect).collect(),
            },
            observation: MediaObservation {
                name: self.name.clone(),
                spend,
                volume: Volume::Traditional { exposures },
            },
        })
    }
}
