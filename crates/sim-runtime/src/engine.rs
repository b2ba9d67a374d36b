//! One time step of the population dynamics.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::{
    compose, segment_index, ConfigurationError, Market, MassCorrection, NumericalWarning, PopulationState,
    SalesConfig, SimConfig, TransitionOperator,
};
use sim_econ::{sell, SalesOutcome};
use sim_media::{MediaContext, MediaModule, MediaObservation, Medium};
use tracing::{debug, warn};

/// Everything produced by a single step.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// Post-transition, post-entry state.
    pub state: PopulationState,
    pub media: Vec<MediaObservation>,
    /// Mass added (positive) or removed (negative) by market entry/exit.
    pub net_entry: f64,
    pub price: f64,
    pub sales: SalesOutcome,
    pub warnings: Vec<NumericalWarning>,
}

#[derive(Clone, Debug)]
struct ResolvedFlow {
    in_market_size: Vec<f64>,
    /// Fraction of entrants landing in each segment; sums to 1.
    entry_weights: Vec<f64>,
}

/// Compiled, validated model: natural migration, media modules, market flow
/// and sales parameters.
#[derive(Clone, Debug)]
pub struct PopulationEngine {
    horizon: usize,
    initial: PopulationState,
    natural: TransitionOperator,
    modules: Vec<MediaModule>,
    flow: Option<ResolvedFlow>,
    price: Vec<f64>,
    sales: SalesConfig,
}

impl PopulationEngine {
    pub fn new(config: &SimConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let modules = config
            .media
            .iter()
            .map(|m| MediaModule::compile(m, config.horizon))
            .collect::<Result<Vec<_>, _>>()?;
        let flow = config.market_flow.as_ref().map(|f| ResolvedFlow {
            in_market_size: f.in_market_size.resolve(config.horizon),
            entry_weights: segment_index().distribute(1.0, &f.entry.slices()),
        });
        Ok(Self {
            horizon: config.horizon,
            initial: PopulationState::from_shares(config.population, &config.initial),
            natural: TransitionOperator::from_matrices(&config.natural_migration)?,
            modules,
            flow,
            price: config.sales.price.resolve(config.horizon),
            sales: config.sales.clone(),
        })
    }

    pub fn initial_state(&self) -> PopulationState {
        self.initial.clone()
    }

    /// Advances `state` by one step. The result depends only on the state,
    /// `t`, the configuration and `seed`.
    pub fn step(&self, state: &PopulationState, t: usize, seed: u64) -> Result<StepOutcome, ConfigurationError> {
        if t >= self.horizon {
            return Err(ConfigurationError::StepOutOfRange {
                step: t,
                horizon: self.horizon,
            });
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(t as u64);

        let mut perturbations = Vec::with_capacity(self.modules.len());
        let mut media = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            let budget = module.budget();
            let period = budget
                .period(t)
                .ok_or_else(|| ConfigurationError::MissingBudgetPeriod {
                    module: module.name().to_string(),
                    step: t,
                })?;
            let ctx = MediaContext {
                step: t,
                period,
                period_budget: budget.amount(period),
                state,
            };
            let response = module.respond(&ctx, &mut rng)?;
            perturbations.push(response.perturbation);
            media.push(response.observation);
        }

        let mut warnings = Vec::new();
        let (mut next, correction) = compose(&self.natural, perturbations).apply(state);
        if let Some(MassCorrection {
            expected,
            observed,
            clipped_negative,
        }) = correction
        {
            if clipped_negative > 0.0 {
                warnings.push(NumericalWarning::NegativeMass {
                    step: t,
                    mass: clipped_negative,
                });
            }
            warnings.push(NumericalWarning::MassDrift {
                step: t,
                expected,
                observed,
            });
        }

        let mut net_entry = 0.0;
        if let Some(flow) = &self.flow {
            let before = next.total();
            let current = next.in_market();
            let target = flow.in_market_size[t];
            let net = target - current;
            if net < 0.0 {
                let factor = if current > 0.0 { target / current } else { 0.0 };
                next = next.scaled_where(|s| s.market == Market::InMarket, factor);
            } else if net > 0.0 {
                let entrants: Vec<f64> = flow.entry_weights.iter().map(|w| w * net).collect();
                next = next.with_added(&entrants);
            }
            net_entry = next.total() - before;
            debug!(step = t, target, current, net_entry, "market flow");
        }

        let price = self.price[t];
        let sales = sell(&next, price, &self.sales);
        if sales.clipped_segments > 0 {
            warnings.push(NumericalWarning::DemandClipped {
                step: t,
                segments: sales.clipped_segments,
            });
        }
        for w in &warnings {
            match w {
                NumericalWarning::DemandClipped { .. } => debug!(%w, "numerical warning"),
                _ => warn!(%w, "numerical warning"),
            }
        }

        Ok(StepOutcome {
            state: next,
            media,
            net_entry,
            price,
            sales,
            warnings,
        })
    }
}
