#![deny(warnings)]

//! Media modules: the marketing interventions acting on the population.
//!
//! Every module turns a step's budget into observed spend and volume plus a
//! [`Perturbation`] of the population state. The set of strategies is closed:
//! [`MediaModule`] is either reach-based [`TraditionalMedia`] or
//! auction-based [`SearchMedia`], both compiled and validated from their
//! configuration before the first step.

mod search;
mod traditional;

pub use search::SearchMedia;
pub use traditional::TraditionalMedia;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sim_core::{ConfigurationError, MediaConfig, Perturbation, PopulationState, ResolvedBudget};

/// Inputs a module sees for one step.
#[derive(Clone, Copy, Debug)]
pub struct MediaContext<'s> {
    pub step: usize,
    /// Budget-period id of `step`.
    pub period: usize,
    /// Budget assigned to the whole period.
    pub period_budget: f64,
    /// Pre-transition population.
    pub state: &'s PopulationState,
}

/// Volume metrics reported alongside spend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volume {
    Traditional {
        exposures: f64,
    },
    Search {
        queries: f64,
        matched_queries: f64,
        impressions: f64,
        clicks: f64,
    },
}

/// Observed output of one module for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaObservation {
    pub name: String,
    pub spend: f64,
    pub volume: Volume,
}

pub struct MediaResponse<'m> {
    pub perturbation: Perturbation<'m>,
    pub observation: MediaObservation,
}

/// The single interface every media strategy implements.
pub trait Medium {
    fn name(&self) -> &str;

    /// Budget schedule resolved against the run's horizon.
    fn budget(&self) -> &ResolvedBudget;

    /// Computes spend, volume and effect for one step. `rng` is the step's
    /// stream; a module draws the same number of values whatever its budget.
    fn respond(
        &self,
        ctx: &MediaContext<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Result<MediaResponse<'_>, ConfigurationError>;
}

/// Closed set of media strategies.
#[derive(Clone, Debug)]
pub enum MediaModule {
    Traditional(TraditionalMedia),
    Search(SearchMedia),
}

impl MediaModule {
    pub fn compile(config: &MediaConfig, horizon: usize) -> Result<Self, ConfigurationError> {
        config.validate(horizon)?;
        Ok(match config {
            MediaConfig::Traditional(c) => MediaModule::Traditional(TraditionalMedia::new(c, horizon)?),
            MediaConfig::Search(c) => MediaModule::Search(SearchMedia::new(c, horizon)?),
        })
    }
}

impl Medium for MediaModule {
    fn name(&self) -> &str {
        match self {
            MediaModule::Traditional(m) => m.name(),
            MediaModule::Search(m) => m.name(),
        }
    }

    fn budget(&self) -> &ResolvedBudget {
        match self {
            MediaModule::Traditional(m) => m.budget(),
            MediaModule::Search(m) => m.budget(),
        }
    }

    fn respond(
        &self,
        ctx: &MediaContext<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Result<MediaResponse<'_>, ConfigurationError> {
        match self {
            MediaModule::Traditional(m) => m.respond(ctx, rng),
            MediaModule::Search(m) => m.respond(ctx, rng),
        }
    }
}
