#![deny(warnings)]

//! Monte Carlo estimation of return on ad spend.
//!
//! The estimator compares the recorded scenario with a counterfactual in
//! which one media module's budget is scaled over a window. Both runs share
//! a seed per replicate, so the difference isolates the budget change.
//! Replicates run in batches, in parallel, until the estimate is precise
//! enough or the time limit passes.

pub mod stats;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sim_core::{ConfigurationError, SimConfig};
use sim_runtime::{run_observed, SimulationRecord};
use std::ops::Range;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use stats::{summarize, SampleStats};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoasError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("replicate {index} failed: {source}")]
    Replicate {
        index: usize,
        source: ConfigurationError,
    },
}

/// Non-fatal: the time limit passed before the precision targets were met.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[error("precision not met after {replicates} replicates in {elapsed:?} (moe {margin_of_error}, cv {coefficient_of_variation})")]
pub struct PrecisionNotMet {
    pub replicates: usize,
    pub margin_of_error: f64,
    pub coefficient_of_variation: f64,
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorState {
    Init,
    Sampling,
    Converged,
    TimedOut,
}

/// What to estimate and how precisely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoasRequest {
    pub media: String,
    /// First step of the window.
    pub start: usize,
    /// Last step of the window, inclusive.
    pub end: usize,
    /// Counterfactual budget multiplier in [0, 2], never 1. 0 removes the
    /// budget (ROAS); values near 1 give marginal ROAS.
    pub budget_proportion: f64,
    /// Seed of the replicate seed stream; the record's seed when absent.
    pub seed: Option<u64>,
    /// Batch size and minimum sample.
    pub min_reps: usize,
    pub max_time: Duration,
    pub target_moe: f64,
    pub target_cv: f64,
    /// Measure revenue and spend through the end of the horizon.
    pub include_carryover: bool,
    /// 0 uses rayon's global pool, 1 runs sequentially.
    pub threads: usize,
    pub verbose: bool,
}

impl RoasRequest {
    pub fn new(media: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            media: media.into(),
            start,
            end,
            budget_proportion: 0.0,
            seed: None,
            min_reps: 10,
            max_time: Duration::from_secs(60),
            target_moe: 0.01,
            target_cv: 0.01,
            include_carryover: false,
            threads: 0,
            verbose: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoasReport {
    pub mean: f64,
    pub sample: Vec<f64>,
    pub margin_of_error: f64,
    pub coefficient_of_variation: f64,
    pub converged: bool,
    pub state: EstimatorState,
    pub warning: Option<PrecisionNotMet>,
    pub elapsed: Duration,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoasOutput {
    Mean(f64),
    Report(RoasReport),
}

impl RoasOutput {
    pub fn mean(&self) -> f64 {
        match self {
            RoasOutput::Mean(m) => *m,
            RoasOutput::Report(r) => r.mean,
        }
    }
}

/// Baseline and counterfactual configurations plus the measurement window.
#[derive(Debug)]
struct Plan {
    media: String,
    baseline: SimConfig,
    counterfactual: SimConfig,
    window: Range<usize>,
}

impl Plan {
    fn new(record: &SimulationRecord, request: &RoasRequest) -> Result<Self, ConfigurationError> {
        let baseline = record.config.clone();
        let horizon = baseline.horizon;
        let position = baseline
            .media_position(&request.media)
            .ok_or_else(|| ConfigurationError::UnknownMedia(request.media.clone()))?;
        if request.start > request.end || request.end >= horizon {
            return Err(ConfigurationError::WindowOutOfRange {
                start: request.start,
                end: request.end,
                horizon,
            });
        }
        let p = request.budget_proportion;
        if !(0.0..=2.0).contains(&p) || p == 1.0 {
            return Err(ConfigurationError::InvalidBudgetProportion(p));
        }
        if request.min_reps < 2 {
            return Err(ConfigurationError::OutOfRange {
                field: "min_reps".to_string(),
                value: request.min_reps as f64,
            });
        }
        for (field, v) in [("target_moe", request.target_moe), ("target_cv", request.target_cv)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(ConfigurationError::OutOfRange {
                    field: field.to_string(),
                    value: v,
                });
            }
        }

        let mut counterfactual = baseline.clone();
        let touched = counterfactual.media[position].budget_mut().scale_overlapping(
            &request.media,
            horizon,
            request.start,
            request.end,
            p,
        )?;
        debug!(media = %request.media, periods = ?touched, proportion = p, "counterfactual budget");

        let window = if request.include_carryover {
            request.start..horizon
        } else {
            request.start..request.end + 1
        };
        Ok(Self {
            media: request.media.clone(),
            baseline,
            counterfactual,
            window,
        })
    }

    /// Incremental revenue per incremental spend for one seed.
    fn replicate(&self, seed: u64) -> Result<f64, ConfigurationError> {
        let base = run_observed(&self.baseline, seed)?;
        let alt = run_observed(&self.counterfactual, seed)?;
        let d_spend = base.spend_between(&self.media, self.window.clone())
            - alt.spend_between(&self.media, self.window.clone());
        if d_spend == 0.0 {
            return Err(ConfigurationError::ZeroSpendDelta);
        }
        let d_revenue = base.revenue_between(self.window.clone()) - alt.revenue_between(self.window.clone());
        Ok(d_revenue / d_spend)
    }
}

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    if threads > 1 {
        rayon::ThreadPoolBuilder::new().num_threads(threads).build().ok()
    } else {
        None
    }
}

fn run_batch(
    plan: &Plan,
    seeds: &[u64],
    threads: usize,
    pool: Option<&rayon::ThreadPool>,
) -> Vec<Result<f64, ConfigurationError>> {
    match (pool, threads) {
        (Some(pool), _) => pool.install(|| seeds.par_iter().map(|&s| plan.replicate(s)).collect()),
        (None, 1) => seeds.iter().map(|&s| plan.replicate(s)).collect(),
        (None, _) => seeds.par_iter().map(|&s| plan.replicate(s)).collect(),
    }
}

/// Estimates ROAS of `request.media` over the request window from the
/// scenario that produced `record`.
pub fn estimate(record: &SimulationRecord, request: &RoasRequest) -> Result<RoasOutput, RoasError> {
    let plan = Plan::new(record, request)?;
    let started = Instant::now();
    let pool = build_pool(request.threads);
    let mut seed_stream = ChaCha8Rng::seed_from_u64(request.seed.unwrap_or(record.seed));
    let mut sample: Vec<f64> = Vec::new();
    info!(media = %request.media, start = request.start, end = request.end, proportion = request.budget_proportion, "roas estimation start");

    debug!(state = ?EstimatorState::Sampling, reps = request.min_reps, threads = request.threads, "sampling");
    let (stats, state) = loop {
        let seeds: Vec<u64> = (0..request.min_reps).map(|_| seed_stream.next_u64()).collect();
        for result in run_batch(&plan, &seeds, request.threads, pool.as_ref()) {
            let index = sample.len();
            sample.push(result.map_err(|source| RoasError::Replicate { index, source })?);
        }
        let stats = summarize(&sample);
        debug!(
            n = stats.n,
            mean = stats.mean,
            moe = stats.margin_of_error,
            cv = stats.coefficient_of_variation,
            "roas batch"
        );
        if stats.margin_of_error <= request.target_moe || stats.coefficient_of_variation <= request.target_cv {
            break (stats, EstimatorState::Converged);
        }
        if started.elapsed() > request.max_time {
            break (stats, EstimatorState::TimedOut);
        }
    };

    let elapsed = started.elapsed();
    let warning = (state == EstimatorState::TimedOut).then(|| PrecisionNotMet {
        replicates: stats.n,
        margin_of_error: stats.margin_of_error,
        coefficient_of_variation: stats.coefficient_of_variation,
        elapsed,
    });
    if let Some(w) = &warning {
        warn!(%w, mean = stats.mean, "roas estimate imprecise");
    } else {
        info!(n = stats.n, mean = stats.mean, moe = stats.margin_of_error, "roas estimate converged");
    }

    Ok(if request.verbose {
        RoasOutput::Report(RoasReport {
            mean: stats.mean,
            sample,
            margin_of_error: stats.margin_of_error,
            coefficient_of_variation: stats.coefficient_of_variation,
            converged: state == EstimatorState::Converged,
            state,
            warning,
            elapsed,
        })
    } else {
        RoasOutput::Mean(stats.mean)
    })
}
