//! Error and warning taxonomy shared by every crate in the workspace.

use crate::dims::Dimension;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed or inconsistent input. Always fatal and raised before a run
/// mutates anything.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Matrix does not have one row per state.
    #[error("{dimension} matrix must have {expected} rows, got {rows}")]
    MatrixShape {
        dimension: Dimension,
        expected: usize,
        rows: usize,
    },
    #[error("{dimension} matrix row {row} has {len} entries, expected {expected}")]
    RowLength {
        dimension: Dimension,
        row: usize,
        len: usize,
        expected: usize,
    },
    /// Entry is negative or non-finite.
    #[error("{dimension} matrix row {row} has invalid probability {value}")]
    InvalidProbability {
        dimension: Dimension,
        row: usize,
        value: f64,
    },
    #[error("{dimension} matrix row {row} sums to {sum}, expected 1")]
    NotStochastic {
        dimension: Dimension,
        row: usize,
        sum: f64,
    },
    #[error("{field}: shares must be non-negative and sum to 1 (sum {sum})")]
    InvalidShares { field: String, sum: f64 },
    #[error("{field}: expected {expected} values, got {got}")]
    LengthMismatch {
        field: String,
        expected: usize,
        got: usize,
    },
    #[error("{field}: value {value} is out of range")]
    OutOfRange { field: String, value: f64 },
    #[error("horizon must be at least one step")]
    EmptyHorizon,
    #[error("step {step} is outside horizon {horizon}")]
    StepOutOfRange { step: usize, horizon: usize },
    #[error("media `{module}` has no budget for step {step}")]
    MissingBudgetPeriod { module: String, step: usize },
    #[error("media `{module}` budget period {period} is not contiguous")]
    NonContiguousPeriod { module: String, period: usize },
    #[error("media `{module}` response curve needs positive half-saturation and slope (got {half_saturation}, {slope})")]
    InvalidResponseCurve {
        module: String,
        half_saturation: f64,
        slope: f64,
    },
    /// A spend-cap, bid or keyword policy produced an unusable value.
    #[error("media `{module}` {function} returned {value} for per-capita budget {budget}")]
    InvalidPolicyOutput {
        module: String,
        function: &'static str,
        value: f64,
        budget: f64,
    },
    #[error("unknown media `{0}`")]
    UnknownMedia(String),
    #[error("duplicate media name `{0}`")]
    DuplicateMedia(String),
    #[error("window [{start}, {end}] is outside horizon {horizon}")]
    WindowOutOfRange {
        start: usize,
        end: usize,
        horizon: usize,
    },
    #[error("budget proportion {0} must lie in [0, 2] and differ from 1")]
    InvalidBudgetProportion(f64),
    #[error("counterfactual spend equals baseline spend over the window")]
    ZeroSpendDelta,
}

/// Recoverable numeric issue: logged, corrected by clipping, and the run
/// continues.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum NumericalWarning {
    #[error("step {step}: population mass drifted from {expected} to {observed}; rescaled")]
    MassDrift {
        step: usize,
        expected: f64,
        observed: f64,
    },
    #[error("step {step}: clipped {mass} of negative population mass")]
    NegativeMass { step: usize, mass: f64 },
    #[error("step {step}: demand clipped to [0, 1] in {segments} segments")]
    DemandClipped { step: usize, segments: usize },
}
