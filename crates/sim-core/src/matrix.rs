//! Row-stochastic matrices, one per latent dimension.

use crate::dims::Dimension;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Tolerance on each row sum.
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Square matrix whose row `i` is the distribution of next states from state `i`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StochasticMatrix(Vec<Vec<f64>>);

impl StochasticMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self(rows)
    }

    pub fn identity(n: usize) -> Self {
        Self(
            (0..n)
                .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
                .collect(),
        )
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.0[i]
    }

    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(i, row)| {
            row.iter()
                .enumerate()
                .all(|(j, &p)| p == if i == j { 1.0 } else { 0.0 })
        })
    }

    /// Checks shape and row-stochasticity for the given dimension.
    pub fn validate(&self, dimension: Dimension) -> Result<(), ConfigurationError> {
        let n = dimension.size();
        if self.0.len() != n {
            return Err(ConfigurationError::MatrixShape {
                dimension,
                expected: n,
                rows: self.0.len(),
            });
        }
        for (row, values) in self.0.iter().enumerate() {
            if values.len() != n {
                return Err(ConfigurationError::RowLength {
                    dimension,
                    row,
                    len: values.len(),
                    expected: n,
                });
            }
            if let Some(&value) = values.iter().find(|p| !p.is_finite() || **p < 0.0) {
                return Err(ConfigurationError::InvalidProbability {
                    dimension,
                    row,
                    value,
                });
            }
            let sum: f64 = values.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(ConfigurationError::NotStochastic {
                    dimension,
                    row,
                    sum,
                });
            }
        }
        Ok(())
    }
}

/// Optional matrix per dimension; a missing entry means "no migration".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DimensionMatrices {
    pub market: Option<StochasticMatrix>,
    pub satiation: Option<StochasticMatrix>,
    pub activity: Option<StochasticMatrix>,
    pub favorability: Option<StochasticMatrix>,
    pub loyalty: Option<StochasticMatrix>,
    pub availability: Option<StochasticMatrix>,
}

impl DimensionMatrices {
    pub fn get(&self, dimension: Dimension) -> Option<&StochasticMatrix> {
        match dimension {
            Dimension::Market => self.market.as_ref(),
            Dimension::Satiation => self.satiation.as_ref(),
            Dimension::Activity => self.activity.as_ref(),
            Dimension::Favorability => self.favorability.as_ref(),
            Dimension::Loyalty => self.loyalty.as_ref(),
            Dimension::Availability => self.availability.as_ref(),
        }
    }

    pub fn set(&mut self, dimension: Dimension, matrix: StochasticMatrix) {
        let slot = match dimension {
            Dimension::Market => &mut self.market,
            Dimension::Satiation => &mut self.satiation,
            Dimension::Activity => &mut self.activity,
            Dimension::Favorability => &mut self.favorability,
            Dimension::Loyalty => &mut self.loyalty,
            Dimension::Availability => &mut self.availability,
        };
        *slot = Some(matrix);
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for dim in Dimension::ALL {
            if let Some(m) = self.get(dim) {
                m.validate(dim)?;
            }
        }
        Ok(())
    }
}
