//! Population state vector over valid segments.

use crate::config::InitialShares;
use crate::dims::{Activity, Market};
use crate::error::ConfigurationError;
use crate::segment::{segment_index, Segment};
use serde::{Deserialize, Serialize};

/// Non-negative mass per segment, indexed by segment position.
///
/// A state is never mutated in place by the engine; each step produces a
/// new value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationState {
    counts: Vec<f64>,
}

impl PopulationState {
    /// Wraps a segment vector after checking length and non-negativity.
    pub fn from_counts(counts: Vec<f64>) -> Result<Self, ConfigurationError> {
        let expected = segment_index().len();
        if counts.len() != expected {
            return Err(ConfigurationError::LengthMismatch {
                field: "population state".to_string(),
                expected,
                got: counts.len(),
            });
        }
        if let Some(&value) = counts.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(ConfigurationError::OutOfRange {
                field: "population state".to_string(),
                value,
            });
        }
        Ok(Self { counts })
    }

    /// Internal constructor for vectors already known to be well-formed.
    pub(crate) fn from_raw(counts: Vec<f64>) -> Self {
        Self { counts }
    }

    /// Initial population: `population` spread over the product of the
    /// marginal shares and projected onto valid segments.
    pub fn from_shares(population: f64, shares: &InitialShares) -> Self {
        Self {
            counts: segment_index().distribute(population, &shares.slices()),
        }
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn get(&self, position: usize) -> f64 {
        self.counts[position]
    }

    /// Mass of one segment; zero for structurally invalid segments.
    pub fn mass_of(&self, segment: &Segment) -> f64 {
        segment_index()
            .position(segment)
            .map(|p| self.counts[p])
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Total mass over segments matching `pred`.
    pub fn mass_where(&self, pred: impl Fn(&Segment) -> bool) -> f64 {
        segment_index()
            .segments()
            .iter()
            .zip(&self.counts)
            .filter(|(seg, _)| pred(seg))
            .map(|(_, &m)| m)
            .sum()
    }

    pub fn in_market(&self) -> f64 {
        self.mass_where(|s| s.market == Market::InMarket)
    }

    pub fn purchasers(&self) -> f64 {
        self.mass_where(|s| s.activity == Activity::Purchase)
    }

    /// Copy with the mass of every segment matching `pred` multiplied by
    /// `factor` (clamped at zero).
    pub fn scaled_where(&self, pred: impl Fn(&Segment) -> bool, factor: f64) -> Self {
        let factor = factor.max(0.0);
        let counts = segment_index()
            .segments()
            .iter()
            .zip(&self.counts)
            .map(|(seg, &m)| if pred(seg) { m * factor } else { m })
            .collect();
        Self { counts }
    }

    /// Copy with `extra` added segment-wise. Negative or non-finite entries
    /// of `extra` are ignored.
    pub fn with_added(&self, extra: &[f64]) -> Self {
        let counts = self
            .counts
            .iter()
            .zip(extra.iter().chain(std::iter::repeat(&0.0)))
            .map(|(&m, &e)| if e.is_finite() && e > 0.0 { m + e } else { m })
            .collect();
        Self { counts }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Segment, f64)> + '_ {
        segment_index()
            .segments()
            .iter()
            .copied()
            .zip(self.counts.iter().copied())
    }
}
