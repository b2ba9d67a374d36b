//! Transition operators over the segment state.
//!
//! An operator holds one stochastic matrix per dimension and is applied
//! axis by axis to the state viewed as a six-dimensional cell array. The
//! activity axis is applied first and only to engaged cells (in-market and
//! unsatiated), so it is conditioned on the pre-transition market and
//! satiation; the remaining axes are independent and commute. The result is
//! projected back onto valid segments.
//!
//! Within a simulation step, operators compose in a fixed order: natural
//! migration first, then each media perturbation in module order. The order
//! is part of the model and `compose` preserves it exactly.

use crate::dims::Dimension;
use crate::error::ConfigurationError;
use crate::matrix::{DimensionMatrices, StochasticMatrix};
use crate::segment::{segment_index, CELL_COUNT, SHAPE, STRIDES};
use crate::state::PopulationState;

/// Relative tolerance on mass conservation across one application.
pub const MASS_TOLERANCE: f64 = 1e-9;

/// Validated per-dimension transition. Identity axes are stored as `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionOperator {
    matrices: [Option<StochasticMatrix>; Dimension::COUNT],
}

impl TransitionOperator {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_matrices(m: &DimensionMatrices) -> Result<Self, ConfigurationError> {
        let mut op = Self::identity();
        for dim in Dimension::ALL {
            if let Some(matrix) = m.get(dim) {
                op = op.with_dimension(dim, matrix.clone())?;
            }
        }
        Ok(op)
    }

    pub fn with_dimension(
        mut self,
        dimension: Dimension,
        matrix: StochasticMatrix,
    ) -> Result<Self, ConfigurationError> {
        matrix.validate(dimension)?;
        self.matrices[dimension.axis()] = if matrix.is_identity() {
            None
        } else {
            Some(matrix)
        };
        Ok(self)
    }

    pub fn is_identity(&self) -> bool {
        self.matrices.iter().all(Option::is_none)
    }

    pub fn matrix(&self, dimension: Dimension) -> Option<&StochasticMatrix> {
        self.matrices[dimension.axis()].as_ref()
    }

    /// Moves every unit of `counts` through the joint transition.
    pub fn transition(&self, counts: &[f64]) -> Vec<f64> {
        if self.is_identity() {
            return counts.to_vec();
        }
        let idx = segment_index();
        let mut cells = idx.expand(counts);
        if let Some(m) = self.matrix(Dimension::Activity) {
            cells = apply_axis(&cells, Dimension::Activity, m, |cell| {
                idx.is_engaged_cell(cell)
            });
        }
        for dim in Dimension::ALL {
            if dim == Dimension::Activity {
                continue;
            }
            if let Some(m) = self.matrix(dim) {
                cells = apply_axis(&cells, dim, m, |_| true);
            }
        }
        idx.compress(&cells)
    }
}

fn apply_axis(
    cells: &[f64],
    dimension: Dimension,
    matrix: &StochasticMatrix,
    eligible: impl Fn(usize) -> bool,
) -> Vec<f64> {
    let axis = dimension.axis();
    let (stride, size) = (STRIDES[axis], SHAPE[axis]);
    let mut out = vec![0.0; CELL_COUNT];
    for (cell, &mass) in cells.iter().enumerate() {
        if mass == 0.0 {
            continue;
        }
        if !eligible(cell) {
            out[cell] += mass;
            continue;
        }
        let from = (cell / stride) % size;
        let base = cell - from * stride;
        for (to, &p) in matrix.row(from).iter().enumerate() {
            if p != 0.0 {
                out[base + to * stride] += mass * p;
            }
        }
    }
    out
}

/// A media effect for one step: a fraction `reach[i]` of segment `i`
/// transitions under `operator`, the rest stays put.
#[derive(Clone, Debug)]
pub struct Perturbation<'a> {
    pub operator: &'a TransitionOperator,
    pub reach: Vec<f64>,
}

impl<'a> Perturbation<'a> {
    /// A perturbation that reaches nobody.
    pub fn none(operator: &'a TransitionOperator) -> Self {
        Self {
            operator,
            reach: vec![0.0; segment_index().len()],
        }
    }
}

#[derive(Clone, Debug)]
enum Stage<'a> {
    Full(&'a TransitionOperator),
    Mixed(Perturbation<'a>),
}

/// Ordered sequence of stages for one time step.
#[derive(Clone, Debug)]
pub struct ComposedOperator<'a> {
    stages: Vec<Stage<'a>>,
}

/// Correction applied when an application lost or created mass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassCorrection {
    pub expected: f64,
    pub observed: f64,
    pub clipped_negative: f64,
}

/// Composes `base` with `perturbations`, applied in exactly the given order
/// after `base`.
pub fn compose<'a>(
    base: &'a TransitionOperator,
    perturbations: impl IntoIterator<Item = Perturbation<'a>>,
) -> ComposedOperator<'a> {
    let mut stages = vec![Stage::Full(base)];
    stages.extend(perturbations.into_iter().map(Stage::Mixed));
    ComposedOperator { stages }
}

impl ComposedOperator<'_> {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Applies every stage in order. Returns the new state and, when the
    /// result had to be clipped or rescaled, the correction made.
    pub fn apply(&self, state: &PopulationState) -> (PopulationState, Option<MassCorrection>) {
        let expected = state.total();
        let mut counts = state.counts().to_vec();
        for stage in &self.stages {
            counts = match stage {
                Stage::Full(op) => op.transition(&counts),
                Stage::Mixed(p) => mix(&counts, p),
            };
        }

        let mut clipped_negative = 0.0;
        for v in counts.iter_mut() {
            if *v < 0.0 || !v.is_finite() {
                clipped_negative += if v.is_finite() { -*v } else { 0.0 };
                *v = 0.0;
            }
        }
        let observed: f64 = counts.iter().sum();
        let drift = (observed - expected).abs();
        let correction = if drift > MASS_TOLERANCE * expected.max(1.0) || clipped_negative > 0.0 {
            if observed > 0.0 {
                let scale = expected / observed;
                counts.iter_mut().for_each(|v| *v *= scale);
            }
            Some(MassCorrection {
                expected,
                observed,
                clipped_negative,
            })
        } else {
            None
        };
        (PopulationState::from_raw(counts), correction)
    }
}

fn mix(counts: &[f64], p: &Perturbation<'_>) -> Vec<f64> {
    if p.operator.is_identity() || p.reach.iter().all(|&r| r == 0.0) {
        return counts.to_vec();
    }
    let reached: Vec<f64> = counts
        .iter()
        .zip(&p.reach)
        .map(|(&m, &r)| m * r.clamp(0.0, 1.0))
        .collect();
    let moved = p.operator.transition(&reached);
    counts
        .iter()
        .zip(&reached)
        .zip(moved)
        .map(|((&m, &r), mv)| (m - r) + mv)
        .collect()
}

/// Applies a single operator to a state with no perturbations.
pub fn apply(operator: &TransitionOperator, state: &PopulationState) -> PopulationState {
    compose(operator, std::iter::empty()).apply(state).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dims::{Activity, Favorability, Loyalty, Market, Satiation};
    use crate::segment::Segment;
    use proptest::prelude::*;

    fn uniform_state(mass: f64) -> PopulationState {
        PopulationState::from_counts(vec![mass; segment_index().len()]).unwrap()
    }

    fn leave_market() -> StochasticMatrix {
        StochasticMatrix::new(vec![vec![0.7, 0.3], vec![0.1, 0.9]])
    }

    fn funnel() -> StochasticMatrix {
        StochasticMatrix::new(vec![
            vec![0.6, 0.3, 0.1],
            vec![0.2, 0.5, 0.3],
            vec![0.5, 0.2, 0.3],
        ])
    }

    #[test]
    fn identity_operator_leaves_state_bit_identical() {
        let counts: Vec<f64> = (0..segment_index().len()).map(|i| (i as f64).sqrt()).collect();
        let state = PopulationState::from_counts(counts).unwrap();
        let mut m = DimensionMatrices::default();
        for dim in Dimension::ALL {
            m.set(dim, StochasticMatrix::identity(dim.size()));
        }
        let op = TransitionOperator::from_matrices(&m).unwrap();
        assert!(op.is_identity());
        assert_eq!(apply(&op, &state), state);
    }

    #[test]
    fn activity_only_moves_engaged_consumers() {
        let op = TransitionOperator::identity()
            .with_dimension(Dimension::Activity, funnel())
            .unwrap();
        let state = uniform_state(10.0);
        let next = apply(&op, &state);
        let out = |s: &PopulationState| s.mass_where(|seg| seg.market == Market::OutOfMarket);
        assert!((out(&next) - out(&state)).abs() < 1e-9);
        let purchase_before = state.purchasers();
        let purchase_after = next.purchasers();
        assert!((purchase_before - purchase_after).abs() > 1e-6);
    }

    #[test]
    fn leaving_market_resets_activity() {
        let op = TransitionOperator::identity()
            .with_dimension(Dimension::Market, leave_market())
            .unwrap();
        let seg = Segment {
            market: Market::InMarket,
            satiation: Satiation::Unsatiated,
            activity: Activity::Purchase,
            favorability: Favorability::Favorable,
            loyalty: Loyalty::Loyal,
            availability: crate::dims::Availability::Average,
        };
        let mut counts = vec![0.0; segment_index().len()];
        counts[segment_index().position(&seg).unwrap()] = 100.0;
        let next = apply(&op, &PopulationState::from_counts(counts).unwrap());
        assert!((next.mass_of(&seg) - 70.0).abs() < 1e-9);
        let left = Segment {
            market: Market::OutOfMarket,
            activity: Activity::Inactive,
            ..seg
        };
        assert!((next.mass_of(&left) - 30.0).abs() < 1e-9);
        assert!((next.total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn losing_favorability_drops_loyalty() {
        let down = StochasticMatrix::new(vec![
            vec![1.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.5, 0.5],
        ]);
        let op = TransitionOperator::identity()
            .with_dimension(Dimension::Favorability, down)
            .unwrap();
        let state = uniform_state(1.0);
        let next = apply(&op, &state);
        let loyal = |s: &PopulationState| s.mass_where(|seg| seg.loyalty == Loyalty::Loyal);
        assert!((loyal(&next) - 0.5 * loyal(&state)).abs() < 1e-9);
        assert!((next.total() - state.total()).abs() < 1e-9);
    }

    #[test]
    fn composition_order_is_preserved() {
        let to_favorable = StochasticMatrix::new(vec![vec![0.0, 0.0, 0.0, 0.0, 1.0]; 5]);
        let to_unaware = StochasticMatrix::new(vec![vec![1.0, 0.0, 0.0, 0.0, 0.0]; 5]);
        let up = TransitionOperator::identity()
            .with_dimension(Dimension::Favorability, to_favorable)
            .unwrap();
        let down = TransitionOperator::identity()
            .with_dimension(Dimension::Favorability, to_unaware)
            .unwrap();
        let base = TransitionOperator::identity();
        let all = vec![1.0; segment_index().len()];
        let state = uniform_state(1.0);
        let a = compose(
            &base,
            [
                Perturbation { operator: &up, reach: all.clone() },
                Perturbation { operator: &down, reach: all.clone() },
            ],
        )
        .apply(&state)
        .0;
        let b = compose(
            &base,
            [
                Perturbation { operator: &down, reach: all.clone() },
                Perturbation { operator: &up, reach: all },
            ],
        )
        .apply(&state)
        .0;
        let fav = |s: &PopulationState| s.mass_where(|seg| seg.favorability == Favorability::Favorable);
        assert_eq!(fav(&a), 0.0);
        assert!((fav(&b) - state.total()).abs() < 1e-9);
    }

    #[test]
    fn zero_reach_perturbation_is_a_no_op() {
        let op = TransitionOperator::identity()
            .with_dimension(Dimension::Market, leave_market())
            .unwrap();
        let base = TransitionOperator::identity();
        let state = uniform_state(3.0);
        let (next, correction) = compose(&base, [Perturbation::none(&op)]).apply(&state);
        assert_eq!(next, state);
        assert!(correction.is_none());
    }

    proptest! {
        #[test]
        fn mass_is_conserved_under_composition(
            p in 0.0f64..=1.0,
            q in 0.0f64..=1.0,
            a in 0.0f64..=1.0,
            reach in 0.0f64..=1.0,
            seed_mass in 0.1f64..1000.0,
        ) {
            let base = TransitionOperator::identity()
                .with_dimension(Dimension::Market, StochasticMatrix::new(vec![vec![p, 1.0 - p], vec![q, 1.0 - q]]))
                .unwrap()
                .with_dimension(Dimension::Activity, StochasticMatrix::new(vec![
                    vec![1.0 - a, a, 0.0],
                    vec![0.0, 1.0 - a, a],
                    vec![a, 0.0, 1.0 - a],
                ]))
                .unwrap();
            let media = TransitionOperator::identity()
                .with_dimension(Dimension::Satiation, StochasticMatrix::new(vec![vec![q, 1.0 - q], vec![p, 1.0 - p]]))
                .unwrap();
            let state = uniform_state(seed_mass);
            let (next, _) = compose(&base, [Perturbation { operator: &media, reach: vec![reach; segment_index().len()] }]).apply(&state);
            prop_assert!((next.total() - state.total()).abs() <= 1e-9 * state.total());
            prop_assert!(next.counts().iter().all(|&m| m >= 0.0));
        }
    }
}
