//! Segment enumeration and the process-wide segment index.
//!
//! The full dimension product has 540 cells. Only 198 of them are
//! structurally valid; those are the segments the population vector is
//! indexed by. Invalid cells project onto a canonical valid cell, which is
//! how every transition keeps them at zero mass.

use crate::dims::{Activity, Availability, Dimension, Favorability, Loyalty, Market, Satiation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Axis sizes of the cell array, in `Dimension::ALL` order.
pub const SHAPE: [usize; Dimension::COUNT] = [2, 2, 3, 5, 3, 3];
/// Row-major strides of the cell array.
pub const STRIDES: [usize; Dimension::COUNT] = [270, 135, 45, 9, 3, 1];
/// Number of cells in the full dimension product.
pub const CELL_COUNT: usize = 540;
/// Number of structurally valid segments.
pub const SEGMENT_COUNT: usize = 198;

/// One combination of states across the six dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub market: Market,
    pub satiation: Satiation,
    pub activity: Activity,
    pub favorability: Favorability,
    pub loyalty: Loyalty,
    pub availability: Availability,
}

impl Segment {
    /// Axis coordinates in `Dimension::ALL` order.
    pub fn coords(&self) -> [usize; Dimension::COUNT] {
        [
            self.market.index(),
            self.satiation.index(),
            self.activity.index(),
            self.favorability.index(),
            self.loyalty.index(),
            self.availability.index(),
        ]
    }

    /// Builds a segment from in-range axis coordinates.
    pub fn from_coords(c: [usize; Dimension::COUNT]) -> Self {
        Self {
            market: Market::ALL[c[0]],
            satiation: Satiation::ALL[c[1]],
            activity: Activity::ALL[c[2]],
            favorability: Favorability::ALL[c[3]],
            loyalty: Loyalty::ALL[c[4]],
            availability: Availability::ALL[c[5]],
        }
    }

    /// In-market and unsatiated: the only place funnel activity is tracked.
    pub fn is_engaged(&self) -> bool {
        self.market == Market::InMarket && self.satiation == Satiation::Unsatiated
    }

    pub fn is_valid(&self) -> bool {
        (self.is_engaged() || self.activity == Activity::Inactive)
            && (self.loyalty != Loyalty::Loyal || self.favorability == Favorability::Favorable)
    }

    /// Nearest valid segment: activity resets to inactive outside the
    /// engaged states, loyalty falls back to switcher without a favorable opinion.
    pub fn canonical(mut self) -> Self {
        if !self.is_engaged() {
            self.activity = Activity::Inactive;
        }
        if self.loyalty == Loyalty::Loyal && self.favorability != Favorability::Favorable {
            self.loyalty = Loyalty::Switcher;
        }
        self
    }

    pub fn cell(&self) -> usize {
        self.coords()
            .iter()
            .zip(STRIDES.iter())
            .map(|(c, s)| c * s)
            .sum()
    }

    pub fn from_cell(cell: usize) -> Self {
        let mut c = [0usize; Dimension::COUNT];
        for (axis, coord) in c.iter_mut().enumerate() {
            *coord = (cell / STRIDES[axis]) % SHAPE[axis];
        }
        Self::from_coords(c)
    }
}

/// Immutable lookup between cells and segment positions.
#[derive(Debug)]
pub struct SegmentIndex {
    segments: Vec<Segment>,
    segment_of_cell: Vec<Option<usize>>,
    cell_of_segment: Vec<usize>,
    /// For every cell, the segment position its mass projects onto.
    target_of_cell: Vec<usize>,
    engaged_cell: Vec<bool>,
}

static INDEX: OnceLock<SegmentIndex> = OnceLock::new();

/// The shared segment index, built on first use.
pub fn segment_index() -> &'static SegmentIndex {
    INDEX.get_or_init(SegmentIndex::build)
}

impl SegmentIndex {
    fn build() -> Self {
        let mut segments = Vec::with_capacity(SEGMENT_COUNT);
        let mut segment_of_cell = vec![None; CELL_COUNT];
        let mut cell_of_segment = Vec::with_capacity(SEGMENT_COUNT);
        let mut engaged_cell = vec![false; CELL_COUNT];
        for (cell, slot) in segment_of_cell.iter_mut().enumerate() {
            let seg = Segment::from_cell(cell);
            engaged_cell[cell] = seg.is_engaged();
            if seg.is_valid() {
                *slot = Some(segments.len());
                segments.push(seg);
                cell_of_segment.push(cell);
            }
        }
        let target_of_cell = (0..CELL_COUNT)
            .map(|cell| {
                let canon = Segment::from_cell(cell).canonical().cell();
                segment_of_cell[canon].unwrap_or_default()
            })
            .collect();
        Self {
            segments,
            segment_of_cell,
            cell_of_segment,
            target_of_cell,
            engaged_cell,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, position: usize) -> Segment {
        self.segments[position]
    }

    /// Position of a segment, or `None` when it is structurally invalid.
    pub fn position(&self, segment: &Segment) -> Option<usize> {
        self.segment_of_cell[segment.cell()]
    }

    pub(crate) fn is_engaged_cell(&self, cell: usize) -> bool {
        self.engaged_cell[cell]
    }

    /// Scatters a segment vector into the full cell array.
    pub(crate) fn expand(&self, counts: &[f64]) -> Vec<f64> {
        let mut cells = vec![0.0; CELL_COUNT];
        for (pos, &mass) in counts.iter().enumerate() {
            cells[self.cell_of_segment[pos]] = mass;
        }
        cells
    }

    /// Gathers a cell array back into segments, projecting invalid cells.
    pub(crate) fn compress(&self, cells: &[f64]) -> Vec<f64> {
        let mut counts = vec![0.0; self.segments.len()];
        for (cell, &mass) in cells.iter().enumerate() {
            if mass != 0.0 {
                counts[self.target_of_cell[cell]] += mass;
            }
        }
        counts
    }

    /// Per-segment product of per-dimension factors (`factors[axis][state]`).
    pub fn product_weights(&self, factors: &[&[f64]; Dimension::COUNT]) -> Vec<f64> {
        self.segments
            .iter()
            .map(|seg| {
                seg.coords()
                    .iter()
                    .enumerate()
                    .map(|(axis, &c)| factors[axis][c])
                    .product()
            })
            .collect()
    }

    /// Distributes `total` over the full product of per-dimension shares,
    /// projecting mass that lands on invalid cells.
    pub fn distribute(&self, total: f64, shares: &[&[f64]; Dimension::COUNT]) -> Vec<f64> {
        let cells: Vec<f64> = (0..CELL_COUNT)
            .map(|cell| {
                let c = Segment::from_cell(cell).coords();
                total * (0..Dimension::COUNT).map(|a| shares[a][c[a]]).product::<f64>()
            })
            .collect();
        self.compress(&cells)
    }
}
