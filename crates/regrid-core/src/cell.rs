//! Per-cell accumulator and the three aggregation policies.
//!
//! A single point contributes to the whole `max(1, layers)` column of cells
//! at one (row, column), so the engine locks one mutex per column (see
//! [`crate::grid::Grid`]) rather than one per cell. `Cell` itself is
//! therefore a plain accumulator record with no synchronization primitive
//! of its own.

/// Per-cell accumulator state.
///
/// State machine: `Empty -> Filled` (the first valid contribution, via
/// `pre_aggregate`) `-> Filled` (further valid contributions, via
/// `aggregate`) `-> Finalized` (via `post_aggregate`). Invalid
/// contributions (value below `minimum_valid_value`) are a no-op in every
/// state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub count: u64,
    pub column: usize,
    pub row: usize,
    pub layer: usize,
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
    /// Terrain elevation of the last sample to land in this cell.
    pub surface_elevation: f64,
    /// Squared distance-from-center of the current best contribution
    /// (Nearest) or the most recent contribution (Weighted uses it as the
    /// per-sample weight, not a running minimum).
    pub radius_sq: f64,
    pub data: f64,
    pub data2: Option<f64>,
    pub weight_sum: f64,
    pub minimum_valid_value: f64,
}

impl Cell {
    /// An empty accumulator at the given grid address, ready for
    /// `pre_aggregate`.
    pub fn empty(column: usize, row: usize, layer: usize, minimum_valid_value: f64) -> Self {
        Self {
            count: 0,
            column,
            row,
            layer,
            longitude: 0.0,
            latitude: 0.0,
            elevation: 0.0,
            surface_elevation: 0.0,
            radius_sq: 0.0,
            data: 0.0,
            data2: None,
            weight_sum: 0.0,
            minimum_valid_value,
        }
    }

    /// Reset this cell back to `Empty`, preserving its grid address and
    /// `minimum_valid_value` (used between regrid calls so the cell slab
    /// can be reused without reallocating).
    pub fn reset(&mut self) {
        let (column, row, layer, minimum_valid_value) =
            (self.column, self.row, self.layer, self.minimum_valid_value);
        *self = Cell::empty(column, row, layer, minimum_valid_value);
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// A single contribution to a cell: its value(s) and its normalized
/// cell-local offset in `[-1, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct Contribution {
    pub data: f64,
    pub data2: Option<f64>,
    pub x_offset: f64,
    pub y_offset: f64,
    pub z_offset: f64,
    /// Elevation (m) of this sample's grid layer, cached on the cell for
    /// output purposes.
    pub elevation: f64,
    pub surface_elevation: f64,
}

impl Contribution {
    fn radius_sq(&self, tolerance: f64) -> f64 {
        let r2 = self.x_offset * self.x_offset
            + self.y_offset * self.y_offset
            + self.z_offset * self.z_offset;
        r2.max(tolerance)
    }
}

/// The three aggregation policies, dispatched by `match` rather than a
/// vtable of function pointers, so the regrid loop can be specialized per
/// policy without the indirection or allocation a trait object would add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMethod {
    Nearest,
    Mean,
    Weighted,
}

impl AggregationMethod {
    /// Contribute one sample to `cell`: dispatches to `pre_aggregate` on the
    /// first valid contribution (`cell.count == 0`) and `aggregate`
    /// thereafter. Values below `cell.minimum_valid_value` are skipped
    /// entirely — they neither increment `count` nor overwrite stored
    /// values, in any state.
    pub fn contribute(self, cell: &mut Cell, sample: Contribution, radius_sq_tolerance: f64) {
        if sample.data < cell.minimum_valid_value {
            return;
        }
        cell.surface_elevation = sample.surface_elevation;
        cell.elevation = sample.elevation;
        if cell.is_empty() {
            self.pre_aggregate(cell, sample, radius_sq_tolerance);
        } else {
            self.aggregate(cell, sample, radius_sq_tolerance);
        }
    }

    fn pre_aggregate(self, cell: &mut Cell, sample: Contribution, tol: f64) {
        match self {
            AggregationMethod::Nearest => {
                cell.data = sample.data;
                cell.data2 = sample.data2;
                cell.radius_sq = sample.radius_sq(tol);
                cell.count = 1;
            }
            AggregationMethod::Mean => {
                cell.data = sample.data;
                cell.data2 = sample.data2;
                cell.count = 1;
            }
            AggregationMethod::Weighted => {
                let weight = 1.0 / sample.radius_sq(tol);
                cell.weight_sum = weight;
                cell.data = sample.data * weight;
                cell.data2 = sample.data2.map(|d2| d2 * weight);
                cell.count = 1;
            }
        }
    }

    fn aggregate(self, cell: &mut Cell, sample: Contribution, tol: f64) {
        match self {
            AggregationMethod::Nearest => {
                let candidate_r2 = sample.radius_sq(tol);
                // Ties keep the first writer: strictly-less-than, never <=.
                if candidate_r2 < cell.radius_sq {
                    cell.data = sample.data;
                    cell.data2 = sample.data2;
                    cell.radius_sq = candidate_r2;
                }
                cell.count += 1;
            }
            AggregationMethod::Mean => {
                let n = cell.count as f64;
                cell.data = (cell.data * n + sample.data) / (n + 1.0);
                cell.data2 = match (cell.data2, sample.data2) {
                    (Some(existing), Some(new)) => Some((existing * n + new) / (n + 1.0)),
                    (existing, _) => existing,
                };
                cell.count += 1;
            }
            AggregationMethod::Weighted => {
                let weight = 1.0 / sample.radius_sq(tol);
                cell.data += sample.data * weight;
                cell.data2 = match (cell.data2, sample.data2) {
                    (Some(existing), Some(new)) => Some(existing + new * weight),
                    (existing, _) => existing,
                };
                cell.weight_sum += weight;
                cell.count += 1;
            }
        }
    }

    /// Finalize a cell after all contributions have landed: Weighted
    /// divides by the accumulated weight sum; Nearest and Mean are already
    /// in their final form (identity).
    pub fn post_aggregate(self, cell: &mut Cell) {
        if self == AggregationMethod::Weighted && cell.weight_sum > 0.0 {
            cell.data /= cell.weight_sum;
            if let Some(d2) = cell.data2 {
                cell.data2 = Some(d2 / cell.weight_sum);
            }
        }
    }
}
