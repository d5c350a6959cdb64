//! Quadrilateral (swath) regridding: bins a scanning instrument's polygonal
//! footprints over the cells their planar projection covers, weighting each
//! cell's contribution by the clipped overlap area.

use rayon::prelude::*;
use tracing::{info, instrument};

use crate::cell::AggregationMethod;
use crate::error::{RegridError, Result};
use crate::geometry::{bounding_box, clip_to_rect, polygon_area, reorder_counterclockwise, Rect};
use crate::grid::Grid;

/// Smallest clipped-overlap area treated as non-degenerate; quads entirely
/// outside a cell, or with zero planar area themselves, contribute nothing.
const MIN_AREA: f64 = 1e-12;

/// One regrid call's swath inputs: `quads` corners are borrowed per-scan as
/// `[(lon, lat); 4]`.
pub struct SwathRegridRequest<'a> {
    pub method: AggregationMethod,
    pub minimum_valid_value: f64,
    pub corners: &'a [[(f64, f64); 4]],
    pub data: &'a [f64],
}

/// Dense running accumulator for one grid cell during swath binning: either
/// a `(value, area)` running sum (Weighted) or a `(value, count)` running
/// sum (Mean), plus a mutex per column is reused from [`Grid`].
#[derive(Debug, Clone, Copy, Default)]
struct SwathCell {
    sum: f64,
    weight: f64,
}

/// Compact output of [`Grid::regrid_swath`]: one entry per non-empty cell.
#[derive(Debug, Clone, Default)]
pub struct SwathRegridOutput {
    pub n: usize,
    pub column: Vec<usize>,
    pub row: Vec<usize>,
    pub grid_lon: Vec<f64>,
    pub grid_lat: Vec<f64>,
    pub data: Vec<f64>,
}

impl<'a> SwathRegridRequest<'a> {
    fn validate(&self) -> Result<()> {
        if self.corners.len() != self.data.len() {
            return Err(RegridError::DimensionMismatch(
                "corners and data arrays must have equal length".into(),
            ));
        }
        if !matches!(
            self.method,
            AggregationMethod::Mean | AggregationMethod::Weighted
        ) {
            return Err(RegridError::InvalidArgument(
                "swath regridding supports only mean and weighted aggregation".into(),
            ));
        }
        Ok(())
    }
}

impl Grid {
    /// Bin a set of swath quadrilaterals onto this grid. Quads whose four
    /// corners fail to project (e.g. a pole inside the footprint) or that
    /// clip to zero area are skipped; quads straddling the antimeridian are
    /// handled by the planar counter-clockwise reorder rather than a
    /// special case.
    #[instrument(skip(self, request), fields(quads = request.corners.len(), method = ?request.method))]
    pub fn regrid_swath(&self, request: &SwathRegridRequest<'_>) -> Result<SwathRegridOutput> {
        request.validate()?;

        let rows = self.rows();
        let columns = self.columns();
        let accumulators: Vec<std::sync::Mutex<SwathCell>> = (0..rows * columns)
            .map(|_| std::sync::Mutex::new(SwathCell::default()))
            .collect();

        let cell_width = self.cell_width;
        let cell_height = self.cell_height;
        let west = self.west_edge;
        let south = self.south_edge;

        request
            .corners
            .par_iter()
            .zip(request.data.par_iter())
            .try_for_each(|(lonlat_corners, &value)| -> Result<()> {
                if value < request.minimum_valid_value {
                    return Ok(());
                }

                let mut planar = [(0.0, 0.0); 4];
                for (i, &(lon, lat)) in lonlat_corners.iter().enumerate() {
                    match self.projection().project(lon, lat) {
                        Ok(xy) => planar[i] = xy,
                        Err(_) => return Ok(()),
                    }
                }
                reorder_counterclockwise(&mut planar);

                let quad_bbox = bounding_box(&planar);
                if polygon_area(&planar) < MIN_AREA {
                    return Ok(());
                }

                let first_column =
                    ((quad_bbox.x_min - west) / cell_width).floor().max(0.0) as usize;
                let last_column = (((quad_bbox.x_max - west) / cell_width).floor() as isize)
                    .clamp(0, columns as isize - 1) as usize;
                let first_row = ((quad_bbox.y_min - south) / cell_height).floor().max(0.0) as usize;
                let last_row = (((quad_bbox.y_max - south) / cell_height).floor() as isize)
                    .clamp(0, rows as isize - 1) as usize;
                if first_column >= columns || first_row >= rows {
                    return Ok(());
                }

                for row in first_row..=last_row.min(rows - 1) {
                    for column in first_column..=last_column.min(columns - 1) {
                        let cell_rect = Rect {
                            x_min: west + column as f64 * cell_width,
                            x_max: west + (column + 1) as f64 * cell_width,
                            y_min: south + row as f64 * cell_height,
                            y_max: south + (row + 1) as f64 * cell_height,
                        };
                        if !cell_rect.intersects(&quad_bbox) {
                            continue;
                        }
                        let clipped = clip_to_rect(&planar, &cell_rect);
                        let area = polygon_area(&clipped);
                        if area < MIN_AREA {
                            continue;
                        }

                        let (sum_delta, weight_delta) = match request.method {
                            AggregationMethod::Weighted => (value * area, area),
                            AggregationMethod::Mean => (value, 1.0),
                            AggregationMethod::Nearest => unreachable!("validated above"),
                        };
                        let mut acc = accumulators[row * columns + column]
                            .lock()
                            .expect("swath accumulator mutex poisoned");
                        acc.sum += sum_delta;
                        acc.weight += weight_delta;
                    }
                }
                Ok(())
            })?;

        let mut out = SwathRegridOutput::default();
        for row in 0..rows {
            for column in 0..columns {
                let acc = accumulators[row * columns + column]
                    .lock()
                    .expect("swath accumulator mutex poisoned");
                if acc.weight <= 0.0 {
                    continue;
                }
                let mean = acc.sum / acc.weight;
                if mean < request.minimum_valid_value {
                    continue;
                }
                let (lon, lat) = self.cell_center(row, column);
                out.column.push(column + 1);
                out.row.push(row + 1);
                out.grid_lon.push(lon);
                out.grid_lat.push(lat);
                out.data.push(mean);
            }
        }
        out.n = out.column.len();
        info!(regridded_cells = out.n, "swath regrid complete");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::{Ellipsoid, Identity, Projection};

    fn identity_grid() -> Grid {
        let proj = Projection::Identity(Identity::new(Ellipsoid::WGS84));
        Grid::new(proj, 10, 10, -100.0, 30.0, 1.0, 1.0, 1, None).unwrap()
    }

    fn quad(lon_center: f64, lat_center: f64, half_width: f64) -> [(f64, f64); 4] {
        [
            (lon_center - half_width, lat_center - half_width),
            (lon_center + half_width, lat_center - half_width),
            (lon_center + half_width, lat_center + half_width),
            (lon_center - half_width, lat_center + half_width),
        ]
    }

    #[test]
    fn quad_fully_inside_one_cell_contributes_its_value() {
        let grid = identity_grid();
        let corners = [quad(-95.5, 35.5, 0.1)];
        let data = [42.0];
        let request = SwathRegridRequest {
            method: AggregationMethod::Weighted,
            minimum_valid_value: f64::MIN,
            corners: &corners,
            data: &data,
        };
        let out = grid.regrid_swath(&request).unwrap();
        assert_eq!(out.n, 1);
        assert_eq!(out.column[0], 5);
        assert_eq!(out.row[0], 6);
        assert!((out.data[0] - 42.0).abs() < 1e-9);
    }

    #[test]
    fn quad_spanning_two_cells_splits_weighted_by_overlap_area() {
        let grid = identity_grid();
        // Spans columns 5 and 6 evenly: centered exactly on the boundary
        // at x = -95.0, half-width 0.5 degrees.
        let corners = [quad(-95.0, 35.5, 0.5)];
        let data = [100.0];
        let request = SwathRegridRequest {
            method: AggregationMethod::Weighted,
            minimum_valid_value: f64::MIN,
            corners: &corners,
            data: &data,
        };
        let out = grid.regrid_swath(&request).unwrap();
        assert_eq!(out.n, 2);
        for &d in &out.data {
            assert!((d - 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn degenerate_quad_is_skipped() {
        let grid = identity_grid();
        let corners = [[(-95.5, 35.5); 4]];
        let data = [1.0];
        let request = SwathRegridRequest {
            method: AggregationMethod::Mean,
            minimum_valid_value: f64::MIN,
            corners: &corners,
            data: &data,
        };
        let out = grid.regrid_swath(&request).unwrap();
        assert_eq!(out.n, 0);
    }

    #[test]
    fn mean_policy_averages_contributing_quads_unweighted_by_area() {
        let grid = identity_grid();
        let corners = [quad(-95.5, 35.5, 0.4), quad(-95.5, 35.5, 0.05)];
        let data = [10.0, 30.0];
        let request = SwathRegridRequest {
            method: AggregationMethod::Mean,
            minimum_valid_value: f64::MIN,
            corners: &corners,
            data: &data,
        };
        let out = grid.regrid_swath(&request).unwrap();
        assert_eq!(out.n, 1);
        assert!((out.data[0] - 20.0).abs() < 1e-9);
    }
}
