//! Point and profile regridding: projects each sample, locates its 3-D cell,
//! and drives the [`AggregationMethod`] state machine.

use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{info, instrument};

use crate::cell::{AggregationMethod, Contribution};
use crate::config::RegridConfig;
use crate::error::{RegridError, Result};
use crate::grid::{locate_layer, Grid};

pub const BADVAL: f64 = -9.999e36;

/// Elevations closer together than this are treated as one collapsed
/// near-surface sample when hunting for a profile's true surface layer.
const COLLAPSED_ELEVATION_TOLERANCE_M: f64 = 1e-6;

/// One regrid call's point/profile inputs, borrowed for the call's duration.
/// The caller keeps ownership of the arrays; nothing here outlives the call.
pub struct PointRegridRequest<'a> {
    pub method: AggregationMethod,
    pub minimum_valid_value: f64,
    pub lon: &'a [f64],
    pub lat: &'a [f64],
    /// Levels per point; 1 for plain point data.
    pub levels: usize,
    /// `points * levels`, monotone elevation per point's profile.
    pub elevations: Option<&'a [f64]>,
    /// `points * levels`.
    pub data: &'a [f64],
    /// `points * levels`.
    pub data2: Option<&'a [f64]>,
    pub notes: Option<&'a [String]>,
}

impl<'a> PointRegridRequest<'a> {
    fn points(&self) -> usize {
        self.lon.len()
    }

    fn validate(&self, grid: &Grid) -> Result<()> {
        if self.lat.len() != self.lon.len() {
            return Err(RegridError::DimensionMismatch(
                "lon/lat arrays must have equal length".into(),
            ));
        }
        if self.levels == 0 {
            return Err(RegridError::InvalidArgument("levels must be >= 1".into()));
        }
        if self.data.len() != self.points() * self.levels {
            return Err(RegridError::DimensionMismatch(
                "data array must have length points * levels".into(),
            ));
        }
        if let Some(data2) = self.data2 {
            if data2.len() != self.data.len() {
                return Err(RegridError::DimensionMismatch(
                    "data2 array must have length points * levels".into(),
                ));
            }
        }
        if let Some(elevations) = self.elevations {
            if elevations.len() != self.data.len() {
                return Err(RegridError::DimensionMismatch(
                    "elevations array must have length points * levels".into(),
                ));
            }
        }
        if grid.vertical().is_none() && self.levels != 1 {
            return Err(RegridError::InvalidArgument(
                "multi-level profiles require a grid with a vertical model".into(),
            ));
        }
        if let Some(notes) = self.notes {
            if notes.len() != self.points() {
                return Err(RegridError::DimensionMismatch(
                    "notes array must have one entry per point".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Compact, dense output of [`Grid::regrid`]: one entry per non-empty cell,
/// with `BADVAL`-filled gaps for empty layers within a non-empty 3-D column
/// so per-column layer indices line up across a vertical profile.
#[derive(Debug, Clone, Default)]
pub struct PointRegridOutput {
    pub n: usize,
    pub column: Vec<usize>,
    pub row: Vec<usize>,
    pub layer: Option<Vec<usize>>,
    pub grid_lon: Vec<f64>,
    pub grid_lat: Vec<f64>,
    pub grid_z: Option<Vec<f64>>,
    pub data: Vec<f64>,
    pub data2: Option<Vec<f64>>,
    pub note: Option<Vec<String>>,
}

/// Per-worker scratch: the last surface elevation this worker computed edges
/// for, and the cached edges themselves. Recomputing a layer-edge schedule
/// from scratch for every point would dominate the hot loop when nearby
/// points share nearly the same terrain elevation, so each worker keeps its
/// own cache and only recomputes past a tolerance.
struct VerticalScratch {
    slots: Vec<Mutex<(f64, Vec<f64>)>>,
}

impl VerticalScratch {
    fn new(workers: usize, layers: usize) -> Self {
        let slots = (0..workers + 1)
            .map(|_| Mutex::new((f64::NAN, vec![0.0; layers + 1])))
            .collect();
        Self { slots }
    }

    fn edges_for(
        &self,
        worker: usize,
        surface_elevation: f64,
        threshold_m: f64,
        grid: &Grid,
    ) -> Result<Vec<f64>> {
        let slot = &self.slots[worker % self.slots.len()];
        let mut cached = slot.lock().expect("vertical scratch mutex poisoned");
        if !cached.0.is_finite() || (surface_elevation - cached.0).abs() > threshold_m {
            let model = grid
                .vertical()
                .expect("edges_for only called on grids with a vertical model");
            cached.1 = model.compute_edges(surface_elevation)?;
            cached.0 = surface_elevation;
        }
        Ok(cached.1.clone())
    }
}

/// Walk a profile from index 0, returning the index of the true surface
/// sample: the last of any run of near-duplicate elevations at the bottom
/// of the profile. Soundings sometimes repeat the surface reading at two or
/// three indices before climbing; treating only the last of that run as the
/// surface keeps the vertical binning from mistaking a repeated reading for
/// a second layer.
fn surface_index(elevations: &[f64]) -> usize {
    let mut idx = 0;
    while idx + 1 < elevations.len()
        && (elevations[idx + 1] - elevations[idx]).abs() <= COLLAPSED_ELEVATION_TOLERANCE_M
    {
        idx += 1;
    }
    idx
}

impl Grid {
    /// Project, bin, and aggregate scattered point/profile samples onto
    /// this grid. Runs the point loop data-parallel over a thread pool built
    /// from `config`; safe to call concurrently
    /// with other immutable `Grid` operations, but not with another call to
    /// `regrid`/`regrid_swath` on the same grid (both reset the cell slab).
    #[instrument(skip(self, request, config), fields(points = request.points(), method = ?request.method))]
    pub fn regrid(
        &self,
        request: &PointRegridRequest<'_>,
        config: &RegridConfig,
    ) -> Result<PointRegridOutput> {
        request.validate(self)?;
        config.validate().map_err(RegridError::InvalidArgument)?;

        self.reset_cells(request.minimum_valid_value);

        let points = request.points();
        let layers = self.layers();
        let has_vertical = self.vertical().is_some();

        let note_slabs: Vec<Mutex<Vec<Option<String>>>> = (0..self.rows() * self.columns())
            .map(|_| Mutex::new(vec![None; layers]))
            .collect();

        let pool = config
            .build_thread_pool()
            .map_err(|e| RegridError::ResourceError(format!("failed to build thread pool: {e}")))?;
        let workers = pool.current_num_threads();
        let scratch = VerticalScratch::new(workers, layers);

        pool.install(|| -> Result<()> {
            (0..points).into_par_iter().try_for_each(|i| -> Result<()> {
                let (lon, lat) = (request.lon[i], request.lat[i]);
                let Ok((x, y)) = self.projection().project(lon, lat) else {
                    return Ok(());
                };
                let Some((column, row, x_offset, y_offset)) = self.locate_xy(x, y) else {
                    return Ok(());
                };

                let base = i * request.levels;
                let data_slice = &request.data[base..base + request.levels];
                let elevations_slice = request.elevations.map(|e| &e[base..base + request.levels]);
                let data2_slice = request.data2.map(|d| &d[base..base + request.levels]);
                let note = request.notes.map(|n| n[i].clone());

                if !has_vertical {
                    let contribution = Contribution {
                        data: data_slice[0],
                        data2: data2_slice.map(|d| d[0]),
                        x_offset,
                        y_offset,
                        z_offset: 0.0,
                        elevation: 0.0,
                        surface_elevation: 0.0,
                    };
                    let valid = contribution.data >= request.minimum_valid_value;
                    let mut stack = self.lock_column(row, column);
                    request.method.contribute(
                        &mut stack[0],
                        contribution,
                        config.radius_sq_tolerance,
                    );
                    if valid {
                        if let Some(note) = &note {
                            let mut slab = note_slabs[row * self.columns() + column]
                                .lock()
                                .expect("note slab mutex poisoned");
                            slab[0] = Some(note.clone());
                        }
                    }
                    return Ok(());
                }

                let elevations_slice = elevations_slice.ok_or_else(|| {
                    RegridError::InvalidArgument(
                        "profile data on a 3-D grid requires elevations".into(),
                    )
                })?;
                let surface_idx = surface_index(elevations_slice);
                let surface_elevation = elevations_slice[surface_idx];

                let worker = rayon::current_thread_index().unwrap_or(0);
                let z = scratch.edges_for(
                    worker,
                    surface_elevation,
                    config.vertical_recompute_threshold_m,
                    self,
                )?;

                let mut from_layer = 0usize;
                for level in surface_idx..request.levels {
                    let elevation = elevations_slice[level];
                    let located = locate_layer(&z, elevation, from_layer).or_else(|| {
                        // A single-level report sitting just below layer 1's lower
                        // edge (e.g. a surface station a few meters under the
                        // model's lowest half-sigma level) still belongs in layer
                        // 1 rather than being dropped as out-of-domain.
                        if request.levels == 1 && elevation >= 0.0 && elevation < z[0] {
                            Some((0, -1.0))
                        } else {
                            None
                        }
                    });
                    let Some((layer, z_offset)) = located else {
                        continue;
                    };
                    from_layer = layer;

                    let contribution = Contribution {
                        data: data_slice[level],
                        data2: data2_slice.map(|d| d[level]),
                        x_offset,
                        y_offset,
                        z_offset,
                        elevation,
                        surface_elevation,
                    };
                    let valid = contribution.data >= request.minimum_valid_value;
                    {
                        let mut stack = self.lock_column(row, column);
                        request.method.contribute(
                            &mut stack[layer],
                            contribution,
                            config.radius_sq_tolerance,
                        );
                    }
                    if valid {
                        if let Some(note) = &note {
                            let mut slab = note_slabs[row * self.columns() + column]
                                .lock()
                                .expect("note slab mutex poisoned");
                            slab[layer] = Some(note.clone());
                        }
                    }
                }
                Ok(())
            })
        })?;

        let output =
            self.compact_point_output(request.method, request.notes.is_some(), &note_slabs);
        info!(regridded_points = output.n, "point regrid complete");
        Ok(output)
    }

    fn compact_point_output(
        &self,
        method: AggregationMethod,
        has_notes: bool,
        note_slabs: &[Mutex<Vec<Option<String>>>],
    ) -> PointRegridOutput {
        let layers = self.layers();
        let emit_layer_index = layers > 1;
        let has_vertical = self.vertical().is_some();

        let mut out = PointRegridOutput {
            layer: if emit_layer_index {
                Some(Vec::new())
            } else {
                None
            },
            grid_z: if has_vertical { Some(Vec::new()) } else { None },
            data2: None,
            note: if has_notes { Some(Vec::new()) } else { None },
            ..Default::default()
        };
        let mut seen_data2 = false;

        for row in 0..self.rows() {
            for column in 0..self.columns() {
                let mut stack = self.lock_column(row, column);
                for cell in stack.iter_mut() {
                    method.post_aggregate(cell);
                }
                let any_nonempty = stack.iter().any(|c| !c.is_empty());
                if !any_nonempty {
                    continue;
                }
                let (lon, lat) = self.cell_center(row, column);
                let note_slab = note_slabs[row * self.columns() + column]
                    .lock()
                    .expect("note slab mutex poisoned");

                for (layer, cell) in stack.iter().enumerate() {
                    if layers > 1 && cell.is_empty() {
                        out.column.push(column + 1);
                        out.row.push(row + 1);
                        if let Some(l) = out.layer.as_mut() {
                            l.push(layer + 1);
                        }
                        out.grid_lon.push(lon);
                        out.grid_lat.push(lat);
                        if let Some(z) = out.grid_z.as_mut() {
                            z.push(BADVAL);
                        }
                        out.data.push(BADVAL);
                        if cell.data2.is_some() || seen_data2 {
                            seen_data2 = true;
                            out.data2.get_or_insert_with(Vec::new).push(BADVAL);
                        }
                        if let Some(notes) = out.note.as_mut() {
                            notes.push(String::new());
                        }
                        continue;
                    }
                    if cell.is_empty() {
                        continue;
                    }

                    out.column.push(column + 1);
                    out.row.push(row + 1);
                    if let Some(l) = out.layer.as_mut() {
                        l.push(layer + 1);
                    }
                    out.grid_lon.push(lon);
                    out.grid_lat.push(lat);
                    if let Some(z) = out.grid_z.as_mut() {
                        z.push(cell.elevation);
                    }
                    out.data.push(cell.data);
                    if let Some(d2) = cell.data2 {
                        seen_data2 = true;
                        out.data2.get_or_insert_with(Vec::new).push(d2);
                    } else if seen_data2 {
                        out.data2.get_or_insert_with(Vec::new).push(BADVAL);
                    }
                    if let Some(notes) = out.note.as_mut() {
                        notes.push(note_slab[layer].clone().unwrap_or_default());
                    }
                }
            }
        }

        out.n = out.column.len();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertical::{VerticalKind, VerticalModel};
    use projection::{Ellipsoid, Identity, Projection};

    fn identity_grid() -> Grid {
        let proj = Projection::Identity(Identity::new(Ellipsoid::WGS84));
        Grid::new(proj, 10, 10, -100.0, 30.0, 1.0, 1.0, 1, None).unwrap()
    }

    fn req<'a>(
        method: AggregationMethod,
        lon: &'a [f64],
        lat: &'a [f64],
        data: &'a [f64],
    ) -> PointRegridRequest<'a> {
        PointRegridRequest {
            method,
            minimum_valid_value: f64::MIN,
            lon,
            lat,
            levels: 1,
            elevations: None,
            data,
            data2: None,
            notes: None,
        }
    }

    #[test]
    fn s1_single_point_mean() {
        let grid = identity_grid();
        let lon = [-95.5];
        let lat = [35.5];
        let data = [42.0];
        let out = grid
            .regrid(
                &req(AggregationMethod::Mean, &lon, &lat, &data),
                &RegridConfig::default(),
            )
            .unwrap();
        assert_eq!(out.n, 1);
        assert_eq!(out.column[0], 5);
        assert_eq!(out.row[0], 6);
        assert_eq!(out.grid_lon[0], -95.5);
        assert_eq!(out.grid_lat[0], 35.5);
        assert_eq!(out.data[0], 42.0);
    }

    #[test]
    fn s2_two_points_one_cell_mean() {
        let grid = identity_grid();
        let lon = [-95.3, -95.7];
        let lat = [35.7, 35.2];
        let data = [10.0, 20.0];
        let out = grid
            .regrid(
                &req(AggregationMethod::Mean, &lon, &lat, &data),
                &RegridConfig::default(),
            )
            .unwrap();
        assert_eq!(out.n, 1);
        assert_eq!(out.column[0], 5);
        assert_eq!(out.row[0], 6);
        assert!((out.data[0] - 15.0).abs() < 1e-9);
    }

    #[test]
    fn vector_data2_component_averages_alongside_the_primary_component() {
        let grid = identity_grid();
        let lon = [-95.3, -95.7];
        let lat = [35.7, 35.2];
        let u = [10.0, 20.0];
        let v = [1.0, 3.0];
        let request = PointRegridRequest {
            method: AggregationMethod::Mean,
            minimum_valid_value: f64::MIN,
            lon: &lon,
            lat: &lat,
            levels: 1,
            elevations: None,
            data: &u,
            data2: Some(&v),
            notes: None,
        };
        let out = grid.regrid(&request, &RegridConfig::default()).unwrap();
        assert_eq!(out.n, 1);
        assert!((out.data[0] - 15.0).abs() < 1e-9);
        assert!((out.data2.unwrap()[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn s3_nearest_tiebreak_is_order_independent_under_shuffle() {
        // Deterministic "shuffle": run with both orderings and confirm the
        // first-listed writer always wins, regardless of thread
        // interleaving (points land in the same cell so the same lock
        // serializes them either way).
        for (lon, lat, data, expected) in [
            ([-95.6, -95.4], [35.6, 35.4], [1.0, 2.0], 1.0),
            ([-95.4, -95.6], [35.4, 35.6], [2.0, 1.0], 2.0),
        ] {
            let grid = identity_grid();
            let out = grid
                .regrid(
                    &req(AggregationMethod::Nearest, &lon, &lat, &data),
                    &RegridConfig::default(),
                )
                .unwrap();
            assert_eq!(out.n, 1);
            assert!((out.data[0] - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn s4_weighted_on_center_sample_dominates() {
        let grid = identity_grid();
        // -95.0 sits exactly on the column-5/column-6 boundary, which the
        // grid's floor-based addressing resolves to column 6's left edge
        // rather than column 5's right edge; nudge fractionally inward so
        // both points land in column 5.
        let lon = [-95.5, -95.01];
        let lat = [35.5, 35.5];
        let data = [100.0, 200.0];
        let out = grid
            .regrid(
                &req(AggregationMethod::Weighted, &lon, &lat, &data),
                &RegridConfig::default(),
            )
            .unwrap();
        assert_eq!(out.n, 1);
        assert!((out.data[0] - 100.0).abs() < 1e-6);
    }

    #[test]
    fn s5_out_of_domain_point_yields_zero_count() {
        let grid = identity_grid();
        let lon = [50.0];
        let lat = [0.0];
        let data = [1.0];
        let out = grid
            .regrid(
                &req(AggregationMethod::Mean, &lon, &lat, &data),
                &RegridConfig::default(),
            )
            .unwrap();
        assert_eq!(out.n, 0);
    }

    #[test]
    fn s6_profile_bins_across_two_layers() {
        let proj = Projection::Identity(Identity::new(Ellipsoid::WGS84));
        let vertical = VerticalModel::new(
            VerticalKind::Z,
            0.0,
            vec![0.0, 500.0, 1500.0],
            9.81,
            287.0,
            50.0,
            290.0,
            100000.0,
            0.0,
        )
        .unwrap();
        let grid = Grid::new(proj, 10, 10, -100.0, 30.0, 1.0, 1.0, 2, Some(vertical)).unwrap();

        let lon = [-95.5];
        let lat = [35.5];
        let elevations = [100.0, 600.0, 1400.0];
        let data = [1.0, 2.0, 3.0];
        let request = PointRegridRequest {
            method: AggregationMethod::Mean,
            minimum_valid_value: f64::MIN,
            lon: &lon,
            lat: &lat,
            levels: 3,
            elevations: Some(&elevations),
            data: &data,
            data2: None,
            notes: None,
        };
        let out = grid.regrid(&request, &RegridConfig::default()).unwrap();
        assert_eq!(out.n, 2);
        let layer = out.layer.unwrap();
        assert_eq!(layer, vec![1, 2]);
        assert!((out.data[0] - 1.0).abs() < 1e-9);
        assert!((out.data[1] - 2.5).abs() < 1e-9);
    }

    #[test]
    fn idempotent_regrid_on_fresh_reset() {
        let grid = identity_grid();
        let lon = [-95.5];
        let lat = [35.5];
        let data = [42.0];
        let request = req(AggregationMethod::Mean, &lon, &lat, &data);
        let config = RegridConfig::default();
        let first = grid.regrid(&request, &config).unwrap();
        let second = grid.regrid(&request, &config).unwrap();
        assert_eq!(first.data, second.data);
        assert_eq!(first.column, second.column);
    }
}
