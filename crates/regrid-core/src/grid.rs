//! Rectilinear cell addressing, cached cell centers, and grid construction.

use std::sync::Mutex;

use projection::Projection;
use tracing::{info, instrument, warn};

use crate::cell::Cell;
use crate::error::{RegridError, Result};
use crate::vertical::VerticalModel;

/// A rectilinear cartographic grid: owns its projection, geometry, cached
/// cell-center lon/lat, optional vertical model, and the dense cell slab a
/// regrid call fills in.
pub struct Grid {
    pub(crate) projection: Projection,
    pub(crate) columns: usize,
    pub(crate) rows: usize,
    pub(crate) layers: usize,
    pub(crate) west_edge: f64,
    pub(crate) south_edge: f64,
    pub(crate) cell_width: f64,
    pub(crate) cell_height: f64,
    /// `cell_center_lonlat[row * columns + column]`, 0-based.
    pub(crate) cell_center_lonlat: Vec<(f64, f64)>,
    pub(crate) vertical: Option<VerticalModel>,
    /// Nominal (terrain-free) layer edges, used by `project_z` for profile
    /// data without an explicit surface elevation.
    pub(crate) nominal_z: Vec<f64>,
    /// One mutex per (row, column), each guarding the `max(1, layers)`
    /// cells stacked at that column — a point touches exactly one column,
    /// so one lock per column (not per cell) is sufficient and
    /// deadlock-free. Indexed `[row * columns + column]`, 0-based; the
    /// guarded `Vec<Cell>` is indexed by 0-based layer.
    pub(crate) columns_cells: Vec<Mutex<Vec<Cell>>>,
}

impl Grid {
    /// Construct a grid from a projection (ownership transferred) plus
    /// geometry parameters and an optional vertical model.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(projection, vertical), fields(projection = projection.name()))]
    pub fn new(
        projection: Projection,
        columns: usize,
        rows: usize,
        west_edge: f64,
        south_edge: f64,
        cell_width: f64,
        cell_height: f64,
        layers: usize,
        vertical: Option<VerticalModel>,
    ) -> Result<Self> {
        if columns == 0 || rows == 0 {
            let err = RegridError::InvalidArgument(
                "grid must have at least one row and one column".into(),
            );
            warn!(error = %err, "grid construction rejected");
            return Err(err);
        }
        if !cell_width.is_finite()
            || cell_width <= 0.0
            || !cell_height.is_finite()
            || cell_height <= 0.0
        {
            let err = RegridError::InvalidArgument(
                "cell_width and cell_height must be finite and positive".into(),
            );
            warn!(error = %err, "grid construction rejected");
            return Err(err);
        }
        if !west_edge.is_finite() || !south_edge.is_finite() {
            let err =
                RegridError::InvalidArgument("west_edge and south_edge must be finite".into());
            warn!(error = %err, "grid construction rejected");
            return Err(err);
        }
        let layers = layers.max(1);

        if rows
            .checked_mul(columns)
            .and_then(|rc| rc.checked_mul(layers))
            .is_none()
        {
            let err = RegridError::ResourceError("rows * columns * layers overflows".into());
            warn!(error = %err, "grid construction rejected");
            return Err(err);
        }

        let mut cell_center_lonlat = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                let x = west_edge + (column as f64 + 0.5) * cell_width;
                let y = south_edge + (row as f64 + 0.5) * cell_height;
                let (lon, lat) = projection.unproject(x, y).map_err(RegridError::from)?;
                let lat = if projection.ellipsoid().is_sphere() {
                    projection::sphere_to_geodetic_latitude(lat, &projection::Ellipsoid::WGS84)
                } else {
                    lat
                };
                cell_center_lonlat.push((lon, lat));
            }
        }

        let nominal_z = match &vertical {
            Some(model) => model.compute_edges(0.0)?,
            None => Vec::new(),
        };

        let mut columns_cells = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                let stack = (0..layers)
                    .map(|layer| Cell::empty(column + 1, row + 1, layer + 1, f64::MIN))
                    .collect();
                columns_cells.push(Mutex::new(stack));
            }
        }

        info!(rows, columns, layers, "grid constructed");

        Ok(Self {
            projection,
            columns,
            rows,
            layers,
            west_edge,
            south_edge,
            cell_width,
            cell_height,
            cell_center_lonlat,
            vertical,
            nominal_z,
            columns_cells,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn layers(&self) -> usize {
        self.layers
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn vertical(&self) -> Option<&VerticalModel> {
        self.vertical.as_ref()
    }

    pub fn cell_center(&self, row: usize, column: usize) -> (f64, f64) {
        self.cell_center_lonlat[row * self.columns + column]
    }

    /// Lock and return the cell stack at a 0-based (row, column) address.
    pub(crate) fn lock_column(
        &self,
        row: usize,
        column: usize,
    ) -> std::sync::MutexGuard<'_, Vec<Cell>> {
        self.columns_cells[row * self.columns + column]
            .lock()
            .expect("cell column mutex poisoned")
    }

    /// Reset every cell back to `Empty`, stamping the given
    /// `minimum_valid_value`. Called at the start of every regrid call so
    /// the cell slab can be reused across calls without reallocating.
    pub(crate) fn reset_cells(&self, minimum_valid_value: f64) {
        for column in &self.columns_cells {
            let mut stack = column.lock().expect("cell column mutex poisoned");
            for cell in stack.iter_mut() {
                cell.minimum_valid_value = minimum_valid_value;
                cell.reset();
            }
        }
    }

    /// Carve out a rectangular slab of (layer, row, column) ranges into a
    /// new grid with a cloned projection. Ranges are 1-based and inclusive,
    /// matching the rest of the public API's 1-based cell addressing.
    pub fn subset(
        &self,
        first_layer: usize,
        last_layer: usize,
        first_row: usize,
        last_row: usize,
        first_column: usize,
        last_column: usize,
    ) -> Result<Grid> {
        if first_layer == 0
            || first_row == 0
            || first_column == 0
            || last_layer > self.layers
            || last_row > self.rows
            || last_column > self.columns
            || first_layer > last_layer
            || first_row > last_row
            || first_column > last_column
        {
            return Err(RegridError::DimensionMismatch(format!(
                "subset range ({first_layer}..={last_layer}, {first_row}..={last_row}, {first_column}..={last_column}) outside parent grid ({}, {}, {})",
                self.layers, self.rows, self.columns
            )));
        }

        let rows = last_row - first_row + 1;
        let columns = last_column - first_column + 1;
        let layers = last_layer - first_layer + 1;

        let west_edge = self.west_edge + (first_column - 1) as f64 * self.cell_width;
        let south_edge = self.south_edge + (first_row - 1) as f64 * self.cell_height;

        let vertical = self.vertical.clone();
        Grid::new(
            self.projection.clone(),
            columns,
            rows,
            west_edge,
            south_edge,
            self.cell_width,
            self.cell_height,
            layers,
            vertical,
        )
    }

    /// Locate the 0-based (column, row) and centered offset in `[-1, 1]` for
    /// one planar coordinate, including the east/north-edge clamp: a point
    /// landing exactly on the grid's east or north boundary belongs to the
    /// last column/row rather than falling out of domain.
    pub(crate) fn locate_xy(&self, x: f64, y: f64) -> Option<(usize, usize, f64, f64)> {
        let fx = (x - self.west_edge) * (1.0 / self.cell_width) + 1.0;
        let fy = (y - self.south_edge) * (1.0 / self.cell_height) + 1.0;
        if !(fx.is_finite() && fy.is_finite()) {
            return None;
        }

        let mut column = fx.floor() as i64;
        if column < 1 {
            return None;
        }
        let x_offset;
        if column as usize > self.columns {
            if column as usize == self.columns + 1 && (fx - self.columns as f64 - 1.0).abs() < 1e-9
            {
                column = self.columns as i64;
                x_offset = 1.0;
            } else {
                return None;
            }
        } else {
            x_offset = 2.0 * (fx - column as f64 - 0.5);
        }

        let mut row = fy.floor() as i64;
        if row < 1 {
            return None;
        }
        let y_offset;
        if row as usize > self.rows {
            if row as usize == self.rows + 1 && (fy - self.rows as f64 - 1.0).abs() < 1e-9 {
                row = self.rows as i64;
                y_offset = 1.0;
            } else {
                return None;
            }
        } else {
            y_offset = 2.0 * (fy - row as f64 - 0.5);
        }

        Some((column as usize - 1, row as usize - 1, x_offset, y_offset))
    }

    /// Project each (lon, lat) pair to 1-based (column, row) and centered
    /// offsets in `[-1, 1]`. Points outside the grid's planar rectangle get
    /// the "missed" sentinel (column = row = 0). Safe to call with disjoint
    /// output slices from multiple threads.
    pub fn project_xy(&self, lons: &[f64], lats: &[f64]) -> Result<ProjectXyResult> {
        if lons.len() != lats.len() {
            return Err(RegridError::DimensionMismatch(
                "lon/lat arrays must have equal length".into(),
            ));
        }
        let n = lons.len();
        let mut result = ProjectXyResult::zeroed(n);
        let mut n_in_domain = 0usize;
        for i in 0..n {
            let Ok((x, y)) = self.projection.project(lons[i], lats[i]) else {
                continue;
            };
            let Some((column, row, x_offset, y_offset)) = self.locate_xy(x, y) else {
                continue;
            };
            result.column[i] = column + 1;
            result.row[i] = row + 1;
            result.x_offset[i] = x_offset;
            result.y_offset[i] = y_offset;
            let (clon, clat) = self.cell_center(row, column);
            result.grid_lon[i] = clon;
            result.grid_lat[i] = clat;
            n_in_domain += 1;
        }
        result.n_in_domain = n_in_domain;
        Ok(result)
    }

    /// Locate each elevation in the nominal (terrain-free) layer stack,
    /// used only for profile data without an explicit surface elevation.
    pub fn project_z(&self, elevations: &[f64]) -> Result<ProjectZResult> {
        let model = self
            .vertical
            .as_ref()
            .ok_or_else(|| RegridError::InvalidArgument("grid has no vertical model".into()))?;
        let _ = model;
        let n = elevations.len();
        let mut result = ProjectZResult::zeroed(n);
        let mut n_in_domain = 0usize;
        for (i, &elevation) in elevations.iter().enumerate() {
            if let Some((layer, z_offset)) = locate_layer(&self.nominal_z, elevation, 0) {
                result.layer[i] = layer + 1;
                result.z_offset[i] = z_offset;
                result.grid_z[i] = elevation;
                n_in_domain += 1;
            }
        }
        result.n_in_domain = n_in_domain;
        Ok(result)
    }
}

/// Dense output of [`Grid::project_xy`].
#[derive(Debug, Clone)]
pub struct ProjectXyResult {
    pub column: Vec<usize>,
    pub row: Vec<usize>,
    pub x_offset: Vec<f64>,
    pub y_offset: Vec<f64>,
    pub grid_lon: Vec<f64>,
    pub grid_lat: Vec<f64>,
    pub n_in_domain: usize,
}

impl ProjectXyResult {
    fn zeroed(n: usize) -> Self {
        Self {
            column: vec![0; n],
            row: vec![0; n],
            x_offset: vec![0.0; n],
            y_offset: vec![0.0; n],
            grid_lon: vec![0.0; n],
            grid_lat: vec![0.0; n],
            n_in_domain: 0,
        }
    }
}

/// Dense output of [`Grid::project_z`].
#[derive(Debug, Clone)]
pub struct ProjectZResult {
    pub layer: Vec<usize>,
    pub z_offset: Vec<f64>,
    pub grid_z: Vec<f64>,
    pub n_in_domain: usize,
}

impl ProjectZResult {
    fn zeroed(n: usize) -> Self {
        Self {
            layer: vec![0; n],
            z_offset: vec![0.0; n],
            grid_z: vec![0.0; n],
            n_in_domain: 0,
        }
    }
}

/// Locate `elevation` within `z` (strictly increasing layer edges) starting
/// the linear search from `from_layer` (profiles are monotone, so
/// subsequent samples only ever search forward). Returns the 0-based layer
/// index and the centered `z_offset` in `[-1, 1]`, or `None` if outside
/// `[z[0], z[last]]`.
pub(crate) fn locate_layer(z: &[f64], elevation: f64, from_layer: usize) -> Option<(usize, f64)> {
    if z.len() < 2 || !elevation.is_finite() {
        return None;
    }
    let layers = z.len() - 1;
    for layer in from_layer.min(layers.saturating_sub(1))..layers {
        let (lo, hi) = (z[layer], z[layer + 1]);
        if elevation >= lo && elevation <= hi {
            let mid = (lo + hi) / 2.0;
            let half = (hi - lo) / 2.0;
            let offset = if half > 0.0 {
                (elevation - mid) / half
            } else {
                0.0
            };
            return Some((layer, offset));
        }
    }
    None
}
